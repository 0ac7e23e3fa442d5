//! Integration tests for `ApiClient` against a raw TCP test server.
//!
//! The server answers each incoming connection with a canned HTTP response
//! and records the raw request so tests can check method, path, headers and
//! body.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cohere_api::{ApiClient, CancellationToken, WaitConfig, drain_stream};
use cohere_types::{
    ApiError, ChatConnector, ChatMessage, ChatMessageV2, ChatRequest, ChatRequestV2,
    ClassifyExample, ClassifyRequest, CreateConnectorRequest, CreateDatasetRequest, DatasetType,
    DeleteDatasetRequest, ErrorKind, FileUpload, GetBatchRequest, GetDatasetRequest,
    ListConnectorsRequest, StreamChunk, TokenizeRequest,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

type Requests = Arc<Mutex<Vec<String>>>;

fn http_json(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
}

fn http_stream(content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {content_type}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}"
    )
}

/// Read one full HTTP request: headers, then a sized or chunked body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = vec![0u8; 8192];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        raw.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&raw).to_string();
        let Some(header_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let head = text[..header_end].to_ascii_lowercase();
        let body_len = raw.len() - (header_end + 4);
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        match content_length {
            Some(len) if body_len >= len => break,
            Some(_) => continue,
            None if head.contains("transfer-encoding: chunked") => {
                if text.ends_with("0\r\n\r\n") {
                    break;
                }
            }
            None => break,
        }
    }
    String::from_utf8_lossy(&raw).to_string()
}

/// Start a test TCP server that returns pre-configured responses, one per
/// incoming connection. Once the list runs out the last response repeats.
async fn start_test_server(responses: Vec<String>) -> (String, Requests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    tokio::spawn(async move {
        let responses = Arc::new(responses);
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let responses = Arc::clone(&responses);
            let recorded = Arc::clone(&recorded);

            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let idx = {
                    let mut all = recorded.lock().unwrap();
                    all.push(request);
                    all.len() - 1
                };
                let response = &responses[idx.min(responses.len() - 1)];
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.flush().await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), requests)
}

/// A server that accepts connections and never answers.
async fn start_silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

/// A server that sends stream headers at once, then each body piece after
/// `delay`.
async fn start_slow_stream_server(
    content_type: &'static str,
    pieces: Vec<&'static str>,
    delay: Duration,
) -> (String, Requests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let request = read_request(&mut socket).await;
        recorded.lock().unwrap().push(request);
        let _ = socket.write_all(http_stream(content_type, "").as_bytes()).await;
        for piece in pieces {
            tokio::time::sleep(delay).await;
            let _ = socket.write_all(piece.as_bytes()).await;
            let _ = socket.flush().await;
        }
        let _ = socket.shutdown().await;
    });

    (format!("http://{addr}"), requests)
}

fn make_client(base_url: &str) -> ApiClient {
    ApiClient::new("test-key", base_url).unwrap()
}

fn recorded(requests: &Requests) -> Vec<String> {
    requests.lock().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Single-shot calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_with_history_returns_text() {
    let (base_url, requests) = start_test_server(vec![http_json(
        "200 OK",
        r#"{"text":"Isaac Newton was born on 25 December 1642.","generation_id":"g-1","finish_reason":"COMPLETE"}"#,
    )])
    .await;

    let request = ChatRequest {
        chat_history: vec![
            ChatMessage::user("Who discovered gravity?"),
            ChatMessage::chatbot(
                "The man who is widely credited with discovering gravity is Sir Isaac Newton",
            ),
        ],
        connectors: vec![ChatConnector::new("web-search")],
        ..ChatRequest::new("What year was he born?")
    };
    let response = make_client(&base_url)
        .with_client_name("snippet")
        .send(&request)
        .await
        .unwrap();
    assert!(!response.text.is_empty());

    let raw = recorded(&requests);
    assert_eq!(raw.len(), 1);
    let lower = raw[0].to_ascii_lowercase();
    assert!(raw[0].starts_with("POST /v1/chat HTTP/1.1"), "{}", raw[0]);
    assert!(lower.contains("authorization: bearer test-key"));
    assert!(lower.contains("x-client-name: snippet"));
    assert!(raw[0].contains("\"chat_history\""));
    assert!(!raw[0].contains("\"stream\""));
}

#[tokio::test]
async fn classify_four_examples_one_result() {
    let (base_url, _) = start_test_server(vec![http_json(
        "200 OK",
        r#"{"id":"cls-1","classifications":[{"id":"p-1","input":"peach","prediction":"fruit","predictions":["fruit"],"confidence":0.92,"labels":{"fruit":{"confidence":0.92},"vegetable":{"confidence":0.08}}}]}"#,
    )])
    .await;

    let request = ClassifyRequest {
        inputs: vec!["peach".into()],
        examples: vec![
            ClassifyExample::new("orange", "fruit"),
            ClassifyExample::new("pear", "fruit"),
            ClassifyExample::new("lettuce", "vegetable"),
            ClassifyExample::new("cauliflower", "vegetable"),
        ],
        ..ClassifyRequest::default()
    };
    let response = make_client(&base_url).send(&request).await.unwrap();
    assert_eq!(response.classifications.len(), 1);
    assert_eq!(response.classifications[0].prediction.as_deref(), Some("fruit"));
}

#[tokio::test]
async fn unauthorized_is_auth_error() {
    let (base_url, _) = start_test_server(vec![http_json(
        "401 Unauthorized",
        r#"{"message":"invalid api token"}"#,
    )])
    .await;

    let err = make_client(&base_url)
        .send(&TokenizeRequest {
            text: "tokenize me!".into(),
            model: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    match err {
        ApiError::Auth { message } => assert_eq!(message, "invalid api token"),
        other => panic!("Expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn deleting_missing_resource_is_rejected_not_transport() {
    let (base_url, requests) = start_test_server(vec![http_json(
        "404 Not Found",
        r#"{"message":"dataset missing-id not found"}"#,
    )])
    .await;

    let err = make_client(&base_url)
        .send(&DeleteDatasetRequest {
            id: "missing-id".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestRejected);
    assert!(recorded(&requests)[0].starts_with("DELETE /v1/datasets/missing-id "));
}

#[tokio::test]
async fn delete_with_empty_body_succeeds() {
    let (base_url, _) = start_test_server(vec![http_json("200 OK", "")]).await;
    let response = make_client(&base_url)
        .send(&DeleteDatasetRequest { id: "ds-1".into() })
        .await;
    assert!(response.is_ok(), "{response:?}");
}

#[tokio::test]
async fn connection_refused_is_transport() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = make_client(&format!("http://{addr}"))
        .send(&TokenizeRequest {
            text: "hi".into(),
            model: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn undecodable_success_body_is_server_error() {
    let (base_url, _) = start_test_server(vec![http_json("200 OK", "<html>oops</html>")]).await;
    let err = make_client(&base_url)
        .send(&TokenizeRequest {
            text: "hi".into(),
            model: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
    assert_eq!(err.kind(), ErrorKind::Server);
}

#[tokio::test]
async fn list_repeated_is_equivalent() {
    let body = r#"{"connectors":[{"id":"web-search","name":"Web search"}],"total_count":1}"#;
    let (base_url, requests) =
        start_test_server(vec![http_json("200 OK", body), http_json("200 OK", body)]).await;
    let client = make_client(&base_url);
    let request = ListConnectorsRequest {
        limit: Some(10),
        offset: None,
    };

    let first = client.send(&request).await.unwrap();
    let second = client.send(&request).await.unwrap();
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
    assert!(recorded(&requests)[0].starts_with("GET /v1/connectors?limit=10 "));
}

#[tokio::test]
async fn create_repeated_yields_distinct_resources() {
    let (base_url, _) = start_test_server(vec![
        http_json("200 OK", r#"{"connector":{"id":"conn-1","name":"Example connector"}}"#),
        http_json("200 OK", r#"{"connector":{"id":"conn-2","name":"Example connector"}}"#),
    ])
    .await;
    let client = make_client(&base_url);
    let request = CreateConnectorRequest {
        name: "Example connector".into(),
        url: "https://connector-example.com/search".into(),
        ..CreateConnectorRequest::default()
    };

    let first = client.send(&request).await.unwrap();
    let second = client.send(&request).await.unwrap();
    assert_ne!(first.connector.id, second.connector.id);
}

#[tokio::test]
async fn dataset_upload_is_multipart_with_query() {
    let (base_url, requests) =
        start_test_server(vec![http_json("200 OK", r#"{"id":"my-dataset-abc123"}"#)]).await;

    let request = CreateDatasetRequest::new(
        "my-dataset",
        DatasetType::EmbedInput,
        FileUpload::new(
            "embed_jobs_sample_data.jsonl",
            r#"{"text": "The quick brown fox jumps over the lazy dog"}"#,
        ),
    );
    let response = make_client(&base_url).send(&request).await.unwrap();
    assert_eq!(response.id.as_deref(), Some("my-dataset-abc123"));

    let raw = &recorded(&requests)[0];
    let request_line = raw.lines().next().unwrap();
    assert!(request_line.starts_with("POST /v1/datasets?"));
    assert!(request_line.contains("name=my-dataset"));
    assert!(request_line.contains("type=embed-input"));
    assert!(raw.to_ascii_lowercase().contains("content-type: multipart/form-data"));
    assert!(raw.contains("name=\"data\"; filename=\"embed_jobs_sample_data.jsonl\""));
    assert!(raw.contains("quick brown fox"));
}

#[tokio::test]
async fn send_cancellable_aborts_in_flight_call() {
    let base_url = start_silent_server().await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = make_client(&base_url)
        .send_cancellable(
            &TokenizeRequest {
                text: "hi".into(),
                model: None,
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn open_stream_cancellable_aborts_before_headers() {
    let base_url = start_silent_server().await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let request = ChatRequestV2::new("command-r-plus", vec![ChatMessageV2::user("hi")]);
    let opened = tokio::time::timeout(
        Duration::from_secs(3),
        make_client(&base_url).open_stream_cancellable(&request, &cancel),
    )
    .await
    .expect("open should return once cancelled");
    match opened {
        Err(err) => assert_eq!(err.kind(), ErrorKind::Cancelled),
        Ok(_) => panic!("expected cancellation, got stream"),
    }
}

#[tokio::test]
async fn open_stream_times_out_waiting_for_headers() {
    let base_url = start_silent_server().await;
    let request = ChatRequestV2::new("command-r-plus", vec![ChatMessageV2::user("hi")]);
    let opened = tokio::time::timeout(
        Duration::from_secs(3),
        make_client(&base_url)
            .with_timeout(Duration::from_millis(100))
            .open_stream(&request),
    )
    .await
    .expect("open should give up on its own");
    match opened {
        Err(err) => {
            assert!(matches!(err, ApiError::Timeout));
            assert_eq!(err.kind(), ErrorKind::Transport);
        }
        Ok(_) => panic!("expected timeout, got stream"),
    }
}

#[tokio::test]
async fn stream_body_outlives_client_timeout() {
    let (base_url, _) = start_slow_stream_server(
        "application/stream+json",
        vec![
            "{\"event_type\":\"text-generation\",\"text\":\"slow\"}\n",
            "{\"event_type\":\"stream-end\",\"finish_reason\":\"COMPLETE\"}\n",
        ],
        Duration::from_millis(150),
    )
    .await;

    let stream = make_client(&base_url)
        .with_timeout(Duration::from_millis(100))
        .open_stream(&ChatRequest::new("hi"))
        .await
        .unwrap();
    let summary = drain_stream(stream, &CancellationToken::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(summary.text, "slow");
    assert!(summary.terminated);
}

#[tokio::test]
async fn timeout_is_transport() {
    let base_url = start_silent_server().await;
    let err = make_client(&base_url)
        .with_timeout(Duration::from_millis(50))
        .send(&TokenizeRequest {
            text: "hi".into(),
            model: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

fn dataset_body(status: &str) -> String {
    format!(
        r#"{{"dataset":{{"id":"ds-1","name":"my-dataset","dataset_type":"embed-input","validation_status":"{status}"}}}}"#
    )
}

#[tokio::test]
async fn wait_polls_until_settled() {
    let (base_url, requests) = start_test_server(vec![
        http_json("200 OK", &dataset_body("queued")),
        http_json("200 OK", &dataset_body("processing")),
        http_json("200 OK", &dataset_body("validated")),
    ])
    .await;

    let config = WaitConfig {
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    };
    let response = make_client(&base_url)
        .wait(&GetDatasetRequest { id: "ds-1".into() }, &config)
        .await
        .unwrap();
    assert_eq!(response.dataset.id, "ds-1");
    assert_eq!(recorded(&requests).len(), 3);
    assert!(recorded(&requests).iter().all(|r| r.starts_with("GET /v1/datasets/ds-1 ")));
}

fn batch_body(status: &str) -> String {
    format!(
        r#"{{"batch":{{"id":"b-1","name":"my-batch","input_dataset_id":"ds-1","model":"command-r","status":"{status}"}}}}"#
    )
}

#[tokio::test]
async fn wait_polls_batch_until_completed() {
    let (base_url, requests) = start_test_server(vec![
        http_json("200 OK", &batch_body("BATCH_STATUS_QUEUED")),
        http_json("200 OK", &batch_body("BATCH_STATUS_IN_PROGRESS")),
        http_json("200 OK", &batch_body("BATCH_STATUS_COMPLETED")),
    ])
    .await;

    let config = WaitConfig {
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    };
    let response = make_client(&base_url)
        .wait(&GetBatchRequest { id: "b-1".into() }, &config)
        .await
        .unwrap();
    assert_eq!(response.batch.id.as_deref(), Some("b-1"));
    let raw = recorded(&requests);
    assert_eq!(raw.len(), 3);
    assert!(raw.iter().all(|r| r.starts_with("GET /v2/batches/b-1 ")));
}

#[tokio::test]
async fn wait_gives_up_after_timeout() {
    let (base_url, _) =
        start_test_server(vec![http_json("200 OK", &dataset_body("processing"))]).await;

    let config = WaitConfig {
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_millis(40),
    };
    let err = make_client(&base_url)
        .wait(&GetDatasetRequest { id: "ds-1".into() }, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout));
}

// ---------------------------------------------------------------------------
// Streaming over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_v2_stream_over_http() {
    let sse = "\
event: message-start\n\
data: {\"id\":\"m-1\",\"type\":\"message-start\"}\n\
\n\
event: content-delta\n\
data: {\"type\":\"content-delta\",\"index\":0,\"delta\":{\"message\":{\"content\":{\"text\":\"Hello\"}}}}\n\
\n\
event: content-delta\n\
data: {\"type\":\"content-delta\",\"index\":0,\"delta\":{\"message\":{\"content\":{\"text\":\" there\"}}}}\n\
\n\
event: message-end\n\
data: {\"type\":\"message-end\",\"delta\":{\"finish_reason\":\"COMPLETE\"}}\n\
\n";
    let (base_url, requests) =
        start_test_server(vec![http_stream("text/event-stream", sse)]).await;

    let request = ChatRequestV2::new("command-r-plus", vec![ChatMessageV2::user("hello world!")]);
    let stream = make_client(&base_url).open_stream(&request).await.unwrap();
    let summary = drain_stream(stream, &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(summary.text, "Hello there");
    assert!(summary.terminated);
    let raw = &recorded(&requests)[0];
    assert!(raw.starts_with("POST /v2/chat "));
    assert!(raw.contains("\"stream\":true"));
}

#[tokio::test]
async fn chat_v1_stream_over_http() {
    let lines = "\
{\"event_type\":\"stream-start\",\"generation_id\":\"g-1\"}\n\
{\"event_type\":\"text-generation\",\"text\":\"1643\"}\n\
{\"event_type\":\"stream-end\",\"finish_reason\":\"COMPLETE\",\"response\":{\"text\":\"1643\"}}\n";
    let (base_url, _) =
        start_test_server(vec![http_stream("application/stream+json", lines)]).await;

    let mut stream = make_client(&base_url)
        .open_stream(&ChatRequest::new("What year was he born?"))
        .await
        .unwrap();
    let mut text = String::new();
    while let Some(chunk) = stream.recv().await.unwrap() {
        if let Some(delta) = chunk.text_delta() {
            text.push_str(delta);
        }
    }
    assert_eq!(text, "1643");
    assert!(stream.is_closed());
}

#[tokio::test]
async fn stream_open_failure_is_immediate_error() {
    let (base_url, _) = start_test_server(vec![http_json(
        "400 Bad Request",
        r#"{"message":"invalid request: model is required"}"#,
    )])
    .await;

    let result = make_client(&base_url)
        .open_stream(&ChatRequestV2::new("", vec![ChatMessageV2::user("hi")]))
        .await;
    match result {
        Err(err) => assert_eq!(err.kind(), ErrorKind::RequestRejected),
        Ok(_) => panic!("expected error, got stream"),
    }
}
