//! Cohere REST API client.

use std::time::Duration;

use cohere_types::{ApiError, Endpoint, Method, Operation, Payload, Streamable};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::stream::ChunkStream;

/// Client for the Cohere REST API.
///
/// Immutable once built; every call borrows it.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    client_name: Option<String>,
    timeout: Option<Duration>,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_name: None,
            timeout: None,
        })
    }

    /// Limit how long a single-shot call may take. For streams only opening
    /// the stream is limited; reading the body is not.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Identify the caller with the `X-Client-Name` header.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Dispatch one request and decode its response.
    pub async fn send<E: Endpoint>(&self, request: &E) -> Result<E::Response, ApiError> {
        let response = self.dispatch(request, request.operation(), false).await?;
        let body = response.bytes().await.map_err(transport_error)?;
        decode_body(&body)
    }

    /// Like [`send`](Self::send), but gives up with [`ApiError::Cancelled`]
    /// as soon as `cancel` fires.
    pub async fn send_cancellable<E: Endpoint>(
        &self,
        request: &E,
        cancel: &CancellationToken,
    ) -> Result<E::Response, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("{} cancelled", request.operation());
                Err(ApiError::Cancelled)
            }
            result = self.send(request) => result,
        }
    }

    /// Open the streaming variant of a request.
    pub async fn open_stream<E: Streamable>(
        &self,
        request: &E,
    ) -> Result<ChunkStream<E::Chunk>, ApiError> {
        let response = self
            .dispatch(request, request.stream_operation(), true)
            .await?;
        Ok(ChunkStream::new(request.framing(), response.bytes_stream()))
    }

    /// Like [`open_stream`](Self::open_stream), but gives up with
    /// [`ApiError::Cancelled`] if `cancel` fires before the stream is open.
    pub async fn open_stream_cancellable<E: Streamable>(
        &self,
        request: &E,
        cancel: &CancellationToken,
    ) -> Result<ChunkStream<E::Chunk>, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("{} cancelled before the stream opened", request.stream_operation());
                Err(ApiError::Cancelled)
            }
            result = self.open_stream(request) => result,
        }
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
                ApiError::Auth {
                    message: "Invalid API key format".into(),
                }
            })?,
        );
        if let Some(name) = &self.client_name {
            headers.insert(
                "x-client-name",
                HeaderValue::from_str(name).map_err(|_| ApiError::BadRequest {
                    message: format!("Invalid client name: {name}"),
                })?,
            );
        }
        Ok(headers)
    }

    async fn dispatch<E: Endpoint>(
        &self,
        request: &E,
        operation: Operation,
        stream: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path());
        let method = operation.method();
        let mut builder = self
            .http
            .request(http_method(method), &url)
            .headers(self.headers()?);

        let query = request.query()?;
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        builder = match request.payload()? {
            Payload::Empty => builder,
            Payload::Json(mut body) => {
                if stream {
                    if let serde_json::Value::Object(map) = &mut body {
                        map.insert("stream".into(), serde_json::Value::Bool(true));
                    }
                }
                builder.json(&body)
            }
            Payload::Multipart(parts) => {
                let mut form = reqwest::multipart::Form::new();
                for part in parts {
                    form = form.part(
                        part.field,
                        reqwest::multipart::Part::bytes(part.bytes).file_name(part.file_name),
                    );
                }
                builder.multipart(form)
            }
        };

        if let (Some(timeout), false) = (self.timeout, stream) {
            builder = builder.timeout(timeout);
        }

        tracing::debug!("{operation}: {} {url}", method.as_str());

        let pending = builder.send();
        let response = match (self.timeout, stream) {
            (Some(timeout), true) => tokio::time::timeout(timeout, pending)
                .await
                .map_err(|_| ApiError::Timeout)?,
            _ => pending.await,
        }
        .map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = parse_retry_after(response.headers());
        let body_text = response.text().await.unwrap_or_default();
        let err = classify_error(status.as_u16(), &body_text, retry_after);
        tracing::debug!("{operation} failed: {err}");
        Err(err)
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Decode a successful body. Operations that return nothing may answer with
/// an empty body or `null`, which decode as `{}`.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body = body.trim_ascii();
    let body: &[u8] = if body.is_empty() || body == b"null" {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Parse the `retry-after` header value as seconds and convert to milliseconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}

/// Classify an HTTP error response into a typed ApiError.
fn classify_error(status: u16, body: &str, retry_after: Option<u64>) -> ApiError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.to_string()
            }
        });

    match status {
        400 | 422 => ApiError::BadRequest { message },
        401 | 403 | 498 => ApiError::Auth { message },
        404 => ApiError::NotFound { message },
        429 => ApiError::RateLimited {
            retry_after_ms: retry_after,
        },
        499 => ApiError::Cancelled,
        400..=499 => ApiError::Rejected { status, message },
        _ => ApiError::Server { status, message },
    }
}
