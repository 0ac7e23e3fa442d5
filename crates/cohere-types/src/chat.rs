//! Chat (v1): a single `message` plus optional history, tools and grounding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::{ApiMeta, FinishReason};
use crate::operation::{Framing, Operation, StreamChunk, Streamable};
use crate::ApiError;

/// Speaker of a history turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChatRole {
    User,
    Chatbot,
    System,
    Tool,
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResult>,
}

impl ChatMessage {
    pub fn user(message: impl Into<String>) -> Self {
        Self::text(ChatRole::User, message)
    }

    pub fn chatbot(message: impl Into<String>) -> Self {
        Self::text(ChatRole::Chatbot, message)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::text(ChatRole::System, message)
    }

    fn text(role: ChatRole, message: impl Into<String>) -> Self {
        Self {
            role,
            message: Some(message.into()),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
        }
    }
}

/// A retrieval connector the model may search (e.g. `web-search`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConnector {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ChatConnector {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            options: None,
        }
    }
}

/// A grounding document: free-form string fields.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A tool the model may ask to call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameter_definitions: BTreeMap<String, ToolParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub required: bool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Outputs of a tool call, sent back on the next turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub call: ToolCall,
    pub outputs: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCitation {
    pub start: usize,
    pub end: usize,
    pub text: String,
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default)]
    pub generation_id: Option<String>,
}

/// A v1 chat request. `model` falls back to the server default when unset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chat_history: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connectors: Vec<ChatConnector>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(default)]
    pub generation_id: Option<String>,
    #[serde(default)]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<ChatCitation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_queries: Vec<SearchQuery>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

/// Partial tool call emitted while the model is still writing it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parameters: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Events of a v1 chat stream, one JSON document per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "kebab-case")]
pub enum ChatStreamEvent {
    StreamStart {
        #[serde(default)]
        generation_id: Option<String>,
    },
    TextGeneration {
        text: String,
    },
    CitationGeneration {
        #[serde(default)]
        citations: Vec<ChatCitation>,
    },
    SearchQueriesGeneration {
        #[serde(default)]
        search_queries: Vec<SearchQuery>,
    },
    SearchResults {
        #[serde(default)]
        documents: Vec<Document>,
    },
    ToolCallsGeneration {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
    },
    ToolCallsChunk {
        tool_call_delta: ToolCallDelta,
    },
    StreamEnd {
        #[serde(default)]
        finish_reason: Option<FinishReason>,
        #[serde(default)]
        response: Option<ChatResponse>,
    },
}

const CHAT_EVENTS: &[&str] = &[
    "stream-start",
    "text-generation",
    "citation-generation",
    "search-queries-generation",
    "search-results",
    "tool-calls-generation",
    "tool-calls-chunk",
    "stream-end",
];

impl StreamChunk for ChatStreamEvent {
    fn decode(_event: Option<&str>, data: &str) -> Result<Option<Self>, ApiError> {
        #[derive(Deserialize)]
        struct Header {
            event_type: Option<String>,
        }

        let data = data.trim();
        if data.is_empty() {
            return Ok(None);
        }
        let header: Header = serde_json::from_str(data)
            .map_err(|e| ApiError::StreamParse(format!("chat stream line: {e}")))?;
        let Some(event_type) = header.event_type else {
            return Ok(None);
        };
        if !CHAT_EVENTS.contains(&event_type.as_str()) {
            tracing::debug!("Skipping chat stream event: {event_type}");
            return Ok(None);
        }

        let event: ChatStreamEvent = serde_json::from_str(data)
            .map_err(|e| ApiError::StreamParse(format!("{event_type}: {e}")))?;
        match &event {
            ChatStreamEvent::TextGeneration { text } if text.is_empty() => Ok(None),
            _ => Ok(Some(event)),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ChatStreamEvent::StreamEnd { .. })
    }

    fn text_delta(&self) -> Option<&str> {
        match self {
            ChatStreamEvent::TextGeneration { text } => Some(text),
            _ => None,
        }
    }
}

endpoint!(ChatRequest => ChatResponse, Chat, |_r| "/v1/chat".to_string(), json);

impl Streamable for ChatRequest {
    type Chunk = ChatStreamEvent;

    fn stream_operation(&self) -> Operation {
        Operation::ChatStream
    }

    fn framing(&self) -> Framing {
        Framing::JsonLines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Endpoint, Payload};

    #[test]
    fn request_omits_unset_fields() {
        let request = ChatRequest::new("What year was he born?");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"message": "What year was he born?"}));
    }

    #[test]
    fn request_with_history_and_connectors() {
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
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chat_history"][0]["role"], "USER");
        assert_eq!(json["chat_history"][1]["role"], "CHATBOT");
        assert_eq!(json["connectors"][0]["id"], "web-search");
        assert!(json["chat_history"][0].get("tool_calls").is_none());
    }

    #[test]
    fn tool_parameter_definitions_shape() {
        let mut params = BTreeMap::new();
        params.insert(
            "day".to_string(),
            ToolParameter {
                description: Some("Retrieves sales data for this day, formatted as YYYY-MM-DD.".into()),
                param_type: "str".into(),
                required: true,
            },
        );
        let tool = Tool {
            name: "query_daily_sales_report".into(),
            description: "Connects to a database to retrieve overall sales volumes.".into(),
            parameter_definitions: params,
        };
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["parameter_definitions"]["day"]["type"], "str");
        assert_eq!(json["parameter_definitions"]["day"]["required"], true);
    }

    #[test]
    fn endpoint_targets_v1_chat() {
        let request = ChatRequest::new("hi");
        assert_eq!(request.operation(), Operation::Chat);
        assert_eq!(request.path(), "/v1/chat");
        assert_eq!(request.stream_operation(), Operation::ChatStream);
        assert!(matches!(request.payload().unwrap(), Payload::Json(_)));
    }

    #[test]
    fn response_parses_minimal_body() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"text":"Newton was born in 1643.","generation_id":"g1","finish_reason":"COMPLETE"}"#,
        )
        .unwrap();
        assert_eq!(response.text, "Newton was born in 1643.");
        assert_eq!(response.finish_reason, Some(FinishReason::Complete));
        assert!(response.citations.is_empty());
    }

    #[test]
    fn decode_text_generation() {
        let event = ChatStreamEvent::decode(
            None,
            r#"{"is_finished":false,"event_type":"text-generation","text":"Hello"}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.text_delta(), Some("Hello"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn decode_stream_end_is_terminal() {
        let event = ChatStreamEvent::decode(
            None,
            r#"{"is_finished":true,"event_type":"stream-end","finish_reason":"COMPLETE","response":{"text":"Hello"}}"#,
        )
        .unwrap()
        .unwrap();
        assert!(event.is_terminal());
        match event {
            ChatStreamEvent::StreamEnd { response, .. } => {
                assert_eq!(response.unwrap().text, "Hello");
            }
            other => panic!("Expected StreamEnd, got {other:?}"),
        }
    }

    #[test]
    fn decode_skips_unknown_and_blank() {
        assert!(
            ChatStreamEvent::decode(None, r#"{"event_type":"debug","prompt":"x"}"#)
                .unwrap()
                .is_none()
        );
        assert!(ChatStreamEvent::decode(None, "   ").unwrap().is_none());
        assert!(
            ChatStreamEvent::decode(None, r#"{"event_type":"text-generation","text":""}"#)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let err = ChatStreamEvent::decode(None, r#"{"event_type":"text-gen"#).unwrap_err();
        assert!(matches!(err, ApiError::StreamParse(_)));
    }

    #[test]
    fn decode_tool_calls_chunk() {
        let event = ChatStreamEvent::decode(
            None,
            r#"{"event_type":"tool-calls-chunk","tool_call_delta":{"index":0,"name":"query_daily_sales_report"}}"#,
        )
        .unwrap()
        .unwrap();
        match event {
            ChatStreamEvent::ToolCallsChunk { tool_call_delta } => {
                assert_eq!(tool_call_delta.name.as_deref(), Some("query_daily_sales_report"));
            }
            other => panic!("Expected ToolCallsChunk, got {other:?}"),
        }
    }
}
