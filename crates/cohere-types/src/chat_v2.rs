//! Chat (v2): role-tagged messages, JSON-schema tools, documents and images.

use serde::{Deserialize, Serialize};

use crate::common::{FinishReason, Usage};
use crate::operation::{Framing, Operation, StreamChunk, Streamable};
use crate::ApiError;

/// A message in a v2 conversation, tagged by `role`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessageV2 {
    User {
        content: MessageContent,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<MessageContent>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_plan: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallV2>,
    },
    System {
        content: MessageContent,
    },
    Tool {
        tool_call_id: String,
        content: MessageContent,
    },
}

impl ChatMessageV2 {
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessageV2::User {
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        ChatMessageV2::User {
            content: MessageContent::Parts(parts),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        ChatMessageV2::Assistant {
            content: Some(MessageContent::Text(text.into())),
            tool_plan: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        ChatMessageV2::System {
            content: MessageContent::Text(text.into()),
        }
    }
}

/// Message content: a plain string or a list of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One typed part of a message or embed input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    Document { document: DocumentV2 },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// `url` is either a web URL or a base64 `data:` URI.
    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Auto,
    Low,
    High,
}

/// A grounding document: a bare string or an object with an optional id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentV2 {
    Text(String),
    Structured {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        data: serde_json::Map<String, serde_json::Value>,
    },
}

/// A function tool described with a JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolV2 {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: ToolFunction,
}

impl ToolV2 {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: ToolFunction {
                name: name.into(),
                description: Some(description.into()),
                parameters,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// A tool call; every field may be partial while streaming.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallV2 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<ToolCallFunction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallFunction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// JSON-encoded arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationV2 {
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<serde_json::Value>,
}

/// A v2 chat request. The API requires `model`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatRequestV2 {
    pub model: String,
    pub messages: Vec<ChatMessageV2>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolV2>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentV2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

impl ChatRequestV2 {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessageV2>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Self::default()
        }
    }
}

/// A piece of the assistant's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseContent {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ResponseContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_plan: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallV2>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<CitationV2>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponseV2 {
    pub id: String,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub message: AssistantMessage,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponseV2 {
    /// All text parts of the reply, concatenated.
    pub fn text(&self) -> String {
        self.message
            .content
            .iter()
            .filter_map(|c| match c {
                ResponseContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Events of a v2 chat stream.
#[derive(Debug, Clone)]
pub enum ChatStreamEventV2 {
    MessageStart {
        id: Option<String>,
    },
    ContentStart {
        index: usize,
    },
    ContentDelta {
        index: usize,
        text: String,
    },
    ContentEnd {
        index: usize,
    },
    ToolPlanDelta {
        text: String,
    },
    ToolCallStart {
        index: usize,
        tool_call: ToolCallV2,
    },
    ToolCallDelta {
        index: usize,
        arguments: String,
    },
    ToolCallEnd {
        index: usize,
    },
    CitationStart {
        index: usize,
        citation: CitationV2,
    },
    CitationEnd {
        index: usize,
    },
    MessageEnd {
        finish_reason: Option<FinishReason>,
        usage: Option<Usage>,
    },
}

#[derive(Deserialize)]
struct Frame<D> {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    index: usize,
    delta: Option<D>,
}

#[derive(Deserialize)]
struct Delta<M> {
    message: M,
}

#[derive(Deserialize)]
struct ContentMessage {
    content: TextField,
}

#[derive(Deserialize)]
struct TextField {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ToolPlanMessage {
    #[serde(default)]
    tool_plan: String,
}

#[derive(Deserialize)]
struct ToolCallMessage {
    tool_calls: ToolCallV2,
}

#[derive(Deserialize)]
struct CitationMessage {
    citations: CitationV2,
}

#[derive(Deserialize)]
struct EndDelta {
    #[serde(default)]
    finish_reason: Option<FinishReason>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl StreamChunk for ChatStreamEventV2 {
    fn decode(event: Option<&str>, data: &str) -> Result<Option<Self>, ApiError> {
        #[derive(Deserialize)]
        struct Header {
            #[serde(rename = "type")]
            event_type: Option<String>,
        }

        let data = data.trim();
        if data.is_empty() {
            return Ok(None);
        }
        let event_type = match event {
            Some(name) => name.to_string(),
            None => {
                let header: Header = serde_json::from_str(data)
                    .map_err(|e| ApiError::StreamParse(format!("chat v2 event: {e}")))?;
                match header.event_type {
                    Some(t) => t,
                    None => return Ok(None),
                }
            }
        };
        let event_type = event_type.as_str();

        let parse_err = |e: serde_json::Error| ApiError::StreamParse(format!("{event_type}: {e}"));

        let chunk = match event_type {
            "message-start" => {
                let f: Frame<serde_json::Value> = serde_json::from_str(data).map_err(parse_err)?;
                ChatStreamEventV2::MessageStart { id: f.id }
            }
            "content-start" => {
                let f: Frame<serde_json::Value> = serde_json::from_str(data).map_err(parse_err)?;
                ChatStreamEventV2::ContentStart { index: f.index }
            }
            "content-delta" => {
                let f: Frame<Delta<ContentMessage>> =
                    serde_json::from_str(data).map_err(parse_err)?;
                let text = f.delta.map(|d| d.message.content.text).unwrap_or_default();
                if text.is_empty() {
                    return Ok(None);
                }
                ChatStreamEventV2::ContentDelta {
                    index: f.index,
                    text,
                }
            }
            "content-end" => {
                let f: Frame<serde_json::Value> = serde_json::from_str(data).map_err(parse_err)?;
                ChatStreamEventV2::ContentEnd { index: f.index }
            }
            "tool-plan-delta" => {
                let f: Frame<Delta<ToolPlanMessage>> =
                    serde_json::from_str(data).map_err(parse_err)?;
                let text = f.delta.map(|d| d.message.tool_plan).unwrap_or_default();
                if text.is_empty() {
                    return Ok(None);
                }
                ChatStreamEventV2::ToolPlanDelta { text }
            }
            "tool-call-start" => {
                let f: Frame<Delta<ToolCallMessage>> =
                    serde_json::from_str(data).map_err(parse_err)?;
                ChatStreamEventV2::ToolCallStart {
                    index: f.index,
                    tool_call: f.delta.map(|d| d.message.tool_calls).unwrap_or_default(),
                }
            }
            "tool-call-delta" => {
                let f: Frame<Delta<ToolCallMessage>> =
                    serde_json::from_str(data).map_err(parse_err)?;
                let arguments = f
                    .delta
                    .and_then(|d| d.message.tool_calls.function)
                    .and_then(|func| func.arguments)
                    .unwrap_or_default();
                if arguments.is_empty() {
                    return Ok(None);
                }
                ChatStreamEventV2::ToolCallDelta {
                    index: f.index,
                    arguments,
                }
            }
            "tool-call-end" => {
                let f: Frame<serde_json::Value> = serde_json::from_str(data).map_err(parse_err)?;
                ChatStreamEventV2::ToolCallEnd { index: f.index }
            }
            "citation-start" => {
                let f: Frame<Delta<CitationMessage>> =
                    serde_json::from_str(data).map_err(parse_err)?;
                ChatStreamEventV2::CitationStart {
                    index: f.index,
                    citation: f.delta.map(|d| d.message.citations).unwrap_or_default(),
                }
            }
            "citation-end" => {
                let f: Frame<serde_json::Value> = serde_json::from_str(data).map_err(parse_err)?;
                ChatStreamEventV2::CitationEnd { index: f.index }
            }
            "message-end" => {
                let f: Frame<EndDelta> = serde_json::from_str(data).map_err(parse_err)?;
                let (finish_reason, usage) = f
                    .delta
                    .map(|d| (d.finish_reason, d.usage))
                    .unwrap_or((None, None));
                ChatStreamEventV2::MessageEnd {
                    finish_reason,
                    usage,
                }
            }
            _ => {
                tracing::debug!("Skipping chat v2 stream event: {event_type}");
                return Ok(None);
            }
        };
        Ok(Some(chunk))
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ChatStreamEventV2::MessageEnd { .. })
    }

    fn text_delta(&self) -> Option<&str> {
        match self {
            ChatStreamEventV2::ContentDelta { text, .. } => Some(text),
            _ => None,
        }
    }
}

endpoint!(ChatRequestV2 => ChatResponseV2, ChatV2, |_r| "/v2/chat".to_string(), json);

impl Streamable for ChatRequestV2 {
    type Chunk = ChatStreamEventV2;

    fn stream_operation(&self) -> Operation {
        Operation::ChatStreamV2
    }

    fn framing(&self) -> Framing {
        Framing::Sse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_message_with_text_serializes_as_string() {
        let msg = ChatMessageV2::user("hello world!");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "user", "content": "hello world!"})
        );
    }

    #[test]
    fn image_parts_serialize() {
        let msg = ChatMessageV2::user_parts(vec![
            ContentPart::text("Describe the logo!"),
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "https://cohere.com/favicon-32x32.png".into(),
                    detail: Some(ImageDetail::Auto),
                },
            },
        ]);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][1]["type"], "image_url");
        assert_eq!(value["content"][1]["image_url"]["detail"], "auto");
    }

    #[test]
    fn documents_serialize_untagged() {
        let mut data = serde_json::Map::new();
        data.insert("text".into(), json!("Cohere is the best!"));
        data.insert("title".into(), json!("The best"));
        let request = ChatRequestV2 {
            documents: vec![DocumentV2::Structured {
                id: Some("1".into()),
                data,
            }],
            ..ChatRequestV2::new("command-r-plus", vec![ChatMessageV2::user("Who's the best?")])
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["documents"][0]["id"], "1");
        assert_eq!(value["documents"][0]["data"]["title"], "The best");
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn tool_serializes_with_function_type() {
        let tool = ToolV2::function(
            "query_product_catalog",
            "Connects to a product catalog.",
            json!({"type": "object", "properties": {"category": {"type": "string"}}, "required": ["category"]}),
        );
        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "query_product_catalog");
        assert_eq!(value["function"]["parameters"]["required"][0], "category");
    }

    #[test]
    fn response_text_concatenates_parts() {
        let response: ChatResponseV2 = serde_json::from_value(json!({
            "id": "c1",
            "finish_reason": "COMPLETE",
            "message": {
                "role": "assistant",
                "content": [{"type": "text", "text": "Hello "}, {"type": "text", "text": "there"}]
            },
            "usage": {"billed_units": {"input_tokens": 3, "output_tokens": 2}}
        }))
        .unwrap();
        assert_eq!(response.text(), "Hello there");
        assert_eq!(response.finish_reason, Some(FinishReason::Complete));
    }

    #[test]
    fn response_tolerates_unknown_content_kinds() {
        let response: ChatResponseV2 = serde_json::from_value(json!({
            "id": "c2",
            "message": {"content": [{"type": "citation_marker"}, {"type": "text", "text": "ok"}]}
        }))
        .unwrap();
        assert_eq!(response.text(), "ok");
    }

    #[test]
    fn decode_content_delta() {
        let chunk = ChatStreamEventV2::decode(
            Some("content-delta"),
            r#"{"type":"content-delta","index":0,"delta":{"message":{"content":{"text":"Hi"}}}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(chunk.text_delta(), Some("Hi"));
    }

    #[test]
    fn decode_uses_json_type_without_event_name() {
        let chunk = ChatStreamEventV2::decode(
            None,
            r#"{"type":"message-end","delta":{"finish_reason":"COMPLETE"}}"#,
        )
        .unwrap()
        .unwrap();
        assert!(chunk.is_terminal());
    }

    #[test]
    fn decode_tool_call_start_and_delta() {
        let start = ChatStreamEventV2::decode(
            Some("tool-call-start"),
            r#"{"type":"tool-call-start","index":1,"delta":{"message":{"tool_calls":{"id":"call_1","type":"function","function":{"name":"query_daily_sales_report","arguments":""}}}}}"#,
        )
        .unwrap()
        .unwrap();
        match start {
            ChatStreamEventV2::ToolCallStart { index, tool_call } => {
                assert_eq!(index, 1);
                assert_eq!(tool_call.id.as_deref(), Some("call_1"));
                assert_eq!(
                    tool_call.function.unwrap().name.as_deref(),
                    Some("query_daily_sales_report")
                );
            }
            other => panic!("Expected ToolCallStart, got {other:?}"),
        }

        let delta = ChatStreamEventV2::decode(
            Some("tool-call-delta"),
            r#"{"type":"tool-call-delta","index":1,"delta":{"message":{"tool_calls":{"function":{"arguments":"{\"day\":"}}}}}"#,
        )
        .unwrap()
        .unwrap();
        match delta {
            ChatStreamEventV2::ToolCallDelta { arguments, .. } => assert_eq!(arguments, "{\"day\":"),
            other => panic!("Expected ToolCallDelta, got {other:?}"),
        }
    }

    #[test]
    fn decode_skips_debug_and_empty_deltas() {
        assert!(
            ChatStreamEventV2::decode(Some("debug"), r#"{"type":"debug","prompt":"..."}"#)
                .unwrap()
                .is_none()
        );
        assert!(
            ChatStreamEventV2::decode(
                Some("content-delta"),
                r#"{"type":"content-delta","index":0,"delta":{"message":{"content":{"text":""}}}}"#,
            )
            .unwrap()
            .is_none()
        );
    }

    #[test]
    fn decode_message_end_carries_usage() {
        let chunk = ChatStreamEventV2::decode(
            Some("message-end"),
            r#"{"type":"message-end","delta":{"finish_reason":"MAX_TOKENS","usage":{"tokens":{"input_tokens":4,"output_tokens":9}}}}"#,
        )
        .unwrap()
        .unwrap();
        match chunk {
            ChatStreamEventV2::MessageEnd {
                finish_reason,
                usage,
            } => {
                assert_eq!(finish_reason, Some(FinishReason::MaxTokens));
                assert_eq!(usage.unwrap().tokens.unwrap().output_tokens, Some(9.0));
            }
            other => panic!("Expected MessageEnd, got {other:?}"),
        }
    }
}
