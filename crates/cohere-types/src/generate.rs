//! Raw text generation (legacy v1).

use serde::{Deserialize, Serialize};

use crate::common::{ApiMeta, FinishReason, Truncate};
use crate::operation::{Framing, Operation, StreamChunk, Streamable};
use crate::ApiError;

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_generations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncate: Option<Truncate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub id: String,
    #[serde(default)]
    pub prompt: Option<String>,
    pub generations: Vec<Generation>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "kebab-case")]
pub enum GenerateStreamEvent {
    TextGeneration {
        text: String,
        #[serde(default)]
        index: Option<usize>,
    },
    StreamEnd {
        #[serde(default)]
        finish_reason: Option<FinishReason>,
        #[serde(default)]
        response: Option<GenerateResponse>,
    },
}

impl StreamChunk for GenerateStreamEvent {
    fn decode(_event: Option<&str>, data: &str) -> Result<Option<Self>, ApiError> {
        #[derive(Deserialize)]
        struct Header {
            event_type: Option<String>,
            #[serde(default)]
            err: Option<String>,
        }

        let data = data.trim();
        if data.is_empty() {
            return Ok(None);
        }
        let header: Header = serde_json::from_str(data)
            .map_err(|e| ApiError::StreamParse(format!("generate stream line: {e}")))?;
        match header.event_type.as_deref() {
            Some("text-generation") | Some("stream-end") => {}
            Some("stream-error") => {
                let reason = header.err.unwrap_or_else(|| "generation failed".to_string());
                return Err(ApiError::StreamInterrupted(reason));
            }
            Some(other) => {
                tracing::debug!("Skipping generate stream event: {other}");
                return Ok(None);
            }
            None => return Ok(None),
        }

        let event: GenerateStreamEvent = serde_json::from_str(data)
            .map_err(|e| ApiError::StreamParse(format!("generate stream: {e}")))?;
        match &event {
            GenerateStreamEvent::TextGeneration { text, .. } if text.is_empty() => Ok(None),
            _ => Ok(Some(event)),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, GenerateStreamEvent::StreamEnd { .. })
    }

    fn text_delta(&self) -> Option<&str> {
        match self {
            GenerateStreamEvent::TextGeneration { text, .. } => Some(text),
            _ => None,
        }
    }
}

endpoint!(GenerateRequest => GenerateResponse, Generate, |_r| "/v1/generate".to_string(), json);

impl Streamable for GenerateRequest {
    type Chunk = GenerateStreamEvent;

    fn stream_operation(&self) -> Operation {
        Operation::GenerateStream
    }

    fn framing(&self) -> Framing {
        Framing::JsonLines
    }
}
