//! Summarization.

use serde::{Deserialize, Serialize};

use crate::common::ApiMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    Paragraph,
    Bullets,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extractiveness {
    Low,
    Medium,
    High,
    Auto,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SummarizeRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<SummaryLength>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SummaryFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractiveness: Option<Extractiveness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_command: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

endpoint!(SummarizeRequest => SummarizeResponse, Summarize, |_r| "/v1/summarize".to_string(), json);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_enums_lowercase() {
        let request = SummarizeRequest {
            text: "the quick brown fox jumped over the lazy dog".into(),
            length: Some(SummaryLength::Short),
            format: Some(SummaryFormat::Bullets),
            ..SummarizeRequest::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["length"], "short");
        assert_eq!(value["format"], "bullets");
        assert!(value.get("extractiveness").is_none());
    }
}
