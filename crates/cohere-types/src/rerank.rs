//! Reranking documents against a query.

use serde::{Deserialize, Serialize};

use crate::common::ApiMeta;

/// A v1 rerank document: plain text or an object with a `text` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RerankDocument {
    Text(String),
    Object(serde_json::Map<String, serde_json::Value>),
}

impl From<&str> for RerankDocument {
    fn from(text: &str) -> Self {
        RerankDocument::Text(text.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RerankRequest {
    pub query: String,
    pub documents: Vec<RerankDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_documents: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chunks_per_doc: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RerankRequestV2 {
    pub model: String,
    pub query: String,
    pub documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens_per_doc: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankedDocument {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankResult {
    pub index: usize,
    pub relevance_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<RerankedDocument>,
}

/// Results ordered by descending relevance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub results: Vec<RerankResult>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

endpoint!(RerankRequest => RerankResponse, Rerank, |_r| "/v1/rerank".to_string(), json);
endpoint!(RerankRequestV2 => RerankResponse, RerankV2, |_r| "/v2/rerank".to_string(), json);
