//! Model catalog.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub finetuned: Option<bool>,
    #[serde(default)]
    pub context_length: Option<u64>,
    #[serde(default)]
    pub tokenizer_url: Option<String>,
    #[serde(default)]
    pub default_endpoints: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListModelsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Only models that support this endpoint, e.g. `chat`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetModelRequest {
    #[serde(skip)]
    pub model: String,
}

endpoint!(ListModelsRequest => ListModelsResponse, ModelsList, |_r| "/v1/models".to_string(), query);
endpoint!(GetModelRequest => ModelInfo, ModelsGet, |r| format!("/v1/models/{}", urlencoding::encode(&r.model)));
