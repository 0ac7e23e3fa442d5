//! Asynchronous embedding of a whole dataset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{ApiMeta, Empty, Truncate};
use crate::embed::{EmbedInputType, EmbeddingType};
use crate::operation::Pollable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedJobStatus {
    Processing,
    Complete,
    Cancelling,
    Cancelled,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateEmbedJobRequest {
    pub model: String,
    pub dataset_id: String,
    pub input_type: EmbedInputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embedding_types: Vec<EmbeddingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncate: Option<Truncate>,
}

impl CreateEmbedJobRequest {
    pub fn new(
        model: impl Into<String>,
        dataset_id: impl Into<String>,
        input_type: EmbedInputType,
    ) -> Self {
        Self {
            model: model.into(),
            dataset_id: dataset_id.into(),
            input_type,
            name: None,
            embedding_types: Vec::new(),
            truncate: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmbedJobResponse {
    pub job_id: String,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedJob {
    pub job_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: EmbedJobStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub input_dataset_id: Option<String>,
    #[serde(default)]
    pub output_dataset_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub truncate: Option<Truncate>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

impl Pollable for EmbedJob {
    fn is_settled(&self) -> bool {
        matches!(
            self.status,
            EmbedJobStatus::Complete | EmbedJobStatus::Cancelled | EmbedJobStatus::Failed
        )
    }

    fn status_label(&self) -> String {
        format!("{:?}", self.status).to_lowercase()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListEmbedJobsRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEmbedJobsResponse {
    #[serde(default)]
    pub embed_jobs: Vec<EmbedJob>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetEmbedJobRequest {
    #[serde(skip)]
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelEmbedJobRequest {
    #[serde(skip)]
    pub id: String,
}

endpoint!(CreateEmbedJobRequest => CreateEmbedJobResponse, EmbedJobsCreate, |_r| "/v1/embed-jobs".to_string(), json);
endpoint!(ListEmbedJobsRequest => ListEmbedJobsResponse, EmbedJobsList, |_r| "/v1/embed-jobs".to_string());
endpoint!(GetEmbedJobRequest => EmbedJob, EmbedJobsGet, |r| format!("/v1/embed-jobs/{}", urlencoding::encode(&r.id)));
endpoint!(CancelEmbedJobRequest => Empty, EmbedJobsCancel, |r| format!("/v1/embed-jobs/{}/cancel", urlencoding::encode(&r.id)));
