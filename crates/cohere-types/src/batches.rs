//! Batch jobs over an input dataset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::Empty;
use crate::operation::Pollable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    #[serde(rename = "BATCH_STATUS_QUEUED")]
    Queued,
    #[serde(rename = "BATCH_STATUS_IN_PROGRESS")]
    InProgress,
    #[serde(rename = "BATCH_STATUS_CANCELING")]
    Canceling,
    #[serde(rename = "BATCH_STATUS_COMPLETED")]
    Completed,
    #[serde(rename = "BATCH_STATUS_FAILED")]
    Failed,
    #[serde(rename = "BATCH_STATUS_CANCELED")]
    Canceled,
    #[serde(other)]
    Unspecified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub input_dataset_id: String,
    pub model: String,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub status: Option<BatchStatus>,
    #[serde(default)]
    pub output_dataset_id: Option<String>,
    #[serde(default)]
    pub num_records: Option<u64>,
    #[serde(default)]
    pub num_successful_records: Option<u64>,
    #[serde(default)]
    pub num_failed_records: Option<u64>,
    #[serde(default)]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBatchRequest {
    pub name: String,
    pub input_dataset_id: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub batch: Batch,
}

impl Pollable for BatchResponse {
    fn is_settled(&self) -> bool {
        matches!(
            self.batch.status,
            Some(BatchStatus::Completed | BatchStatus::Failed | BatchStatus::Canceled)
        )
    }

    fn status_label(&self) -> String {
        match self.batch.status {
            Some(status) => format!("{status:?}"),
            None => "pending".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListBatchesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBatchesResponse {
    #[serde(default)]
    pub batches: Vec<Batch>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetBatchRequest {
    #[serde(skip)]
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelBatchRequest {
    #[serde(skip)]
    pub id: String,
}

endpoint!(CreateBatchRequest => BatchResponse, BatchesCreate, |_r| "/v2/batches".to_string(), json);
endpoint!(ListBatchesRequest => ListBatchesResponse, BatchesList, |_r| "/v2/batches".to_string(), query);
endpoint!(GetBatchRequest => BatchResponse, BatchesRetrieve, |r| format!("/v2/batches/{}", urlencoding::encode(&r.id)));
endpoint!(CancelBatchRequest => Empty, BatchesCancel, |r| format!("/v2/batches/{}:cancel", urlencoding::encode(&r.id)));
