//! Datasets: uploaded files that fine-tuning, embed jobs and batches consume.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::Empty;
use crate::operation::{FilePart, Payload, Pollable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetType {
    EmbedInput,
    EmbedResult,
    ClusterResult,
    ClusterOutliers,
    RerankerFinetuneInput,
    SingleLabelClassificationFinetuneInput,
    ChatFinetuneInput,
    MultiLabelClassificationFinetuneInput,
    BatchChatInput,
    BatchEmbedV2Input,
}

/// Server-side validation state of an uploaded dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetValidationStatus {
    Queued,
    Processing,
    Failed,
    Validated,
    Skipped,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DatasetValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetValidationStatus::Unknown => "unknown",
            DatasetValidationStatus::Queued => "queued",
            DatasetValidationStatus::Processing => "processing",
            DatasetValidationStatus::Failed => "failed",
            DatasetValidationStatus::Validated => "validated",
            DatasetValidationStatus::Skipped => "skipped",
        }
    }
}

/// File contents held in memory for upload.
#[derive(Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .finish()
    }
}

/// Upload a dataset. `name` and `type` travel as query parameters and the
/// files as multipart parts.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub dataset_type: DatasetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_original_file: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_malformed_input: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text_separator: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_delimiter: Option<String>,
    #[serde(skip)]
    pub data: FileUpload,
    #[serde(skip)]
    pub eval_data: Option<FileUpload>,
}

impl CreateDatasetRequest {
    pub fn new(name: impl Into<String>, dataset_type: DatasetType, data: FileUpload) -> Self {
        Self {
            name: name.into(),
            dataset_type,
            keep_original_file: None,
            skip_malformed_input: None,
            text_separator: Vec::new(),
            csv_delimiter: None,
            data,
            eval_data: None,
        }
    }

    fn parts(&self) -> Vec<FilePart> {
        let mut parts = vec![FilePart {
            field: "data",
            file_name: self.data.file_name.clone(),
            bytes: self.data.bytes.clone(),
        }];
        if let Some(eval) = &self.eval_data {
            parts.push(FilePart {
                field: "eval_data",
                file_name: eval.file_name.clone(),
                bytes: eval.bytes.clone(),
            });
        }
        parts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetResponse {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDatasetsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<DatasetValidationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPart {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub num_rows: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dataset_type: Option<DatasetType>,
    #[serde(default)]
    pub validation_status: DatasetValidationStatus,
    #[serde(default)]
    pub validation_error: Option<String>,
    #[serde(default)]
    pub total_usage: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dataset_parts: Vec<DatasetPart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDatasetsResponse {
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetDatasetRequest {
    #[serde(skip)]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDatasetResponse {
    pub dataset: Dataset,
}

impl Pollable for GetDatasetResponse {
    fn is_settled(&self) -> bool {
        matches!(
            self.dataset.validation_status,
            DatasetValidationStatus::Validated
                | DatasetValidationStatus::Failed
                | DatasetValidationStatus::Skipped
        )
    }

    fn status_label(&self) -> String {
        self.dataset.validation_status.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteDatasetRequest {
    #[serde(skip)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetUsageRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetUsageResponse {
    /// Bytes of storage used by the organization.
    #[serde(default)]
    pub organization_usage: Option<u64>,
}

impl crate::operation::Endpoint for CreateDatasetRequest {
    type Response = CreateDatasetResponse;

    fn operation(&self) -> crate::operation::Operation {
        crate::operation::Operation::DatasetsCreate
    }

    fn path(&self) -> String {
        "/v1/datasets".to_string()
    }

    fn query(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        crate::operation::query_pairs(self)
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Multipart(self.parts()))
    }
}

endpoint!(ListDatasetsRequest => ListDatasetsResponse, DatasetsList, |_r| "/v1/datasets".to_string(), query);
endpoint!(GetDatasetRequest => GetDatasetResponse, DatasetsGet, |r| format!("/v1/datasets/{}", urlencoding::encode(&r.id)));
endpoint!(DeleteDatasetRequest => Empty, DatasetsDelete, |r| format!("/v1/datasets/{}", urlencoding::encode(&r.id)));
endpoint!(DatasetUsageRequest => DatasetUsageResponse, DatasetsUsage, |_r| "/v1/datasets/usage".to_string());
