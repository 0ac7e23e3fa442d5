//! Fine-tuned models, their training events and step metrics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::Empty;
use crate::operation::Pollable;

const FINETUNED_MODELS: &str = "/v1/finetuning/finetuned-models";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseType {
    #[serde(rename = "BASE_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "BASE_TYPE_GENERATIVE")]
    Generative,
    #[serde(rename = "BASE_TYPE_CLASSIFICATION")]
    Classification,
    #[serde(rename = "BASE_TYPE_RERANK")]
    Rerank,
    #[serde(rename = "BASE_TYPE_CHAT")]
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinetuneStrategy {
    #[serde(rename = "STRATEGY_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "STRATEGY_VANILLA")]
    Vanilla,
    #[serde(rename = "STRATEGY_TFEW")]
    Tfew,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseModel {
    pub base_type: BaseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<FinetuneStrategy>,
}

impl BaseModel {
    pub fn new(base_type: BaseType) -> Self {
        Self {
            base_type,
            name: None,
            version: None,
            strategy: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hyperparameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_stopping_patience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_stopping_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_epochs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora_alpha: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora_target_modules: Option<String>,
}

/// Weights & Biases run reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WandbConfig {
    pub project: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetuneSettings {
    pub base_model: BaseModel,
    pub dataset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperparameters: Option<Hyperparameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_label: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wandb: Option<WandbConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinetunedModelStatus {
    #[serde(rename = "STATUS_NOT_STARTED")]
    NotStarted,
    #[serde(rename = "STATUS_QUEUED")]
    Queued,
    #[serde(rename = "STATUS_FINETUNING")]
    Finetuning,
    #[serde(rename = "STATUS_DEPLOYING_API")]
    DeployingApi,
    #[serde(rename = "STATUS_READY")]
    Ready,
    #[serde(rename = "STATUS_FAILED")]
    Failed,
    #[serde(rename = "STATUS_DELETED")]
    Deleted,
    #[serde(rename = "STATUS_TEMPORARILY_OFFLINE")]
    TemporarilyOffline,
    #[serde(rename = "STATUS_PAUSED")]
    Paused,
    #[serde(other)]
    Unspecified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetunedModel {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub settings: FinetuneSettings,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub status: Option<FinetunedModelStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetunedModelResponse {
    pub finetuned_model: FinetunedModel,
}

impl Pollable for FinetunedModelResponse {
    fn is_settled(&self) -> bool {
        matches!(
            self.finetuned_model.status,
            Some(
                FinetunedModelStatus::Ready
                    | FinetunedModelStatus::Failed
                    | FinetunedModelStatus::Deleted
            )
        )
    }

    fn status_label(&self) -> String {
        match self.finetuned_model.status {
            Some(status) => format!("{status:?}"),
            None => "pending".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateFinetunedModelRequest {
    pub name: String,
    pub settings: FinetuneSettings,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListFinetunedModelsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFinetunedModelsResponse {
    #[serde(default)]
    pub finetuned_models: Vec<FinetunedModel>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetFinetunedModelRequest {
    #[serde(skip)]
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateFinetunedModelRequest {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub settings: FinetuneSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FinetunedModelStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteFinetunedModelRequest {
    #[serde(skip)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListEventsRequest {
    #[serde(skip)]
    pub finetuned_model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetuningEvent {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: Option<FinetunedModelStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEventsResponse {
    #[serde(default)]
    pub events: Vec<FinetuningEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListTrainingStepMetricsRequest {
    #[serde(skip)]
    pub finetuned_model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStepMetrics {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub step_number: Option<u64>,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTrainingStepMetricsResponse {
    #[serde(default)]
    pub step_metrics: Vec<TrainingStepMetrics>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

endpoint!(CreateFinetunedModelRequest => FinetunedModelResponse, FinetunedModelsCreate, |_r| FINETUNED_MODELS.to_string(), json);
endpoint!(ListFinetunedModelsRequest => ListFinetunedModelsResponse, FinetunedModelsList, |_r| FINETUNED_MODELS.to_string(), query);
endpoint!(GetFinetunedModelRequest => FinetunedModelResponse, FinetunedModelsGet, |r| format!("{FINETUNED_MODELS}/{}", urlencoding::encode(&r.id)));
endpoint!(UpdateFinetunedModelRequest => FinetunedModelResponse, FinetunedModelsUpdate, |r| format!("{FINETUNED_MODELS}/{}", urlencoding::encode(&r.id)), json);
endpoint!(DeleteFinetunedModelRequest => Empty, FinetunedModelsDelete, |r| format!("{FINETUNED_MODELS}/{}", urlencoding::encode(&r.id)));
endpoint!(ListEventsRequest => ListEventsResponse, FinetuningEvents, |r| format!("{FINETUNED_MODELS}/{}/events", urlencoding::encode(&r.finetuned_model_id)), query);
endpoint!(ListTrainingStepMetricsRequest => ListTrainingStepMetricsResponse, FinetuningTrainingStepMetrics, |r| format!("{FINETUNED_MODELS}/{}/training-step-metrics", urlencoding::encode(&r.finetuned_model_id)), query);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Endpoint, Payload};
    use serde_json::json;

    fn chat_settings() -> FinetuneSettings {
        FinetuneSettings {
            base_model: BaseModel::new(BaseType::Chat),
            dataset_id: "my-dataset-id".into(),
            hyperparameters: Some(Hyperparameters {
                early_stopping_patience: Some(10),
                early_stopping_threshold: Some(0.001),
                train_batch_size: Some(16),
                train_epochs: Some(1),
                learning_rate: Some(0.01),
                ..Hyperparameters::default()
            }),
            multi_label: None,
            wandb: None,
        }
    }

    #[test]
    fn create_body_shape() {
        let request = CreateFinetunedModelRequest {
            name: "test-finetuned-model".into(),
            settings: chat_settings(),
        };
        let Payload::Json(body) = request.payload().unwrap() else {
            panic!("Expected JSON payload");
        };
        assert_eq!(body["settings"]["base_model"]["base_type"], "BASE_TYPE_CHAT");
        assert_eq!(body["settings"]["hyperparameters"]["train_batch_size"], 16);
        assert!(body["settings"]["hyperparameters"].get("lora_rank").is_none());
    }

    #[test]
    fn sub_resource_paths() {
        let events = ListEventsRequest {
            finetuned_model_id: "test-id".into(),
            ..ListEventsRequest::default()
        };
        assert_eq!(events.path(), "/v1/finetuning/finetuned-models/test-id/events");
        assert!(events.query().unwrap().is_empty());

        let metrics = ListTrainingStepMetricsRequest {
            finetuned_model_id: "test-id".into(),
            page_size: Some(5),
            page_token: None,
        };
        assert_eq!(
            metrics.path(),
            "/v1/finetuning/finetuned-models/test-id/training-step-metrics"
        );
        assert_eq!(metrics.query().unwrap(), vec![("page_size".to_string(), "5".to_string())]);
    }

    #[test]
    fn model_settles_when_ready() {
        let response: FinetunedModelResponse = serde_json::from_value(json!({
            "finetuned_model": {
                "id": "ft-1",
                "name": "test-finetuned-model",
                "settings": {"base_model": {"base_type": "BASE_TYPE_CHAT"}, "dataset_id": "my-dataset-id"},
                "status": "STATUS_READY",
                "created_at": "2024-02-02T00:00:00Z"
            }
        }))
        .unwrap();
        assert!(response.is_settled());
        assert_eq!(response.status_label(), "Ready");
    }

    #[test]
    fn unknown_status_is_unspecified() {
        let event: FinetuningEvent =
            serde_json::from_value(json!({"status": "STATUS_SOMETHING_NEW"})).unwrap();
        assert_eq!(event.status, Some(FinetunedModelStatus::Unspecified));
    }
}
