//! Resource-management subcommands: datasets, connectors, embed jobs,
//! fine-tuned models, batches and models.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use cohere_api::WaitConfig;
use cohere_types::{
    BaseModel, BaseType, CancelBatchRequest, CancelEmbedJobRequest, CreateBatchRequest,
    CreateConnectorRequest, CreateDatasetRequest, CreateEmbedJobRequest,
    CreateFinetunedModelRequest, DatasetType, DatasetUsageRequest, DeleteConnectorRequest,
    DeleteDatasetRequest, DeleteFinetunedModelRequest, EmbedInputType, FileUpload,
    FinetuneSettings, GetBatchRequest, GetConnectorRequest, GetDatasetRequest, GetEmbedJobRequest,
    GetFinetunedModelRequest, GetModelRequest, ListBatchesRequest, ListConnectorsRequest,
    ListDatasetsRequest, ListEmbedJobsRequest, ListEventsRequest, ListFinetunedModelsRequest,
    ListModelsRequest, ListTrainingStepMetricsRequest, OAuthAuthorizeRequest,
    UpdateConnectorRequest, UpdateFinetunedModelRequest,
};

use crate::render::{print_json, settle};
use crate::{Ctx, parse_wire};

/// How long `wait` polls before giving up.
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Seconds between polls
    #[arg(long, default_value_t = 5)]
    interval: u64,

    /// Seconds before giving up
    #[arg(long, default_value_t = 600)]
    timeout: u64,
}

impl WaitArgs {
    fn config(&self) -> WaitConfig {
        WaitConfig {
            poll_interval: Duration::from_secs(self.interval.max(1)),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

async fn wait_and_show<E>(ctx: &Ctx, request: &E, wait: &WaitArgs) -> Result<()>
where
    E: cohere_types::Endpoint,
    E::Response: cohere_types::Pollable + serde::Serialize,
{
    let config = wait.config();
    let poll = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Err(cohere_types::ApiError::Cancelled),
        result = ctx.client.wait(request, &config) => result,
    };
    if let Some(response) = settle(poll, "wait")? {
        print_json(&response)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug, Clone)]
pub enum DatasetsCommand {
    /// Upload a file as a new dataset
    Create {
        #[arg(long, default_value = "my-dataset")]
        name: String,

        /// Dataset type, e.g. embed-input or chat-finetune-input
        #[arg(long = "type", default_value = "embed-input", value_parser = parse_wire::<DatasetType>)]
        dataset_type: DatasetType,

        /// File to upload
        #[arg(long, default_value = "embed_jobs_sample_data.jsonl")]
        file: PathBuf,

        /// Optional evaluation file
        #[arg(long)]
        eval_file: Option<PathBuf>,

        /// Wait for validation to finish
        #[arg(long)]
        wait: bool,

        #[command(flatten)]
        wait_args: WaitArgs,
    },
    /// List datasets
    List {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Get one dataset
    Get { id: String },
    /// Delete a dataset
    Delete { id: String },
    /// Show organization storage usage
    Usage,
    /// Poll a dataset until validation settles
    Wait {
        id: String,

        #[command(flatten)]
        wait_args: WaitArgs,
    },
}

async fn read_upload(path: &Path) -> Result<FileUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    Ok(FileUpload::new(file_name, bytes))
}

pub async fn datasets(ctx: &Ctx, command: &DatasetsCommand) -> Result<()> {
    match command {
        DatasetsCommand::Create {
            name,
            dataset_type,
            file,
            eval_file,
            wait,
            wait_args,
        } => {
            let mut request = CreateDatasetRequest::new(name, *dataset_type, read_upload(file).await?);
            if let Some(eval) = eval_file {
                request.eval_data = Some(read_upload(eval).await?);
            }
            let result = ctx.client.send_cancellable(&request, &ctx.cancel).await;
            let Some(created) = settle(result, "datasets.create")? else {
                return Ok(());
            };
            match (created.id, *wait) {
                (Some(id), true) => {
                    tracing::info!("Dataset {id} uploaded; waiting for validation");
                    wait_and_show(ctx, &GetDatasetRequest { id }, wait_args).await
                }
                (id, _) => print_json(&serde_json::json!({ "id": id })),
            }
        }
        DatasetsCommand::List { limit } => {
            ctx.show(&ListDatasetsRequest {
                limit: *limit,
                ..ListDatasetsRequest::default()
            })
            .await
        }
        DatasetsCommand::Get { id } => ctx.show(&GetDatasetRequest { id: id.clone() }).await,
        DatasetsCommand::Delete { id } => ctx.show(&DeleteDatasetRequest { id: id.clone() }).await,
        DatasetsCommand::Usage => ctx.show(&DatasetUsageRequest::default()).await,
        DatasetsCommand::Wait { id, wait_args } => {
            wait_and_show(ctx, &GetDatasetRequest { id: id.clone() }, wait_args).await
        }
    }
}

// ---------------------------------------------------------------------------
// Connectors
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug, Clone)]
pub enum ConnectorsCommand {
    /// Register a search connector
    Create {
        #[arg(long, default_value = "test-connector")]
        name: String,

        #[arg(long, default_value = "https://example.com/search")]
        url: String,

        #[arg(long, default_value = "A test connector")]
        description: String,
    },
    /// List connectors
    List {
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        offset: Option<u32>,
    },
    /// Get one connector
    Get { id: String },
    /// Rename or repoint a connector
    Update {
        id: String,

        #[arg(long, default_value = "test-connector-renamed")]
        name: String,

        #[arg(long)]
        url: Option<String>,
    },
    /// Delete a connector
    Delete { id: String },
    /// Start the OAuth flow for a connector
    Authorize {
        #[arg(default_value = "test-id")]
        id: String,

        #[arg(long, default_value = "https://connector-example.com/search")]
        after_token_redirect: String,
    },
}

pub async fn connectors(ctx: &Ctx, command: &ConnectorsCommand) -> Result<()> {
    match command {
        ConnectorsCommand::Create {
            name,
            url,
            description,
        } => {
            ctx.show(&CreateConnectorRequest {
                name: name.clone(),
                url: url.clone(),
                description: Some(description.clone()),
                ..CreateConnectorRequest::default()
            })
            .await
        }
        ConnectorsCommand::List { limit, offset } => {
            ctx.show(&ListConnectorsRequest {
                limit: *limit,
                offset: *offset,
            })
            .await
        }
        ConnectorsCommand::Get { id } => ctx.show(&GetConnectorRequest { id: id.clone() }).await,
        ConnectorsCommand::Update { id, name, url } => {
            ctx.show(&UpdateConnectorRequest {
                id: id.clone(),
                name: Some(name.clone()),
                url: url.clone(),
                ..UpdateConnectorRequest::default()
            })
            .await
        }
        ConnectorsCommand::Delete { id } => {
            ctx.show(&DeleteConnectorRequest { id: id.clone() }).await
        }
        ConnectorsCommand::Authorize {
            id,
            after_token_redirect,
        } => {
            ctx.show(&OAuthAuthorizeRequest {
                id: id.clone(),
                after_token_redirect: Some(after_token_redirect.clone()),
            })
            .await
        }
    }
}

// ---------------------------------------------------------------------------
// Embed jobs
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug, Clone)]
pub enum EmbedJobsCommand {
    /// Start embedding a dataset
    Create {
        #[arg(long, default_value = "my-dataset")]
        dataset_id: String,

        #[arg(long, default_value = "search_document", value_parser = parse_wire::<EmbedInputType>)]
        input_type: EmbedInputType,

        #[arg(long)]
        name: Option<String>,
    },
    /// List embed jobs
    List,
    /// Get one embed job
    Get { id: String },
    /// Cancel a running embed job
    Cancel { id: String },
    /// Poll an embed job until it completes, fails or is cancelled
    Wait {
        id: String,

        #[command(flatten)]
        wait_args: WaitArgs,
    },
}

pub async fn embed_jobs(ctx: &Ctx, command: &EmbedJobsCommand) -> Result<()> {
    match command {
        EmbedJobsCommand::Create {
            dataset_id,
            input_type,
            name,
        } => {
            let model = ctx.require_model("embed_jobs.create")?;
            let mut request = CreateEmbedJobRequest::new(model, dataset_id, *input_type);
            request.name = name.clone();
            ctx.show(&request).await
        }
        EmbedJobsCommand::List => ctx.show(&ListEmbedJobsRequest::default()).await,
        EmbedJobsCommand::Get { id } => ctx.show(&GetEmbedJobRequest { id: id.clone() }).await,
        EmbedJobsCommand::Cancel { id } => {
            ctx.show(&CancelEmbedJobRequest { id: id.clone() }).await
        }
        EmbedJobsCommand::Wait { id, wait_args } => {
            wait_and_show(ctx, &GetEmbedJobRequest { id: id.clone() }, wait_args).await
        }
    }
}

// ---------------------------------------------------------------------------
// Fine-tuning
// ---------------------------------------------------------------------------

/// Accepts `chat` as well as the wire form `BASE_TYPE_CHAT`.
fn parse_base_type(s: &str) -> Result<BaseType, String> {
    let upper = s.to_ascii_uppercase();
    let wire = if upper.starts_with("BASE_TYPE_") {
        upper
    } else {
        format!("BASE_TYPE_{upper}")
    };
    parse_wire::<BaseType>(&wire).map_err(|_| format!("unrecognized base type '{s}'"))
}

#[derive(Args, Debug, Clone)]
pub struct FinetuneSettingsArgs {
    /// chat, generative, classification or rerank
    #[arg(long, default_value = "chat", value_parser = parse_base_type)]
    base_type: BaseType,

    #[arg(long, default_value = "test-dataset-id")]
    dataset_id: String,
}

impl FinetuneSettingsArgs {
    fn settings(&self) -> FinetuneSettings {
        FinetuneSettings {
            base_model: BaseModel::new(self.base_type),
            dataset_id: self.dataset_id.clone(),
            hyperparameters: None,
            multi_label: None,
            wandb: None,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum FinetuningCommand {
    /// Start fine-tuning a model
    Create {
        #[arg(long, default_value = "test-finetuned-model")]
        name: String,

        #[command(flatten)]
        settings: FinetuneSettingsArgs,
    },
    /// List fine-tuned models
    List {
        #[arg(long)]
        page_size: Option<u32>,

        #[arg(long)]
        page_token: Option<String>,
    },
    /// Get one fine-tuned model
    Get { id: String },
    /// Rename a fine-tuned model
    Update {
        id: String,

        #[arg(long, default_value = "new name")]
        name: String,

        #[command(flatten)]
        settings: FinetuneSettingsArgs,
    },
    /// Delete a fine-tuned model
    Delete { id: String },
    /// List status events of a fine-tuned model
    Events { id: String },
    /// List training-step metrics of a fine-tuned model
    Metrics { id: String },
    /// Poll a fine-tuned model until it is ready, fails or is deleted
    Wait {
        id: String,

        #[command(flatten)]
        wait_args: WaitArgs,
    },
}

pub async fn finetuning(ctx: &Ctx, command: &FinetuningCommand) -> Result<()> {
    match command {
        FinetuningCommand::Create { name, settings } => {
            ctx.show(&CreateFinetunedModelRequest {
                name: name.clone(),
                settings: settings.settings(),
            })
            .await
        }
        FinetuningCommand::List {
            page_size,
            page_token,
        } => {
            ctx.show(&ListFinetunedModelsRequest {
                page_size: *page_size,
                page_token: page_token.clone(),
                ..ListFinetunedModelsRequest::default()
            })
            .await
        }
        FinetuningCommand::Get { id } => {
            ctx.show(&GetFinetunedModelRequest { id: id.clone() }).await
        }
        FinetuningCommand::Update { id, name, settings } => {
            ctx.show(&UpdateFinetunedModelRequest {
                id: id.clone(),
                name: name.clone(),
                settings: settings.settings(),
                status: None,
            })
            .await
        }
        FinetuningCommand::Delete { id } => {
            ctx.show(&DeleteFinetunedModelRequest { id: id.clone() }).await
        }
        FinetuningCommand::Events { id } => {
            ctx.show(&ListEventsRequest {
                finetuned_model_id: id.clone(),
                ..ListEventsRequest::default()
            })
            .await
        }
        FinetuningCommand::Metrics { id } => {
            ctx.show(&ListTrainingStepMetricsRequest {
                finetuned_model_id: id.clone(),
                ..ListTrainingStepMetricsRequest::default()
            })
            .await
        }
        FinetuningCommand::Wait { id, wait_args } => {
            wait_and_show(ctx, &GetFinetunedModelRequest { id: id.clone() }, wait_args).await
        }
    }
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug, Clone)]
pub enum BatchesCommand {
    /// Submit a batch over an input dataset
    Create {
        #[arg(long, default_value = "my-batch")]
        name: String,

        #[arg(long)]
        input_dataset_id: String,
    },
    /// List batches
    List {
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Retrieve one batch
    Get { id: String },
    /// Cancel a batch
    Cancel { id: String },
    /// Poll a batch until it completes, fails or is canceled
    Wait {
        id: String,

        #[command(flatten)]
        wait_args: WaitArgs,
    },
}

pub async fn batches(ctx: &Ctx, command: &BatchesCommand) -> Result<()> {
    match command {
        BatchesCommand::Create {
            name,
            input_dataset_id,
        } => {
            ctx.show(&CreateBatchRequest {
                name: name.clone(),
                input_dataset_id: input_dataset_id.clone(),
                model: ctx.require_model("batches.create")?,
            })
            .await
        }
        BatchesCommand::List { page_size } => {
            ctx.show(&ListBatchesRequest {
                page_size: *page_size,
                ..ListBatchesRequest::default()
            })
            .await
        }
        BatchesCommand::Get { id } => ctx.show(&GetBatchRequest { id: id.clone() }).await,
        BatchesCommand::Cancel { id } => ctx.show(&CancelBatchRequest { id: id.clone() }).await,
        BatchesCommand::Wait { id, wait_args } => {
            wait_and_show(ctx, &GetBatchRequest { id: id.clone() }, wait_args).await
        }
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug, Clone)]
pub enum ModelsCommand {
    /// List available models
    List {
        /// Only models compatible with this endpoint, e.g. chat
        #[arg(long)]
        endpoint: Option<String>,

        #[arg(long)]
        page_size: Option<u32>,

        /// Only the default model of the endpoint
        #[arg(long)]
        default_only: bool,
    },
    /// Get one model by name
    Get { model: String },
}

pub async fn models(ctx: &Ctx, command: &ModelsCommand) -> Result<()> {
    match command {
        ModelsCommand::List {
            endpoint,
            page_size,
            default_only,
        } => {
            ctx.show(&ListModelsRequest {
                endpoint: endpoint.clone(),
                page_size: *page_size,
                default_only: default_only.then_some(true),
                ..ListModelsRequest::default()
            })
            .await
        }
        ModelsCommand::Get { model } => {
            ctx.show(&GetModelRequest {
                model: model.clone(),
            })
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_type_accepts_short_and_wire_forms() {
        assert_eq!(parse_base_type("chat").unwrap(), BaseType::Chat);
        assert_eq!(parse_base_type("BASE_TYPE_RERANK").unwrap(), BaseType::Rerank);
        assert!(parse_base_type("poetry").is_err());
    }

    #[test]
    fn wait_interval_never_zero() {
        let args = WaitArgs {
            interval: 0,
            timeout: 30,
        };
        let config = args.config();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn upload_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embed_jobs_sample_data.jsonl");
        std::fs::write(&path, "{\"text\": \"The quick brown fox jumps over the lazy dog\"}\n")
            .unwrap();
        let upload = read_upload(&path).await.unwrap();
        assert_eq!(upload.file_name, "embed_jobs_sample_data.jsonl");
        assert!(!upload.bytes.is_empty());
    }

    #[tokio::test]
    async fn missing_upload_reports_path() {
        let err = read_upload(Path::new("/nonexistent/data.jsonl")).await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/data.jsonl"));
    }
}
