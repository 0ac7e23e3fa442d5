//! `snippets`: one subcommand per Cohere API operation.

mod generation;
mod render;
mod resources;
mod samples;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cohere_api::{ApiClient, CancellationToken};
use cohere_config::{CliOverrides, SnippetConfig};
use cohere_types::{Endpoint, Streamable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;

use crate::generation::{ChatArgs, ClassifyArgs, EmbedArgs, GenerateArgs, RerankArgs};
use crate::resources::{
    BatchesCommand, ConnectorsCommand, DatasetsCommand, EmbedJobsCommand, FinetuningCommand,
    ModelsCommand,
};

#[derive(Parser)]
#[command(name = "snippets", version, about = "Runnable samples for every Cohere API operation")]
struct Cli {
    /// API key (overrides CO_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// API base URL (overrides CO_API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model to use; v2 operations require one
    #[arg(long, global = true)]
    model: Option<String>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// v1 chat with the sample conversation
    Chat(ChatArgs),
    /// v1 chat, streamed
    ChatStream(ChatArgs),
    /// v2 chat with role-tagged messages
    ChatV2(ChatArgs),
    /// v2 chat, streamed
    ChatV2Stream(ChatArgs),
    /// v1 embeddings
    Embed(EmbedArgs),
    /// v2 embeddings, including images
    EmbedV2(EmbedArgs),
    /// v1 rerank
    Rerank(RerankArgs),
    /// v2 rerank
    RerankV2(RerankArgs),
    /// Few-shot classification
    Classify(ClassifyArgs),
    /// Split text into tokens
    Tokenize {
        #[arg(short, long, default_value = samples::TOKENIZE_TEXT)]
        text: String,
    },
    /// Turn tokens back into text
    Detokenize {
        /// Token ids; defaults to a sample sequence
        tokens: Vec<i64>,
    },
    /// Summarize a passage
    Summarize {
        /// Text to summarize; defaults to the ice cream article
        #[arg(short, long)]
        text: Option<String>,
    },
    /// v1 text generation
    Generate(GenerateArgs),
    /// v1 text generation, streamed
    GenerateStream(GenerateArgs),
    /// Dataset management
    #[command(subcommand)]
    Datasets(DatasetsCommand),
    /// Connector management
    #[command(subcommand)]
    Connectors(ConnectorsCommand),
    /// Embed job management
    #[command(subcommand)]
    EmbedJobs(EmbedJobsCommand),
    /// Fine-tuned model management
    #[command(subcommand)]
    Finetuning(FinetuningCommand),
    /// Batch job management
    #[command(subcommand)]
    Batches(BatchesCommand),
    /// Model discovery
    #[command(subcommand)]
    Models(ModelsCommand),
    /// Print every operation with its method and traits
    Catalog,
}

/// Everything a subcommand needs to make calls.
pub struct Ctx {
    pub client: ApiClient,
    pub model: Option<String>,
    pub cancel: CancellationToken,
}

impl Ctx {
    /// The configured model, for operations where the API has no default.
    pub fn require_model(&self, operation: &str) -> Result<String> {
        match &self.model {
            Some(model) => Ok(model.clone()),
            None => bail!("{operation} requires a model: pass --model or set COHERE_MODEL"),
        }
    }

    /// Send one request and print its response.
    pub async fn show<E>(&self, request: &E) -> Result<()>
    where
        E: Endpoint,
        E::Response: Serialize,
    {
        let result = self.client.send_cancellable(request, &self.cancel).await;
        if let Some(response) = render::settle(result, request.operation().name())? {
            render::print_json(&response)?;
        }
        Ok(())
    }

    /// Open the streaming variant of a request and print it as it arrives.
    pub async fn stream<E: Streamable>(&self, request: &E) -> Result<()> {
        let opened = self
            .client
            .open_stream_cancellable(request, &self.cancel)
            .await;
        match render::settle(opened, request.stream_operation().name())? {
            Some(stream) => render::print_stream(stream, &self.cancel).await,
            None => Ok(()),
        }
    }
}

/// Parse a CLI value the way the API spells it on the wire.
pub fn parse_wire<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unrecognized value '{s}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Command::Catalog = cli.command {
        for line in render::catalog_lines() {
            println!("{line}");
        }
        return Ok(());
    }

    let config = SnippetConfig::load(CliOverrides {
        api_key: cli.api_key,
        base_url: cli.base_url,
        model: cli.model,
    })
    .context("Failed to load configuration")?;
    tracing::debug!("Loaded {config:?}");

    let client = config.client().context("Failed to create API client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let ctx = Ctx {
        client,
        model: config.model,
        cancel,
    };
    run(&ctx, &cli.command).await
}

async fn run(ctx: &Ctx, command: &Command) -> Result<()> {
    match command {
        Command::Chat(args) => generation::chat(ctx, args).await,
        Command::ChatStream(args) => generation::chat_stream(ctx, args).await,
        Command::ChatV2(args) => generation::chat_v2(ctx, args).await,
        Command::ChatV2Stream(args) => generation::chat_v2_stream(ctx, args).await,
        Command::Embed(args) => generation::embed(ctx, args).await,
        Command::EmbedV2(args) => generation::embed_v2(ctx, args).await,
        Command::Rerank(args) => generation::rerank(ctx, args).await,
        Command::RerankV2(args) => generation::rerank_v2(ctx, args).await,
        Command::Classify(args) => generation::classify(ctx, args).await,
        Command::Tokenize { text } => generation::tokenize(ctx, text).await,
        Command::Detokenize { tokens } => generation::detokenize(ctx, tokens).await,
        Command::Summarize { text } => generation::summarize(ctx, text.as_deref()).await,
        Command::Generate(args) => generation::generate(ctx, args).await,
        Command::GenerateStream(args) => generation::generate_stream(ctx, args).await,
        Command::Datasets(command) => resources::datasets(ctx, command).await,
        Command::Connectors(command) => resources::connectors(ctx, command).await,
        Command::EmbedJobs(command) => resources::embed_jobs(ctx, command).await,
        Command::Finetuning(command) => resources::finetuning(ctx, command).await,
        Command::Batches(command) => resources::batches(ctx, command).await,
        Command::Models(command) => resources::models(ctx, command).await,
        Command::Catalog => Ok(()),
    }
}
