//! Model-call subcommands: chat, embed, rerank, classify, tokenize,
//! summarize, generate.

use anyhow::Result;
use clap::Args;
use cohere_types::{
    ChatConnector, ChatMessageV2, ChatRequest, ChatRequestV2, ClassifyRequest, ContentPart,
    DetokenizeRequest, DocumentV2, EmbedInputType, EmbedRequest, EmbedRequestV2, EmbeddingType,
    GenerateRequest, RerankDocument, RerankRequest, RerankRequestV2, SummarizeRequest,
    TokenizeRequest,
};

use crate::samples;
use crate::{Ctx, parse_wire};

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// The new user message
    #[arg(short, long, default_value = samples::CHAT_MESSAGE)]
    message: String,

    /// Start without the sample conversation history
    #[arg(long)]
    no_history: bool,

    /// Connector ids to search before answering (v1 only)
    #[arg(long = "connector", default_values_t = [samples::CHAT_CONNECTOR.to_string()])]
    connectors: Vec<String>,

    /// Send no connectors at all (v1 only)
    #[arg(long, conflicts_with = "connectors")]
    no_connectors: bool,

    /// Grounding document text; may be repeated
    #[arg(long = "document")]
    documents: Vec<String>,

    /// Offer the sales-report sample tools and ask the matching question
    #[arg(long)]
    tools: bool,

    /// Attach an image (URL or local file) to the user message (v2 only)
    #[arg(long)]
    image: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long)]
    max_tokens: Option<u32>,
}

impl ChatArgs {
    fn message(&self) -> &str {
        if self.tools && self.message == samples::CHAT_MESSAGE {
            samples::TOOLS_MESSAGE
        } else {
            &self.message
        }
    }

    fn request_v1(&self, model: Option<String>) -> ChatRequest {
        let mut request = ChatRequest::new(self.message());
        request.model = model;
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        if self.tools {
            request.tools = samples::sales_tools();
        } else {
            if !self.no_history {
                request.chat_history = samples::chat_history();
            }
            if !self.no_connectors {
                request.connectors = self.connectors.iter().map(ChatConnector::new).collect();
            }
        }
        request.documents = self
            .documents
            .iter()
            .map(|text| samples::snippet_document(text))
            .collect();
        request
    }

    fn request_v2(&self, model: String) -> Result<ChatRequestV2> {
        let mut messages = if self.no_history || self.tools {
            Vec::new()
        } else {
            samples::chat_history_v2()
        };
        messages.push(match &self.image {
            Some(image) => ChatMessageV2::user_parts(vec![
                ContentPart::text(self.message()),
                ContentPart::image_url(samples::image_reference(image)?),
            ]),
            None => ChatMessageV2::user(self.message()),
        });

        let mut request = ChatRequestV2::new(model, messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        if self.tools {
            request.tools = samples::sales_tools_v2();
        }
        request.documents = self.documents.iter().cloned().map(DocumentV2::Text).collect();
        Ok(request)
    }
}

pub async fn chat(ctx: &Ctx, args: &ChatArgs) -> Result<()> {
    let request = args.request_v1(ctx.model.clone());
    ctx.show(&request).await
}

pub async fn chat_stream(ctx: &Ctx, args: &ChatArgs) -> Result<()> {
    let request = args.request_v1(ctx.model.clone());
    ctx.stream(&request).await
}

pub async fn chat_v2(ctx: &Ctx, args: &ChatArgs) -> Result<()> {
    let request = args.request_v2(ctx.require_model("v2.chat")?)?;
    ctx.show(&request).await
}

pub async fn chat_v2_stream(ctx: &Ctx, args: &ChatArgs) -> Result<()> {
    let request = args.request_v2(ctx.require_model("v2.chat.stream")?)?;
    ctx.stream(&request).await
}

#[derive(Args, Debug, Clone)]
pub struct EmbedArgs {
    /// Texts to embed; may be repeated
    #[arg(long = "text", default_values_t = samples::EMBED_TEXTS.map(String::from))]
    texts: Vec<String>,

    /// search_document, search_query, classification, clustering or image
    #[arg(long, default_value = "classification", value_parser = parse_wire::<EmbedInputType>)]
    input_type: EmbedInputType,

    /// float, int8, uint8, binary, ubinary or base64; may be repeated
    #[arg(long = "embedding-type", value_parser = parse_wire::<EmbeddingType>)]
    embedding_types: Vec<EmbeddingType>,

    /// Embed an image (URL or local file) instead of the texts (v2 only)
    #[arg(long)]
    image: Option<String>,
}

pub async fn embed(ctx: &Ctx, args: &EmbedArgs) -> Result<()> {
    let request = EmbedRequest {
        texts: args.texts.clone(),
        model: ctx.model.clone(),
        input_type: Some(args.input_type),
        embedding_types: args.embedding_types.clone(),
        ..EmbedRequest::default()
    };
    ctx.show(&request).await
}

pub async fn embed_v2(ctx: &Ctx, args: &EmbedArgs) -> Result<()> {
    let model = ctx.require_model("v2.embed")?;
    let mut request = match &args.image {
        Some(image) => {
            let mut request = EmbedRequestV2::new(model, EmbedInputType::Image);
            request.images = vec![samples::image_reference(image)?];
            request
        }
        None => {
            let mut request = EmbedRequestV2::new(model, args.input_type);
            request.texts = args.texts.clone();
            request
        }
    };
    request.embedding_types = if args.embedding_types.is_empty() {
        vec![EmbeddingType::Float]
    } else {
        args.embedding_types.clone()
    };
    ctx.show(&request).await
}

#[derive(Args, Debug, Clone)]
pub struct RerankArgs {
    #[arg(short, long, default_value = samples::RERANK_QUERY)]
    query: String,

    /// Candidate documents; defaults to the capital-city sample
    #[arg(long = "document")]
    documents: Vec<String>,

    #[arg(long, default_value_t = 3)]
    top_n: u32,
}

impl RerankArgs {
    fn documents(&self) -> Vec<String> {
        if self.documents.is_empty() {
            samples::rerank_documents().into_iter().map(String::from).collect()
        } else {
            self.documents.clone()
        }
    }
}

pub async fn rerank(ctx: &Ctx, args: &RerankArgs) -> Result<()> {
    let request = RerankRequest {
        query: args.query.clone(),
        documents: args.documents().into_iter().map(RerankDocument::Text).collect(),
        model: ctx.model.clone(),
        top_n: Some(args.top_n),
        ..RerankRequest::default()
    };
    ctx.show(&request).await
}

pub async fn rerank_v2(ctx: &Ctx, args: &RerankArgs) -> Result<()> {
    let request = RerankRequestV2 {
        model: ctx.require_model("v2.rerank")?,
        query: args.query.clone(),
        documents: args.documents(),
        top_n: Some(args.top_n),
        ..RerankRequestV2::default()
    };
    ctx.show(&request).await
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Inputs to classify against the spam/not-spam examples
    #[arg(long = "input", default_values_t = samples::CLASSIFY_INPUTS.map(String::from))]
    inputs: Vec<String>,
}

pub async fn classify(ctx: &Ctx, args: &ClassifyArgs) -> Result<()> {
    let request = ClassifyRequest {
        inputs: args.inputs.clone(),
        examples: samples::classify_examples(),
        model: ctx.model.clone(),
        ..ClassifyRequest::default()
    };
    ctx.show(&request).await
}

pub async fn tokenize(ctx: &Ctx, text: &str) -> Result<()> {
    let request = TokenizeRequest {
        text: text.to_string(),
        model: ctx.model.clone(),
    };
    ctx.show(&request).await
}

pub async fn detokenize(ctx: &Ctx, tokens: &[i64]) -> Result<()> {
    let request = DetokenizeRequest {
        tokens: if tokens.is_empty() {
            samples::DETOKENIZE_TOKENS.to_vec()
        } else {
            tokens.to_vec()
        },
        model: ctx.model.clone(),
    };
    ctx.show(&request).await
}

pub async fn summarize(ctx: &Ctx, text: Option<&str>) -> Result<()> {
    let request = SummarizeRequest {
        text: text.unwrap_or(samples::SUMMARIZE_TEXT).to_string(),
        model: ctx.model.clone(),
        ..SummarizeRequest::default()
    };
    ctx.show(&request).await
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(short, long, default_value = samples::GENERATE_PROMPT)]
    prompt: String,

    #[arg(long)]
    max_tokens: Option<u32>,

    #[arg(long)]
    temperature: Option<f32>,
}

impl GenerateArgs {
    fn request(&self, model: Option<String>) -> GenerateRequest {
        let mut request = GenerateRequest::new(&self.prompt);
        request.model = model;
        request.max_tokens = self.max_tokens;
        request.temperature = self.temperature;
        request
    }
}

pub async fn generate(ctx: &Ctx, args: &GenerateArgs) -> Result<()> {
    let request = args.request(ctx.model.clone());
    ctx.show(&request).await
}

pub async fn generate_stream(ctx: &Ctx, args: &GenerateArgs) -> Result<()> {
    let request = args.request(ctx.model.clone());
    ctx.stream(&request).await
}
