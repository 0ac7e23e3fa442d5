//! Request and response types for the Cohere REST API, the operation
//! catalog, and the error hierarchy shared by the client and the snippets.

#[macro_use]
pub mod operation;

pub mod batches;
pub mod chat;
pub mod chat_v2;
pub mod classify;
pub mod common;
pub mod connectors;
pub mod datasets;
pub mod embed;
pub mod embed_jobs;
pub mod error;
pub mod finetuning;
pub mod generate;
pub mod models;
pub mod rerank;
pub mod summarize;
pub mod tokenize;

pub use error::{ApiError, ConfigError, ErrorKind, SnippetError};
pub use operation::{
    Endpoint, FilePart, Framing, Method, Operation, Payload, Pollable, StreamChunk, Streamable,
};

pub use batches::*;
pub use chat::*;
pub use chat_v2::*;
pub use classify::*;
pub use common::*;
pub use connectors::*;
pub use datasets::*;
pub use embed::*;
pub use embed_jobs::*;
pub use finetuning::*;
pub use generate::*;
pub use models::*;
pub use rerank::*;
pub use summarize::*;
pub use tokenize::*;
