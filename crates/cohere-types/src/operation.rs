//! The operation catalog and the traits that tie request types to it.
//!
//! Every remote call is one [`Operation`]. A request type implements
//! [`Endpoint`] to say which operation it targets, where it goes and what it
//! carries; the client needs nothing else to dispatch it.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ApiError;

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Every operation exposed by the hosted API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Chat,
    ChatStream,
    ChatV2,
    ChatStreamV2,
    Embed,
    EmbedV2,
    Rerank,
    RerankV2,
    Classify,
    Tokenize,
    Detokenize,
    Summarize,
    Generate,
    GenerateStream,
    DatasetsCreate,
    DatasetsList,
    DatasetsGet,
    DatasetsDelete,
    DatasetsUsage,
    ConnectorsCreate,
    ConnectorsList,
    ConnectorsGet,
    ConnectorsUpdate,
    ConnectorsDelete,
    ConnectorsOAuthAuthorize,
    EmbedJobsCreate,
    EmbedJobsList,
    EmbedJobsGet,
    EmbedJobsCancel,
    FinetunedModelsCreate,
    FinetunedModelsList,
    FinetunedModelsGet,
    FinetunedModelsUpdate,
    FinetunedModelsDelete,
    FinetuningEvents,
    FinetuningTrainingStepMetrics,
    BatchesCreate,
    BatchesList,
    BatchesRetrieve,
    BatchesCancel,
    ModelsList,
    ModelsGet,
}

impl Operation {
    /// The full catalog, in documentation order.
    pub const ALL: &'static [Operation] = &[
        Operation::Chat,
        Operation::ChatStream,
        Operation::ChatV2,
        Operation::ChatStreamV2,
        Operation::Embed,
        Operation::EmbedV2,
        Operation::Rerank,
        Operation::RerankV2,
        Operation::Classify,
        Operation::Tokenize,
        Operation::Detokenize,
        Operation::Summarize,
        Operation::Generate,
        Operation::GenerateStream,
        Operation::DatasetsCreate,
        Operation::DatasetsList,
        Operation::DatasetsGet,
        Operation::DatasetsDelete,
        Operation::DatasetsUsage,
        Operation::ConnectorsCreate,
        Operation::ConnectorsList,
        Operation::ConnectorsGet,
        Operation::ConnectorsUpdate,
        Operation::ConnectorsDelete,
        Operation::ConnectorsOAuthAuthorize,
        Operation::EmbedJobsCreate,
        Operation::EmbedJobsList,
        Operation::EmbedJobsGet,
        Operation::EmbedJobsCancel,
        Operation::FinetunedModelsCreate,
        Operation::FinetunedModelsList,
        Operation::FinetunedModelsGet,
        Operation::FinetunedModelsUpdate,
        Operation::FinetunedModelsDelete,
        Operation::FinetuningEvents,
        Operation::FinetuningTrainingStepMetrics,
        Operation::BatchesCreate,
        Operation::BatchesList,
        Operation::BatchesRetrieve,
        Operation::BatchesCancel,
        Operation::ModelsList,
        Operation::ModelsGet,
    ];

    /// Stable dotted name used in logs and the CLI catalog.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Chat => "chat",
            Operation::ChatStream => "chat.stream",
            Operation::ChatV2 => "v2.chat",
            Operation::ChatStreamV2 => "v2.chat.stream",
            Operation::Embed => "embed",
            Operation::EmbedV2 => "v2.embed",
            Operation::Rerank => "rerank",
            Operation::RerankV2 => "v2.rerank",
            Operation::Classify => "classify",
            Operation::Tokenize => "tokenize",
            Operation::Detokenize => "detokenize",
            Operation::Summarize => "summarize",
            Operation::Generate => "generate",
            Operation::GenerateStream => "generate.stream",
            Operation::DatasetsCreate => "datasets.create",
            Operation::DatasetsList => "datasets.list",
            Operation::DatasetsGet => "datasets.get",
            Operation::DatasetsDelete => "datasets.delete",
            Operation::DatasetsUsage => "datasets.usage",
            Operation::ConnectorsCreate => "connectors.create",
            Operation::ConnectorsList => "connectors.list",
            Operation::ConnectorsGet => "connectors.get",
            Operation::ConnectorsUpdate => "connectors.update",
            Operation::ConnectorsDelete => "connectors.delete",
            Operation::ConnectorsOAuthAuthorize => "connectors.oauth.authorize",
            Operation::EmbedJobsCreate => "embed_jobs.create",
            Operation::EmbedJobsList => "embed_jobs.list",
            Operation::EmbedJobsGet => "embed_jobs.get",
            Operation::EmbedJobsCancel => "embed_jobs.cancel",
            Operation::FinetunedModelsCreate => "finetuning.create",
            Operation::FinetunedModelsList => "finetuning.list",
            Operation::FinetunedModelsGet => "finetuning.get",
            Operation::FinetunedModelsUpdate => "finetuning.update",
            Operation::FinetunedModelsDelete => "finetuning.delete",
            Operation::FinetuningEvents => "finetuning.events",
            Operation::FinetuningTrainingStepMetrics => "finetuning.training_step_metrics",
            Operation::BatchesCreate => "batches.create",
            Operation::BatchesList => "batches.list",
            Operation::BatchesRetrieve => "batches.retrieve",
            Operation::BatchesCancel => "batches.cancel",
            Operation::ModelsList => "models.list",
            Operation::ModelsGet => "models.get",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::DatasetsList
            | Operation::DatasetsGet
            | Operation::DatasetsUsage
            | Operation::ConnectorsList
            | Operation::ConnectorsGet
            | Operation::EmbedJobsList
            | Operation::EmbedJobsGet
            | Operation::FinetunedModelsList
            | Operation::FinetunedModelsGet
            | Operation::FinetuningEvents
            | Operation::FinetuningTrainingStepMetrics
            | Operation::BatchesList
            | Operation::BatchesRetrieve
            | Operation::ModelsList
            | Operation::ModelsGet => Method::Get,
            Operation::ConnectorsUpdate | Operation::FinetunedModelsUpdate => Method::Patch,
            Operation::DatasetsDelete
            | Operation::ConnectorsDelete
            | Operation::FinetunedModelsDelete => Method::Delete,
            _ => Method::Post,
        }
    }

    /// Whether the operation answers with an incremental stream.
    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            Operation::ChatStream | Operation::ChatStreamV2 | Operation::GenerateStream
        )
    }

    /// Read-only operations can be repeated and yield equivalent responses.
    pub fn is_read_only(&self) -> bool {
        self.method() == Method::Get
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A file sent as one part of a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The body of a request.
#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FilePart>),
}

impl Payload {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }
}

/// A typed request for one [`Operation`].
pub trait Endpoint {
    type Response: DeserializeOwned + Send + 'static;

    fn operation(&self) -> Operation;

    /// Path relative to the API base URL, starting with `/`.
    fn path(&self) -> String;

    fn query(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        Ok(Vec::new())
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Empty)
    }
}

/// How a streaming response body is cut into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `text/event-stream`: blank-line separated blocks of `event:`/`data:` fields.
    Sse,
    /// One JSON document per line.
    JsonLines,
}

/// One decoded unit of a streaming response.
pub trait StreamChunk: Sized + Send + 'static {
    /// Decode one frame. `Ok(None)` means the frame carries nothing the
    /// caller needs and is skipped.
    fn decode(event: Option<&str>, data: &str) -> Result<Option<Self>, ApiError>;

    /// The chunk that ends the stream.
    fn is_terminal(&self) -> bool;

    fn text_delta(&self) -> Option<&str> {
        None
    }
}

/// An endpoint that can also be opened as a stream.
pub trait Streamable: Endpoint {
    type Chunk: StreamChunk;

    fn stream_operation(&self) -> Operation;

    fn framing(&self) -> Framing;
}

/// A response describing a server-side job that may still be running.
pub trait Pollable {
    /// True once the job has reached a state it will not leave on its own.
    fn is_settled(&self) -> bool;

    /// Human-readable status for progress logs.
    fn status_label(&self) -> String;
}

/// Flatten a serializable request into query pairs, skipping nulls.
///
/// Path parameters must be `#[serde(skip)]` on the request type.
pub fn query_pairs<T: Serialize>(value: &T) -> Result<Vec<(String, String)>, serde_json::Error> {
    let serde_json::Value::Object(map) = serde_json::to_value(value)? else {
        return Ok(Vec::new());
    };
    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) => pairs.push((key, s)),
            serde_json::Value::Array(items) => {
                for item in items {
                    match item {
                        serde_json::Value::String(s) => pairs.push((key.clone(), s)),
                        other => pairs.push((key.clone(), other.to_string())),
                    }
                }
            }
            other => pairs.push((key, other.to_string())),
        }
    }
    Ok(pairs)
}

/// Implement [`Endpoint`] for a request type.
///
/// `json` sends the request itself as the JSON body, `query` flattens it into
/// query parameters.
macro_rules! endpoint {
    ($req:ty => $resp:ty, $op:ident, |$s:ident| $path:expr $(, $extra:ident)*) => {
        impl $crate::operation::Endpoint for $req {
            type Response = $resp;

            fn operation(&self) -> $crate::operation::Operation {
                $crate::operation::Operation::$op
            }

            fn path(&self) -> String {
                let $s = self;
                $path
            }

            $(endpoint!(@$extra);)*
        }
    };
    (@json) => {
        fn payload(&self) -> Result<$crate::operation::Payload, serde_json::Error> {
            $crate::operation::Payload::json(self)
        }
    };
    (@query) => {
        fn query(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
            $crate::operation::query_pairs(self)
        }
    };
}
