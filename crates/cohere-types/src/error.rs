//! Error hierarchy for the snippets workspace.

use thiserror::Error;

/// Top-level error type for snippet programs.
#[derive(Debug, Error)]
pub enum SnippetError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a call to the hosted API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Request rejected: {status} {message}")]
    Rejected { status: u16, message: String },

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to serialize request: {0}")]
    Serialize(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Stream parse error: {0}")]
    StreamParse(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse classification of an [`ApiError`].
///
/// End of stream is not an error and has no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never completed: connection refused, reset, or timed out.
    Transport,
    /// Missing, malformed or rejected credential.
    Auth,
    /// The API refused the request as sent.
    RequestRejected,
    /// The API failed or returned something undecodable.
    Server,
    /// An open stream broke before its end.
    StreamInterrupted,
    /// The caller cancelled the call.
    Cancelled,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) | ApiError::Timeout => ErrorKind::Transport,
            ApiError::Auth { .. } => ErrorKind::Auth,
            ApiError::BadRequest { .. }
            | ApiError::NotFound { .. }
            | ApiError::RateLimited { .. }
            | ApiError::Rejected { .. }
            | ApiError::Serialize(_) => ErrorKind::RequestRejected,
            ApiError::Server { .. } | ApiError::Decode(_) => ErrorKind::Server,
            ApiError::StreamInterrupted(_) | ApiError::StreamParse(_) => {
                ErrorKind::StreamInterrupted
            }
            ApiError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Serialize(e.to_string())
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
