//! Error types for caresense-core

use thiserror::Error;

/// Main error type for the caresense-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing credentials, bad config file)
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM call error (transport failure, non-success status, timeout)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Input validation failure, surfaced inline before any call is made
    #[error("{0}")]
    Validation(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for caresense-core
pub type Result<T> = std::result::Result<T, Error>;
