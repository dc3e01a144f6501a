//! Error types for the ingest routine.

use thiserror::Error;

/// Result type alias for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur while ingesting texts.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Embedding a text (or adding it to the store) failed.
    #[error("embedding error: {0}")]
    Embedding(#[from] textvec_embeddings::EmbeddingError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
