//! # Ingest
//!
//! Embeds a list of texts, one at a time and in order, and stores each
//! vector next to its source text in a fresh in-memory vector store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use textvec_ingest::embed;
//!
//! let record = embed(vec!["hello world".into(), "goodbye".into()]).await?;
//! assert_eq!(record.store.len(), 2);
//! assert_eq!(record.texts, ["hello world", "goodbye"]);
//! ```
//!
//! `embed` needs the `onnx` feature. Without it, pick a provider through
//! [`IngestConfig`] and call [`embed_with_config`], or hand any
//! [`EmbeddingProvider`] to [`ingest`].

pub mod config;
pub mod error;
pub mod ingest;

pub use config::{IngestConfig, MiniLmConfig, OpenAIConfig, ProviderKind};
pub use error::{IngestError, Result};
#[cfg(feature = "onnx")]
pub use ingest::embed;
pub use ingest::{IngestRecord, build_provider, embed_with_config, ingest, ingest_into};

// Re-export from dependencies for convenience
pub use textvec_embeddings::{EmbeddingProvider, InMemoryEmbeddingStore, TextSegment};
