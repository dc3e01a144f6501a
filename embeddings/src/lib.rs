//! # Embeddings
//!
//! This crate provides the building blocks for turning text into vectors and
//! keeping those vectors around for similarity search.
//!
//! ## Features
//!
//! - **Text Segments**: Immutable text units with optional metadata
//! - **Embedding Providers**: Local all-MiniLM-L6-v2 (feature `onnx`) and OpenAI
//! - **In-Memory Store**: Insertion-ordered vector store with relevance search
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  TextSegment ──► EmbeddingProvider ──► InMemoryEmbeddingStore   │
//! │                        │                        │               │
//! │                        ▼                        ▼               │
//! │               AllMiniLmL6V2/OpenAI      cosine relevance search │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
#[cfg(feature = "onnx")]
pub mod minilm;
pub mod provider;
pub mod segment;
pub mod similarity;
pub mod store;

pub use error::{EmbeddingError, Result};
#[cfg(feature = "onnx")]
pub use minilm::{AllMiniLmL6V2, MiniLmOptions};
pub use provider::{EmbeddingProvider, EmbeddingResponse, OpenAIProvider};
pub use segment::TextSegment;
pub use similarity::{cosine_similarity, relevance_score};
pub use store::{EmbeddingMatch, InMemoryEmbeddingStore, SearchRequest, StoredEntry};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Name of the local sentence-transformer model.
pub const MINILM_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Dimension of all-MiniLM-L6-v2 embeddings.
pub const MINILM_DIMENSION: usize = 384;
