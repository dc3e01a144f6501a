//! Local all-MiniLM-L6-v2 sentence embeddings via ONNX Runtime.

use std::path::PathBuf;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

use crate::{MINILM_DIMENSION, MINILM_MODEL_NAME};
use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingResponse};
use crate::segment::TextSegment;

/// Options for loading the local model.
#[derive(Debug, Clone)]
pub struct MiniLmOptions {
    /// Where model files are downloaded to and loaded from.
    pub cache_dir: Option<PathBuf>,

    /// Show a progress bar while downloading model files.
    pub show_download_progress: bool,

    /// Maximum number of tokens per input; longer inputs are truncated.
    pub max_length: usize,
}

impl Default for MiniLmOptions {
    fn default() -> Self {
        Self {
            cache_dir: None,
            show_download_progress: false,
            max_length: 256,
        }
    }
}

/// The all-MiniLM-L6-v2 sentence-transformer, run in-process.
///
/// Embedding blocks the calling thread for the duration of inference.
pub struct AllMiniLmL6V2 {
    model: TextEmbedding,
}

impl AllMiniLmL6V2 {
    pub const MODEL_NAME: &'static str = MINILM_MODEL_NAME;

    /// Load the model with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(MiniLmOptions::default())
    }

    /// Load the model, downloading its files on first use.
    pub fn with_options(options: MiniLmOptions) -> Result<Self> {
        let mut init = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(options.show_download_progress)
            .with_max_length(options.max_length);
        if let Some(dir) = options.cache_dir {
            init = init.with_cache_dir(dir);
        }

        let model =
            TextEmbedding::try_new(init).map_err(|e| EmbeddingError::Model(format!("{e:#}")))?;
        info!("Loaded {} embedding model", Self::MODEL_NAME);

        Ok(Self { model })
    }
}

#[async_trait]
impl EmbeddingProvider for AllMiniLmL6V2 {
    fn name(&self) -> &str {
        "local"
    }

    fn model_name(&self) -> &str {
        Self::MODEL_NAME
    }

    fn dimension(&self) -> usize {
        MINILM_DIMENSION
    }

    async fn embed(&self, segment: &TextSegment) -> Result<EmbeddingResponse> {
        debug!("Embedding {} bytes locally", segment.text().len());

        let embedding = self
            .model
            .embed(vec![segment.text()], None)
            .map_err(|e| EmbeddingError::Model(format!("{e:#}")))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbeddingError::InvalidResponse("model returned no embedding".to_string())
            })?;

        if embedding.len() != MINILM_DIMENSION {
            return Err(EmbeddingError::DimensionMismatch {
                expected: MINILM_DIMENSION,
                actual: embedding.len(),
            });
        }

        Ok(EmbeddingResponse::new(embedding, Self::MODEL_NAME))
    }

    fn is_available(&self) -> bool {
        true
    }
}
