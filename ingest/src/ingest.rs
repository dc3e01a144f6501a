//! The ingest routine: embed each text and add it to a vector store.

use tracing::{debug, info, warn};

use textvec_embeddings::{
    EmbeddingProvider, InMemoryEmbeddingStore, MINILM_MODEL_NAME, OpenAIProvider, TextSegment,
};

use crate::config::{IngestConfig, ProviderKind};
use crate::error::{IngestError, Result};

/// What an ingest run hands back: the populated store, the model that filled
/// it, and the texts it was given.
#[derive(Debug)]
pub struct IngestRecord<M> {
    /// Store holding one entry per input text, in input order.
    pub store: InMemoryEmbeddingStore<TextSegment>,

    /// The provider instance used for every embedding.
    pub model: M,

    /// The input texts, unchanged.
    pub texts: Vec<String>,
}

/// Embed `texts` in order and add each `(embedding, segment)` pair to `store`.
///
/// Returns the number of entries added. The first failure is returned as-is
/// and stops the loop; entries added before it remain in `store`.
pub async fn ingest_into<M>(
    model: &M,
    store: &mut InMemoryEmbeddingStore<TextSegment>,
    texts: &[String],
) -> Result<usize>
where
    M: EmbeddingProvider + ?Sized,
{
    info!(
        "Ingesting {} texts with {}/{}",
        texts.len(),
        model.name(),
        model.model_name()
    );

    for (index, text) in texts.iter().enumerate() {
        match add_text(model, store, text).await {
            Ok(id) => debug!("Stored text {index} as {id}"),
            Err(err) => {
                warn!("Ingest failed at text {index}: {err}");
                return Err(err);
            }
        }
    }

    info!("Ingested {} texts", texts.len());
    Ok(texts.len())
}

async fn add_text<M>(
    model: &M,
    store: &mut InMemoryEmbeddingStore<TextSegment>,
    text: &str,
) -> Result<String>
where
    M: EmbeddingProvider + ?Sized,
{
    let segment = TextSegment::new(text);
    let response = model.embed(&segment).await?;
    Ok(store.add(response.embedding, segment)?)
}

/// Embed `texts` with `model` into a fresh store.
pub async fn ingest<M>(model: M, texts: Vec<String>) -> Result<IngestRecord<M>>
where
    M: EmbeddingProvider,
{
    let mut store = InMemoryEmbeddingStore::new();
    ingest_into(&model, &mut store, &texts).await?;

    Ok(IngestRecord {
        store,
        model,
        texts,
    })
}

/// Embed `texts` with a freshly loaded all-MiniLM-L6-v2 model.
///
/// A new model and a new store are created on every call.
#[cfg(feature = "onnx")]
pub async fn embed(texts: Vec<String>) -> Result<IngestRecord<textvec_embeddings::AllMiniLmL6V2>> {
    let model = textvec_embeddings::AllMiniLmL6V2::new()?;
    ingest(model, texts).await
}

/// Embed `texts` with the provider selected by `config`.
pub async fn embed_with_config(
    config: &IngestConfig,
    texts: Vec<String>,
) -> Result<IngestRecord<Box<dyn EmbeddingProvider>>> {
    let model = build_provider(config)?;
    ingest(model, texts).await
}

/// Construct the provider described by `config`.
pub fn build_provider(config: &IngestConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider {
        ProviderKind::MiniLm => {
            if let Some(model) = config.model.as_deref().filter(|m| *m != MINILM_MODEL_NAME) {
                return Err(IngestError::Config(format!("unsupported local model: {model}")));
            }
            build_minilm(config)
        }
        ProviderKind::OpenAI => {
            let mut provider = OpenAIProvider::from_env(&config.openai.api_key_env)
                .with_base_url(&config.openai.base_url);
            if let Some(key) = &config.openai.api_key {
                provider = provider.with_api_key(key);
            }
            if let Some(model) = &config.model {
                provider = provider.with_model(model);
            }
            if !provider.is_available() {
                let var = &config.openai.api_key_env;
                return Err(IngestError::Config(format!("{var} is not set")));
            }
            Ok(Box::new(provider))
        }
    }
}

#[cfg(feature = "onnx")]
fn build_minilm(config: &IngestConfig) -> Result<Box<dyn EmbeddingProvider>> {
    use textvec_embeddings::{AllMiniLmL6V2, MiniLmOptions};

    let options = MiniLmOptions {
        cache_dir: Some(config.minilm.cache_dir.clone()),
        show_download_progress: config.minilm.show_download_progress,
        max_length: config.minilm.max_length,
    };
    Ok(Box::new(AllMiniLmL6V2::with_options(options)?))
}

#[cfg(not(feature = "onnx"))]
fn build_minilm(_config: &IngestConfig) -> Result<Box<dyn EmbeddingProvider>> {
    Err(IngestError::Config("local model support requires the `onnx` feature".to_string()))
}
