//! Configuration for the ingest routine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Configuration for the ingest routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Which provider to embed with.
    pub provider: ProviderKind,

    /// Model override (provider-specific).
    pub model: Option<String>,

    /// Local model settings.
    pub minilm: MiniLmConfig,

    /// OpenAI settings.
    pub openai: OpenAIConfig,
}

impl IngestConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading ingest config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    /// Set the model override.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            minilm: MiniLmConfig::default(),
            openai: OpenAIConfig::default(),
        }
    }
}

/// Type of embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Local all-MiniLM-L6-v2.
    #[serde(rename = "minilm")]
    MiniLm,
    /// OpenAI embeddings API.
    #[serde(rename = "openai")]
    OpenAI,
}

impl Default for ProviderKind {
    /// The local model when it is compiled in, otherwise OpenAI.
    fn default() -> Self {
        if cfg!(feature = "onnx") {
            ProviderKind::MiniLm
        } else {
            ProviderKind::OpenAI
        }
    }
}

/// Settings for the local model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniLmConfig {
    /// Where model files are cached.
    pub cache_dir: PathBuf,

    /// Show a progress bar while downloading.
    pub show_download_progress: bool,

    /// Maximum tokens per input.
    pub max_length: usize,
}

impl Default for MiniLmConfig {
    fn default() -> Self {
        Self {
            cache_dir: dirs::cache_dir().unwrap_or_default().join("textvec/models"),
            show_download_progress: false,
            max_length: 256,
        }
    }
}

/// Settings for the OpenAI provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    /// API base URL.
    pub base_url: String,

    /// API key. Takes precedence over `api_key_env`.
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: textvec_embeddings::provider::OPENAI_BASE_URL.to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}
