//! TOML configuration
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! [retrieval]
//! top_k = 5
//!
//! [embedding]
//! model = "bge-base"        # bge-small | bge-base | bge-large
//! show_download_progress = true
//!
//! [generation]
//! base_url = "http://localhost:11434"
//! model = "llama3.2"
//! max_length = 50
//! timeout_secs = 120
//! include_prompt = true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::embed::BgeModel;
use crate::generate::OllamaConfig;
use crate::rag::{DEFAULT_MAX_LENGTH, PipelineConfig};
use crate::store::DEFAULT_TOP_K;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfig {
    pub model: BgeModel,
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: BgeModel::default(),
            show_download_progress: true,
        }
    }
}

/// `[generation]` section: the length budget plus the Ollama connection.
///
/// The connection fields are spelled out rather than flattened from
/// [`OllamaConfig`] so that unknown keys are still rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub max_length: usize,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub include_prompt: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let OllamaConfig {
            base_url,
            model,
            timeout_secs,
            include_prompt,
        } = OllamaConfig::default();

        Self {
            max_length: DEFAULT_MAX_LENGTH,
            base_url,
            model,
            timeout_secs,
            include_prompt,
        }
    }
}

impl GenerationConfig {
    /// Connection settings for [`OllamaGenerator`](crate::generate::OllamaGenerator).
    #[must_use]
    pub fn ollama(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            include_prompt: self.include_prompt,
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Per-query settings for [`RagPipeline`](crate::rag::RagPipeline).
    #[must_use]
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            top_k: self.retrieval.top_k,
            max_length: self.generation.max_length,
        }
    }
}
