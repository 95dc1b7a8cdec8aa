use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// Instruction BGE models expect in front of retrieval queries.
const QUERY_INSTRUCTION: &str = "Represent this sentence for searching relevant passages: ";

/// Which member of the BGE English v1.5 family to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BgeModel {
    #[serde(rename = "bge-small")]
    Small,
    #[default]
    #[serde(rename = "bge-base")]
    Base,
    #[serde(rename = "bge-large")]
    Large,
}

impl BgeModel {
    /// Hugging Face identifier of the model.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Small => "BAAI/bge-small-en-v1.5",
            Self::Base => "BAAI/bge-base-en-v1.5",
            Self::Large => "BAAI/bge-large-en-v1.5",
        }
    }

    /// Length of the vectors this model produces.
    #[must_use]
    pub fn dimension(self) -> usize {
        match self {
            Self::Small => 384,
            Self::Base => 768,
            Self::Large => 1024,
        }
    }

    fn fastembed_model(self) -> EmbeddingModel {
        match self {
            Self::Small => EmbeddingModel::BGESmallENV15,
            Self::Base => EmbeddingModel::BGEBaseENV15,
            Self::Large => EmbeddingModel::BGELargeENV15,
        }
    }
}

/// BGE embedder backed by fastembed.
///
/// The ONNX session is not shareable across threads, so it sits behind a
/// mutex; concurrent callers are serialized at the model.
pub struct BgeEmbedder {
    model: Mutex<TextEmbedding>,
    variant: BgeModel,
}

impl BgeEmbedder {
    /// Create a new BGE embedder.
    ///
    /// Downloads the model on first use (~130MB for small, ~1.2GB for large).
    pub fn new(variant: BgeModel) -> Result<Self> {
        Self::with_progress(variant, true)
    }

    /// Create a new BGE embedder, choosing whether to render download progress.
    pub fn with_progress(variant: BgeModel, show_download_progress: bool) -> Result<Self> {
        let opts = InitOptions::new(variant.fastembed_model())
            .with_show_download_progress(show_download_progress);

        TextEmbedding::try_new(opts)
            .map(|model| Self {
                model: Mutex::new(model),
                variant,
            })
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

impl Embedder for BgeEmbedder {
    fn model_name(&self) -> &str {
        self.variant.name()
    }

    fn dimension(&self) -> usize {
        self.variant.dimension()
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        debug!(count = texts.len(), model = self.model_name(), "embedding documents");
        self.model
            .lock()
            .embed(texts, None)
            .map_err(|e| Error::Embedding(e.to_string()))
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        let query_text = format!("{QUERY_INSTRUCTION}{text}");

        self.model
            .lock()
            .embed(vec![query_text], None)
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))
    }
}
