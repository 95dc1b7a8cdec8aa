//! Text embedding using local models
//!
//! The default provider runs the BAAI BGE family via the fastembed crate
//! (ONNX runtime). Any other model can be plugged in through [`Embedder`].
//!
//! # Model Details
//!
//! | Variant | Dimensions | Max tokens |
//! |---------|------------|------------|
//! | `bge-small` | 384 | 512 |
//! | `bge-base` | 768 | 512 |
//! | `bge-large` | 1024 | 512 |
//!
//! # Usage
//!
//! ```ignore
//! use ragproxy_lib::embed::{BgeEmbedder, BgeModel, Embedder};
//!
//! let embedder = BgeEmbedder::new(BgeModel::Base)?;
//!
//! // Embed documents (for indexing)
//! let doc_embeddings = embedder.embed_documents(&["Paris is the capital of France"])?;
//!
//! // Embed query (for searching)
//! let query_embedding = embedder.embed_query("What is the capital of France?")?;
//! ```

use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
///
/// Methods take `&self` so a single embedder can serve concurrent queries;
/// implementations that wrap a stateful model are expected to lock internally.
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for indexing
    ///
    /// Returns one embedding per input text, in input order.
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    ///
    /// Note: Some models (like BGE) use different prompts for queries vs documents.
    /// This method handles that distinction.
    fn embed_query(&self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

mod bge;
pub use bge::*;
