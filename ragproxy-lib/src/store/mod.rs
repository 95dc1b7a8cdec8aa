//! Vector storage backends
//!
//! Only an in-memory, brute-force store exists today. Any replacement (an ANN
//! index, a database) must reproduce its ranking: cosine similarity, highest
//! score first, ties broken by insertion order.
//!
//! # Storage Model
//!
//! Each stored item is a [`DocumentRecord`]:
//! - the original document text
//! - its embedding vector
//!
//! Every record in a store has the same dimension. The first insert fixes it
//! unless the store was created with an explicit one.
//!
//! # Usage
//!
//! ```ignore
//! use ragproxy_lib::store::{VectorStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//!
//! // Insert documents with their embeddings
//! store.insert(&["Paris is the capital of France"], &embeddings)?;
//!
//! // Search by vector similarity
//! let texts = store.search(&query_embedding, 5)?;
//! ```

use std::cmp::Ordering;

use crate::embed::Embedding;
use crate::Result;

/// Number of documents retrieved when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// A stored document and its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    text: String,
    embedding: Embedding,
}

impl DocumentRecord {
    pub(crate) fn new(text: String, embedding: Embedding) -> Self {
        Self { text, embedding }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }
}

/// A search result with similarity score
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document text
    pub text: String,
    /// Cosine similarity to the query, -1.0 to 1.0 (higher is more similar)
    pub score: f32,
    /// Insertion index of the matched document
    pub position: usize,
}

impl Ord for SearchResult {
    /// Orders by score, then by *reverse* insertion position, so that of two
    /// equally scored results the earlier-inserted one is the greater.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Equality is ranking equality: same score and same position. `text` is
/// not compared.
impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchResult {}

/// Trait for vector storage backends
///
/// All methods take `&self`; implementations synchronize internally so a
/// store can be shared between an ingestion path and concurrent queries.
pub trait VectorStore: Send + Sync {
    /// Insert documents with their embeddings
    ///
    /// # Arguments
    /// * `documents` - The texts to store
    /// * `embeddings` - Corresponding embeddings (must be same length)
    ///
    /// The batch is validated as a whole; on error nothing is stored.
    fn insert(&self, documents: &[&str], embeddings: &[Embedding]) -> Result<()>;

    /// Append a single document
    fn add(&self, document: &str, embedding: &[f32]) -> Result<()> {
        self.insert(&[document], &[embedding.to_vec()])
    }

    /// Search for similar documents, keeping scores
    ///
    /// # Returns
    /// At most `top_k` results sorted by similarity (highest first)
    fn search_scored(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Search for similar documents
    ///
    /// # Returns
    /// At most `top_k` document texts sorted by similarity (highest first)
    fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<String>> {
        Ok(self
            .search_scored(query_embedding, top_k)?
            .into_iter()
            .map(|r| r.text)
            .collect())
    }

    /// Dimension of the stored vectors, if one has been established
    fn dimension(&self) -> Option<usize>;

    /// Get total number of stored documents
    fn len(&self) -> usize;

    /// Check if store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all stored data
    fn clear(&self);
}

mod memory;

pub use memory::*;
