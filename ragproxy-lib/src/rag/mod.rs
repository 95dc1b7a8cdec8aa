//! Retrieval-augmented query pipeline
//!
//! Combines an embedder, a vector store and a generator into one call:
//!
//! ```text
//! query -> embed_query -> store.search(top_k) -> context -> prompt -> generate -> answer
//! ```
//!
//! Stages run strictly in that order and each runs exactly once. The first
//! failing stage aborts the query and its error is returned unchanged; there
//! are no retries and no partial answers.
//!
//! # Usage
//!
//! ```ignore
//! use ragproxy_lib::rag::RagPipeline;
//!
//! let pipeline = RagPipeline::new(embedder, MemoryStore::new(), generator);
//! pipeline.index(&["Paris is the capital of France"])?;
//! let answer = pipeline.process_query("What is the capital of France?")?;
//! ```

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::embed::Embedder;
use crate::generate::Generator;
use crate::store::{DEFAULT_TOP_K, SearchResult, VectorStore};
use crate::{Error, Result};

/// Length budget handed to the generator when none is configured.
pub const DEFAULT_MAX_LENGTH: usize = 50;

/// Per-query knobs of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of documents retrieved as context
    pub top_k: usize,
    /// Length budget passed to the generator
    pub max_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

/// Join retrieved documents into the context block, preserving rank order.
#[must_use]
pub fn assemble_context(documents: &[String]) -> String {
    documents.join("\n")
}

/// Fill the fixed prompt template.
#[must_use]
pub fn build_prompt(context: &str, query: &str) -> String {
    format!("Context: {context}\n\nQuery: {query}\nAnswer:")
}

/// Query pipeline over an embedder, a store and a generator.
///
/// Every method takes `&self`: share the pipeline in an `Arc` to serve
/// concurrent queries while another thread keeps indexing.
pub struct RagPipeline<E: Embedder, S: VectorStore, G: Generator> {
    embedder: E,
    store: S,
    generator: G,
    config: PipelineConfig,
}

impl<E: Embedder, S: VectorStore, G: Generator> RagPipeline<E, S, G> {
    /// Create a pipeline with the default configuration.
    #[must_use]
    pub fn new(embedder: E, store: S, generator: G) -> Self {
        Self {
            embedder,
            store,
            generator,
            config: PipelineConfig::default(),
        }
    }

    /// Replace the pipeline configuration.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Embed `documents` and add them to the store.
    ///
    /// The batch is stored atomically: if the embedder or the store rejects
    /// it, nothing is added. Returns the number of documents stored.
    pub fn index(&self, documents: &[&str]) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        let embeddings = self.embedder.embed_documents(documents)?;
        self.store.insert(documents, &embeddings)?;

        info!(
            count = documents.len(),
            total = self.store.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "indexed documents"
        );
        Ok(documents.len())
    }

    /// Retrieve the `top_k` documents closest to `query`, with scores.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed_query(query)?;
        self.store.search_scored(&query_embedding, top_k)
    }

    /// Answer `query` from the indexed documents.
    pub fn process_query(&self, query: &str) -> Result<String> {
        self.run(query, None)
    }

    /// Like [`process_query`](Self::process_query), but stops with
    /// [`Error::Cancelled`] if `cancel` has fired when the next stage (embed,
    /// search, generate) is about to start. A provider call already in flight
    /// is not interrupted, and a finished answer is always returned.
    pub fn process_query_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.run(query, Some(cancel))
    }

    fn run(&self, query: &str, cancel: Option<&CancellationToken>) -> Result<String> {
        let checkpoint = |stage: &str| -> Result<()> {
            match cancel {
                Some(token) if token.is_cancelled() => {
                    warn!(stage, "query cancelled");
                    Err(Error::Cancelled)
                }
                _ => Ok(()),
            }
        };

        checkpoint("embed")?;
        let started = Instant::now();
        let query_embedding = self.embedder.embed_query(query)?;
        debug!(
            dimension = query_embedding.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "embedded query"
        );

        checkpoint("search")?;
        let relevant_docs = self.store.search(&query_embedding, self.config.top_k)?;
        debug!(
            retrieved = relevant_docs.len(),
            top_k = self.config.top_k,
            "retrieved context"
        );

        checkpoint("generate")?;
        let context = assemble_context(&relevant_docs);
        let prompt = build_prompt(&context, query);

        let started = Instant::now();
        let answer = self.generator.generate(&prompt, self.config.max_length)?;
        debug!(
            prompt_len = prompt.len(),
            answer_len = answer.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated answer"
        );

        Ok(answer)
    }

    /// Returns the number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no documents are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Returns a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the generator.
    #[must_use]
    pub fn generator(&self) -> &G {
        &self.generator
    }
}
