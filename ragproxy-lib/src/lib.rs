//! ragproxy - retrieval-augmented generation over an in-memory vector index
//!
//! # Architecture
//!
//! ```text
//! Documents -> Embedder -> Store
//!                            |
//! Query -> Embedder -> Search <-+
//!                        |
//!                     Context -> Prompt -> Generator -> Answer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ragproxy_lib::{
//!     embed::{BgeEmbedder, BgeModel},
//!     generate::{OllamaConfig, OllamaGenerator},
//!     rag::RagPipeline,
//!     store::MemoryStore,
//! };
//!
//! let pipeline = RagPipeline::new(
//!     BgeEmbedder::new(BgeModel::Base)?,
//!     MemoryStore::new(),
//!     OllamaGenerator::new(OllamaConfig::default())?,
//! );
//!
//! // Index documents
//! pipeline.index(&["Paris is the capital of France"])?;
//!
//! // Ask
//! let answer = pipeline.process_query("What is the capital of France?")?;
//! ```

pub mod config;
pub mod embed;
pub mod error;
pub mod generate;
pub mod rag;
pub mod store;

pub use error::{Error, Result};
