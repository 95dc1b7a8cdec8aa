//! Text generation providers
//!
//! A generator turns a fully assembled prompt into text. The pipeline treats
//! it as opaque: whatever it returns is handed back to the caller verbatim.
//!
//! # Usage
//!
//! ```ignore
//! use ragproxy_lib::generate::{Generator, OllamaGenerator, OllamaConfig};
//!
//! let generator = OllamaGenerator::new(OllamaConfig::default())?;
//! let text = generator.generate("The future of AI is", 50)?;
//! ```

use crate::Result;

/// Trait for text generation models
pub trait Generator: Send + Sync {
    /// Generate a continuation of `prompt`.
    ///
    /// `max_length` is the provider's length budget (tokens for Ollama). It is
    /// an upper bound the provider is expected, not guaranteed, to respect.
    fn generate(&self, prompt: &str, max_length: usize) -> Result<String>;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

mod ollama;
pub use ollama::*;
