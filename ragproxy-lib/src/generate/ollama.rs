use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generate::Generator;
use crate::{Error, Result};

/// Connection settings for an Ollama server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the server, without the `/api` suffix
    pub base_url: String,
    /// Model tag to generate with
    pub model: String,
    /// Whole-request timeout; local models can be slow
    pub timeout_secs: u64,
    /// Return `prompt + completion` instead of the completion alone
    pub include_prompt: bool,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_secs: 120,
            include_prompt: true,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: usize,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Generator backed by Ollama's `/api/generate` endpoint.
///
/// Uses a blocking HTTP client; callers running inside an async runtime
/// should move calls onto a blocking thread.
pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    config: OllamaConfig,
}

impl OllamaGenerator {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Generation(format!("failed to create HTTP client: {e}")))?;

        let endpoint = format!("{}/api/generate", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }
}

impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn generate(&self, prompt: &str, max_length: usize) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: max_length,
            },
        };

        debug!(
            endpoint = %self.endpoint,
            model = %self.config.model,
            max_length,
            "requesting generation"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| Error::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Generation(format!("ollama returned {status}: {body}")));
        }

        let GenerateResponse { response: completion } = response
            .json()
            .map_err(|e| Error::Generation(format!("malformed ollama response: {e}")))?;

        if self.config.include_prompt {
            Ok(format!("{prompt}{completion}"))
        } else {
            Ok(completion)
        }
    }
}
