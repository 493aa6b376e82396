//! Ollama Provider Implementation
//!
//! Runs extraction against a local Ollama instance. The model receives the
//! assembled prompt (instructions + worked examples + window text) and its
//! text response is parsed at the boundary into typed `RawExtraction`s.
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama API
//! - Configurable endpoint, per-request model and temperature
//! - Retry with exponential backoff for transport errors
//! - Rate-limit and malformed-output surfaced as typed errors
//!
//! # Examples
//!
//! ```no_run
//! use lexgraph_provider::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434");
//! ```

use crate::parser::parse_provider_response;
use crate::prompt::PromptBuilder;
use lexgraph_domain::traits::ExtractionProvider;
use lexgraph_domain::{ProviderError, RawExtraction, WindowRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for one HTTP call (45 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Default number of attempts per window call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama API provider for local model inference
pub struct OllamaProvider {
    endpoint: String,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for the Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from the Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("default reqwest client");

        Self {
            endpoint: endpoint.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create a provider pointed at the default local endpoint
    pub fn local() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }

    /// Set the maximum number of attempts per call
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Run extraction for one window against the Ollama API
    ///
    /// # Errors
    ///
    /// - `ProviderError::Unavailable` when Ollama cannot be reached, the
    ///   model is missing, or retries are exhausted
    /// - `ProviderError::RateLimited` on HTTP 429
    /// - `ProviderError::MalformedOutput` when the model's text does not
    ///   parse as an extraction array
    pub async fn extract_window(
        &self,
        request: &WindowRequest,
    ) -> Result<Vec<RawExtraction>, ProviderError> {
        let url = format!("{}/api/generate", self.endpoint);
        let prompt =
            PromptBuilder::new(&request.text, &request.prompt, &request.examples).build();

        debug!(
            "Ollama window {} prompt length {} chars",
            request.window_id,
            prompt.len()
        );

        let body = OllamaGenerateRequest {
            model: request.model_id.clone(),
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
            },
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed: OllamaGenerateResponse =
                            response.json().await.map_err(|e| {
                                ProviderError::MalformedOutput(format!(
                                    "Failed to decode API envelope: {}",
                                    e
                                ))
                            })?;
                        return parse_provider_response(&parsed.response, request.window_id);
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(ProviderError::RateLimited);
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ProviderError::Unavailable(format!(
                            "Model not available: {}",
                            request.model_id
                        )));
                    } else {
                        let text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error =
                            Some(ProviderError::Unavailable(format!("HTTP {}: {}", status, text)));
                    }
                }
                Err(e) => {
                    last_error =
                        Some(ProviderError::Unavailable(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, ...
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!(
                    "Ollama window {} attempt {} failed, retrying in {:?}",
                    request.window_id, attempts, delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::Unavailable("Max retries exceeded".to_string())))
    }
}

impl ExtractionProvider for OllamaProvider {
    fn invoke(&self, request: &WindowRequest) -> Result<Vec<RawExtraction>, ProviderError> {
        // Blocking wrapper; the extractor calls this from a blocking pool
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Runtime error: {}", e)))?
            .block_on(async { self.extract_window(request).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> WindowRequest {
        WindowRequest {
            window_id: 0,
            text: "test".to_string(),
            prompt: "extract".to_string(),
            examples: Vec::new(),
            model_id: "llama2".to_string(),
            temperature: 0.1,
        }
    }

    #[test]
    fn test_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_local_uses_default_endpoint() {
        let provider = OllamaProvider::local();
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_with_max_retries() {
        let provider = OllamaProvider::local().with_max_retries(1);
        assert_eq!(provider.max_retries, 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let provider = OllamaProvider::new("http://localhost:1").with_max_retries(1);

        let result = provider.extract_window(&request()).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }

    // Integration test (requires running Ollama)
    #[tokio::test]
    #[ignore] // Only run when Ollama is available
    async fn test_extract_window_integration() {
        let provider = OllamaProvider::local();
        let result = provider.extract_window(&request()).await;

        if let Ok(spans) = result {
            for span in spans {
                assert!(span.validate().is_ok());
            }
        }
    }
}
