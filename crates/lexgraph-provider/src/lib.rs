//! Lexgraph Provider Layer
//!
//! Pluggable implementations of the `ExtractionProvider` trait from
//! `lexgraph-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: deterministic canned responses for testing
//! - `OllamaProvider`: local Ollama API integration
//!
//! Both funnel backend output through the same boundary parser
//! ([`parser::parse_provider_response`]) so the rest of the engine only ever
//! sees validated, typed `RawExtraction` values - malformed model output is a
//! typed `ProviderError::MalformedOutput`, not a runtime surprise.
//!
//! # Examples
//!
//! ```
//! use lexgraph_provider::MockProvider;
//! use lexgraph_domain::traits::ExtractionProvider;
//! use lexgraph_domain::{RawExtraction, WindowRequest};
//!
//! let provider = MockProvider::new(vec![RawExtraction::new(
//!     "FINANCIAL_TERMS", "rent: $900", 0, 0, 10,
//! )]);
//! let request = WindowRequest {
//!     window_id: 0,
//!     text: "rent: $900".to_string(),
//!     prompt: String::new(),
//!     examples: Vec::new(),
//!     model_id: "test".to_string(),
//!     temperature: 0.0,
//! };
//! let spans = provider.invoke(&request).unwrap();
//! assert_eq!(spans.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod parser;
pub mod prompt;

use lexgraph_domain::traits::ExtractionProvider;
use lexgraph_domain::{ProviderError, RawExtraction, WindowRequest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub use ollama::OllamaProvider;

/// Mock extraction provider for deterministic testing
///
/// Returns pre-configured raw extractions keyed by window text, without any
/// network calls. Window ids on returned spans are rewritten to the request's
/// window id so canned responses can be shared across windows.
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: Vec<RawExtraction>,
    responses: Arc<Mutex<HashMap<String, Vec<RawExtraction>>>>,
    failures: Arc<Mutex<HashMap<String, ProviderError>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a provider returning the same extractions for every window
    pub fn new(default_response: Vec<RawExtraction>) -> Self {
        Self {
            default_response,
            responses: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a provider that extracts nothing
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Add a specific response for a given window text
    pub fn add_response(&mut self, window_text: impl Into<String>, response: Vec<RawExtraction>) {
        self.responses
            .lock()
            .unwrap()
            .insert(window_text.into(), response);
    }

    /// Configure a failure for a given window text
    pub fn add_failure(&mut self, window_text: impl Into<String>, error: ProviderError) {
        self.failures
            .lock()
            .unwrap()
            .insert(window_text.into(), error);
    }

    /// Get the number of times invoke was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::empty()
    }
}

impl ExtractionProvider for MockProvider {
    fn invoke(&self, request: &WindowRequest) -> Result<Vec<RawExtraction>, ProviderError> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(err) = self.failures.lock().unwrap().get(&request.text) {
            return Err(err.clone());
        }

        let responses = self.responses.lock().unwrap();
        let spans = responses
            .get(&request.text)
            .unwrap_or(&self.default_response);

        Ok(spans
            .iter()
            .cloned()
            .map(|mut e| {
                e.source_window_id = request.window_id;
                e
            })
            .collect())
    }
}
