//! Configuration for the extractor

use lexgraph_domain::{DocumentType, WorkedExample};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-document-type extraction configuration
///
/// Immutable once registered. One of these exists per document type the
/// registry knows about, plus the generic fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Document type this configuration applies to
    pub document_type: DocumentType,

    /// Instruction prompt sent to the provider with every window
    pub prompt_text: String,

    /// Few-shot worked examples, in order
    pub worked_examples: Vec<WorkedExample>,

    /// Model the provider should run
    pub model_id: String,

    /// Window size in chars
    pub chunk_size: usize,

    /// Extraction passes over the window set
    pub pass_count: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Concurrent provider calls within one job
    pub max_parallel_windows: usize,
}

impl ExtractionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.pass_count == 0 {
            return Err("pass_count must be greater than 0".to_string());
        }
        if self.max_parallel_windows == 0 {
            return Err("max_parallel_windows must be greater than 0".to_string());
        }
        if self.model_id.is_empty() {
            return Err("model_id must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature {} out of range [0.0, 2.0]", self.temperature));
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// Runtime limits for the extractor, independent of document type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSettings {
    /// Maximum input text length (chars)
    pub max_text_length: usize,

    /// Timeout for one provider call (seconds)
    pub provider_timeout_secs: u64,

    /// Retries per window after the first failed attempt
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries (milliseconds)
    pub retry_backoff_ms: u64,
}

impl ExtractorSettings {
    /// Get the per-call timeout as a Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Backoff delay before retry `attempt` (0-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(1u64 << attempt.min(8)))
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.provider_timeout_secs == 0 {
            return Err("provider_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load settings from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize settings to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Aggressive preset: short timeout, one retry, for interactive paths
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 100_000,
            provider_timeout_secs: 20,
            max_retries: 1,
            retry_backoff_ms: 100,
        }
    }

    /// Lenient preset: generous timeout and retries, for batch processing
    pub fn lenient() -> Self {
        Self {
            max_text_length: 500_000,
            provider_timeout_secs: 60,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl Default for ExtractorSettings {
    /// Default settings with balanced limits
    fn default() -> Self {
        Self {
            max_text_length: 200_000,
            provider_timeout_secs: 45,
            max_retries: 2,
            retry_backoff_ms: 250,
        }
    }
}
