//! Provider-boundary types: requests, raw output, and run metadata

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors an extraction provider can surface
///
/// This is a closed set: the engine retries all three at the window level and
/// reports the final one verbatim in metadata warnings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider could not be reached or did not answer in time
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Provider refused the call due to rate limiting
    #[error("Provider rate limited")]
    RateLimited,

    /// Provider answered with output that does not parse into extractions
    #[error("Provider returned malformed output: {0}")]
    MalformedOutput(String),
}

/// One labeled example extraction inside a worked example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleExtraction {
    /// Class tag the provider should emit for this kind of span
    pub extraction_class: String,

    /// Exact span text from the example document
    pub extraction_text: String,

    /// Attributes the provider should attach
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// A worked example: a short text plus the extractions it should yield
///
/// Passed to the provider as few-shot material; order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkedExample {
    /// Example document text
    pub text: String,

    /// Extractions a correct provider produces for `text`
    pub extractions: Vec<ExampleExtraction>,
}

/// One window's worth of work for the extraction provider
#[derive(Debug, Clone)]
pub struct WindowRequest {
    /// Ordinal of the window within the document
    pub window_id: usize,

    /// Window text (a bounded substring of the document)
    pub text: String,

    /// Instruction prompt from the document type's extraction config
    pub prompt: String,

    /// Few-shot worked examples
    pub examples: Vec<WorkedExample>,

    /// Model the provider should run
    pub model_id: String,

    /// Sampling temperature
    pub temperature: f32,
}

/// Raw labeled span returned by a provider for one window
///
/// Offsets are window-local chars; the extractor shifts them to absolute
/// document offsets. Ephemeral - never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExtraction {
    /// Provider's class tag for the span
    pub extraction_class: String,

    /// Exact span text
    pub extraction_text: String,

    /// Free-form string attributes (party names, key terms, amounts)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Window this extraction came from
    pub source_window_id: usize,

    /// Inclusive char start, window-local
    pub char_offset_start: usize,

    /// Exclusive char end, window-local
    pub char_offset_end: usize,

    /// Provider-native confidence, when the backend emits one
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl RawExtraction {
    /// Create a raw extraction with no attributes and no native confidence
    pub fn new(
        extraction_class: impl Into<String>,
        extraction_text: impl Into<String>,
        source_window_id: usize,
        char_offset_start: usize,
        char_offset_end: usize,
    ) -> Self {
        Self {
            extraction_class: extraction_class.into(),
            extraction_text: extraction_text.into(),
            attributes: BTreeMap::new(),
            source_window_id,
            char_offset_start,
            char_offset_end,
            confidence: None,
        }
    }

    /// Attach a provider-native confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Attach one attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Validate that the extraction is internally consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.extraction_class.is_empty() {
            return Err("extraction_class is empty".to_string());
        }
        if self.extraction_text.is_empty() {
            return Err("extraction_text is empty".to_string());
        }
        if self.char_offset_end <= self.char_offset_start {
            return Err(format!(
                "degenerate span [{}, {})",
                self.char_offset_start, self.char_offset_end
            ));
        }
        if let Some(c) = self.confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(format!("confidence {} out of range [0.0, 1.0]", c));
            }
        }
        Ok(())
    }
}

/// Metadata about one extraction run over a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// UUIDv7 identifying this run, for log correlation
    pub extraction_id: String,

    /// Model the run used
    pub model_id: String,

    /// Number of windows the document was split into
    pub windows_total: usize,

    /// Windows dropped after exhausting retries
    pub windows_failed: usize,

    /// Extraction passes performed
    pub passes: u32,

    /// Human-readable warnings (dropped windows, discarded spans)
    pub warnings: Vec<String>,

    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl ExtractionMetadata {
    /// Create metadata for a new run with a fresh extraction id
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            extraction_id: uuid::Uuid::now_v7().to_string(),
            model_id: model_id.into(),
            windows_total: 0,
            windows_failed: 0,
            passes: 0,
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(class: &str, text: &str, start: usize, end: usize) -> RawExtraction {
        RawExtraction {
            extraction_class: class.to_string(),
            extraction_text: text.to_string(),
            attributes: BTreeMap::new(),
            source_window_id: 0,
            char_offset_start: start,
            char_offset_end: end,
            confidence: None,
        }
    }

    #[test]
    fn test_valid_raw_extraction() {
        assert!(raw("FINANCIAL_TERMS", "rent is $900", 10, 22)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_empty_class_rejected() {
        assert!(raw("", "rent", 0, 4).validate().is_err());
    }

    #[test]
    fn test_degenerate_span_rejected() {
        assert!(raw("DATE_TERM", "May 1", 7, 7).validate().is_err());
        assert!(raw("DATE_TERM", "May 1", 7, 3).validate().is_err());
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let mut r = raw("RISK_FACTOR", "penalty", 0, 7);
        r.confidence = Some(1.2);
        assert!(r.validate().is_err());
        r.confidence = Some(0.9);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_metadata_ids_are_unique() {
        let a = ExtractionMetadata::new("model-a");
        let b = ExtractionMetadata::new("model-a");
        assert_ne!(a.extraction_id, b.extraction_id);
    }
}
