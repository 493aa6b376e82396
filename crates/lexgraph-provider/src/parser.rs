//! Parse backend output into typed raw extractions
//!
//! This is the provider boundary: everything past this point is strongly
//! typed. Individually malformed items are skipped with a warning; a payload
//! that is not a JSON array at all is a `ProviderError::MalformedOutput`.

use lexgraph_domain::{ProviderError, RawExtraction};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Parse a backend JSON response into raw extractions for one window
///
/// Expected shape: a JSON array of objects with `extraction_class`,
/// `extraction_text`, `start_char`, `end_char`, and optional `attributes`
/// (object) and `confidence` (number). Markdown code fences around the JSON
/// are tolerated - models add them even when told not to.
pub fn parse_provider_response(
    response: &str,
    window_id: usize,
) -> Result<Vec<RawExtraction>, ProviderError> {
    let json_str = strip_code_fence(response);

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| ProviderError::MalformedOutput(format!("JSON parse error: {}", e)))?;

    let items = json
        .as_array()
        .ok_or_else(|| ProviderError::MalformedOutput("Expected JSON array".to_string()))?;

    let mut extractions = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        match parse_extraction(item, window_id) {
            Ok(extraction) => {
                if let Err(e) = extraction.validate() {
                    warn!("Extraction {} failed validation: {}", idx, e);
                    continue;
                }
                extractions.push(extraction);
            }
            Err(e) => {
                warn!("Failed to parse extraction {}: {}", idx, e);
            }
        }
    }

    Ok(extractions)
}

/// Strip a markdown code fence, returning the inner JSON
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let body = trimmed
        .trim_start_matches("```json")
        .trim_start_matches("```");
    body.trim_end_matches("```").trim()
}

/// Parse a single extraction object
fn parse_extraction(json: &Value, window_id: usize) -> Result<RawExtraction, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Extraction is not a JSON object".to_string())?;

    let extraction_class = obj
        .get("extraction_class")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Missing or invalid 'extraction_class'".to_string())?
        .to_string();

    let extraction_text = obj
        .get("extraction_text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Missing or invalid 'extraction_text'".to_string())?
        .to_string();

    let char_offset_start = obj
        .get("start_char")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| "Missing or invalid 'start_char'".to_string())? as usize;

    let char_offset_end = obj
        .get("end_char")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| "Missing or invalid 'end_char'".to_string())? as usize;

    let attributes = obj
        .get("attributes")
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .map(|(k, v)| {
                    let value = match v.as_str() {
                        Some(s) => s.to_string(),
                        None => v.to_string(),
                    };
                    (k.clone(), value)
                })
                .collect::<BTreeMap<String, String>>()
        })
        .unwrap_or_default();

    let confidence = obj.get("confidence").and_then(|v| v.as_f64());

    Ok(RawExtraction {
        extraction_class,
        extraction_text,
        attributes,
        source_window_id: window_id,
        char_offset_start,
        char_offset_end,
        confidence,
    })
}
