//! Prompt assembly for extraction backends

use lexgraph_domain::WorkedExample;
use serde_json::json;

/// Builds the full prompt for one window: instructions, worked examples,
/// then the window text and an output-format reminder.
pub struct PromptBuilder<'a> {
    window_text: &'a str,
    instructions: &'a str,
    examples: &'a [WorkedExample],
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(window_text: &'a str, instructions: &'a str, examples: &'a [WorkedExample]) -> Self {
        Self {
            window_text,
            instructions,
            examples,
        }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(self.instructions);
        prompt.push_str("\n\n");

        for (idx, example) in self.examples.iter().enumerate() {
            prompt.push_str(&format!("Example {}:\n", idx + 1));
            prompt.push_str("Text:\n---\n");
            prompt.push_str(&example.text);
            prompt.push_str("\n---\n");
            prompt.push_str("Output:\n");
            prompt.push_str(&render_example_output(example));
            prompt.push_str("\n\n");
        }

        prompt.push_str("Text to analyze:\n---\n");
        prompt.push_str(self.window_text);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

/// Render a worked example's expected output as the JSON the backend should
/// emit, with char offsets recovered from the example text.
fn render_example_output(example: &WorkedExample) -> String {
    let items: Vec<_> = example
        .extractions
        .iter()
        .map(|e| {
            let (start, end) = char_span_of(&example.text, &e.extraction_text);
            json!({
                "extraction_class": e.extraction_class,
                "extraction_text": e.extraction_text,
                "start_char": start,
                "end_char": end,
                "attributes": e.attributes,
            })
        })
        .collect();

    serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
}

/// Char offsets of the first occurrence of `needle` in `haystack`
///
/// Falls back to (0, needle chars) when the example text does not actually
/// contain the span - a misauthored example should not panic prompt assembly.
fn char_span_of(haystack: &str, needle: &str) -> (usize, usize) {
    let needle_chars = needle.chars().count();
    match haystack.find(needle) {
        Some(byte_start) => {
            let char_start = haystack[..byte_start].chars().count();
            (char_start, char_start + needle_chars)
        }
        None => (0, needle_chars),
    }
}

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  {
    "extraction_class": "FINANCIAL_TERMS",
    "extraction_text": "exact text from the source",
    "start_char": 0,
    "end_char": 0,
    "attributes": {"key": "value"},
    "confidence": 0.0
  }
]

Rules:
- extraction_text must be copied verbatim from the source text
- start_char/end_char are character offsets into the text between the --- markers
- attributes values are plain strings
- confidence is optional; omit it rather than guessing
- Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;
    use lexgraph_domain::ExampleExtraction;
    use std::collections::BTreeMap;

    fn example() -> WorkedExample {
        WorkedExample {
            text: "Monthly rent: $950, due on the 1st.".to_string(),
            extractions: vec![ExampleExtraction {
                extraction_class: "FINANCIAL_TERMS".to_string(),
                extraction_text: "Monthly rent: $950".to_string(),
                attributes: BTreeMap::from([("amount".to_string(), "$950".to_string())]),
            }],
        }
    }

    #[test]
    fn test_prompt_includes_instructions_and_window() {
        let examples = [example()];
        let prompt = PromptBuilder::new("Rent is due.", "Extract legal clauses.", &examples).build();

        assert!(prompt.contains("Extract legal clauses."));
        assert!(prompt.contains("Rent is due."));
        assert!(prompt.contains("Example 1:"));
        assert!(prompt.contains("Monthly rent: $950"));
        assert!(prompt.contains("Output format"));
    }

    #[test]
    fn test_example_offsets_recovered() {
        let examples = [example()];
        let prompt = PromptBuilder::new("x", "y", &examples).build();

        // "Monthly rent: $950" starts at char 0 of the example text
        assert!(prompt.contains("\"start_char\": 0"));
        assert!(prompt.contains("\"end_char\": 18"));
    }

    #[test]
    fn test_char_span_of_multibyte() {
        // char offsets, not byte offsets
        let (start, end) = char_span_of("§1 — rent due", "rent");
        assert_eq!(start, 5);
        assert_eq!(end, 9);
    }

    #[test]
    fn test_no_examples() {
        let prompt = PromptBuilder::new("text", "instructions", &[]).build();
        assert!(!prompt.contains("Example 1:"));
    }
}
