//! Overlapping-window chunking for large documents
//!
//! Windows are sized and addressed in chars, not bytes, so offsets survive
//! multi-byte text. Consecutive windows overlap so clauses spanning a window
//! boundary are seen whole by at least one window; the extractor's dedup
//! collapses the duplicates this produces.

/// A bounded substring of the document submitted to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Ordinal of the window within the document
    pub id: usize,

    /// Absolute char offset of the window start in the original text
    pub char_start: usize,

    /// Window text
    pub text: String,
}

/// Splits text into overlapping fixed-size char windows
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker with an explicit overlap
    ///
    /// Overlap is clamped below chunk_size so the window start always
    /// advances.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Create a chunker with the standard 10% overlap
    pub fn with_default_overlap(chunk_size: usize) -> Self {
        Self::new(chunk_size, chunk_size / 10)
    }

    /// Split the text into windows; empty text yields no windows
    pub fn split(&self, text: &str) -> Vec<Window> {
        let char_count = text.chars().count();
        if char_count == 0 {
            return Vec::new();
        }
        if char_count <= self.chunk_size {
            return vec![Window {
                id: 0,
                char_start: 0,
                text: text.to_string(),
            }];
        }

        let step = self.chunk_size - self.overlap;
        let mut windows = Vec::new();
        let mut start = 0;
        let mut id = 0;

        loop {
            let end = (start + self.chunk_size).min(char_count);
            windows.push(Window {
                id,
                char_start: start,
                text: char_slice(text, start, end).to_string(),
            });
            if end == char_count {
                break;
            }
            start += step;
            id += 1;
        }

        windows
    }
}

/// Slice a string by char offsets
///
/// Out-of-range offsets clamp to the end of the string rather than panicking
/// on a bad provider span.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let byte_start = byte_offset_of_char(text, start);
    let byte_end = byte_offset_of_char(text, end);
    &text[byte_start..byte_end]
}

fn byte_offset_of_char(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: windows cover the whole text with no gaps
        #[test]
        fn test_windows_cover_text(text in ".{0,200}", chunk_size in 1usize..40) {
            let chunker = TextChunker::with_default_overlap(chunk_size);
            let windows = chunker.split(&text);
            let char_count = text.chars().count();

            if char_count == 0 {
                prop_assert!(windows.is_empty());
            } else {
                prop_assert_eq!(windows[0].char_start, 0);
                let mut covered_to = 0usize;
                for w in &windows {
                    prop_assert!(w.char_start <= covered_to, "gap before window {}", w.id);
                    covered_to = covered_to.max(w.char_start + w.text.chars().count());
                }
                prop_assert_eq!(covered_to, char_count);
            }
        }

        /// Property: every window's text matches the original at its offset
        #[test]
        fn test_window_offsets_faithful(text in ".{0,200}", chunk_size in 1usize..40) {
            let chunker = TextChunker::with_default_overlap(chunk_size);
            for w in chunker.split(&text) {
                let len = w.text.chars().count();
                prop_assert!(len <= chunk_size.max(1));
                prop_assert_eq!(
                    char_slice(&text, w.char_start, w.char_start + len),
                    w.text.as_str()
                );
            }
        }
    }
}
