//! Core ClauseExtractor implementation

use crate::chunking::{char_slice, TextChunker, Window};
use crate::config::{ExtractionConfig, ExtractorSettings};
use crate::dedup::merge_candidates;
use crate::error::ExtractError;
use crate::keyterms::derive_key_terms;
use crate::registry::ExtractionConfigRegistry;
use crate::types::{CandidateClause, ExtractionOutcome};
use lexgraph_domain::traits::ExtractionProvider;
use lexgraph_domain::{
    Clause, ClauseType, DocumentType, ExtractionMetadata, ProviderError, RawExtraction,
    WindowRequest,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Confidence assigned when the provider does not emit one
///
/// Deliberately neutral: a provider without native confidence must not look
/// like a high-confidence provider.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// The ClauseExtractor turns document text into typed, scored clauses
///
/// Drives the registry, chunker, and provider across all windows of a
/// document, deduplicates overlapping results, and yields the final ordered
/// clause list. Collaborators are injected at construction; nothing is read
/// from process-wide state.
pub struct ClauseExtractor<P>
where
    P: ExtractionProvider,
{
    provider: Arc<P>,
    registry: Arc<ExtractionConfigRegistry>,
    settings: ExtractorSettings,
}

impl<P> ClauseExtractor<P>
where
    P: ExtractionProvider + Send + Sync + 'static,
{
    /// Create a new ClauseExtractor
    pub fn new(provider: P, registry: ExtractionConfigRegistry, settings: ExtractorSettings) -> Self {
        Self {
            provider: Arc::new(provider),
            registry: Arc::new(registry),
            settings,
        }
    }

    /// Extract clauses from one document
    ///
    /// Window order never affects the output: results are keyed by
    /// (pass, window) and re-sorted by absolute offset, so a deterministic
    /// provider yields identical clause ids on every run.
    pub async fn extract(
        &self,
        document_id: &str,
        text: &str,
        document_type: DocumentType,
    ) -> Result<ExtractionOutcome, ExtractError> {
        let char_count = text.chars().count();
        if char_count > self.settings.max_text_length {
            return Err(ExtractError::TextTooLong(
                char_count,
                self.settings.max_text_length,
            ));
        }

        let config = self.registry.config_for(document_type)?.clone();

        info!(
            "Starting extraction for document '{}' ({} chars, type '{}')",
            document_id,
            char_count,
            document_type.as_str()
        );

        let start_time = Instant::now();
        let mut metadata = ExtractionMetadata::new(&config.model_id);
        metadata.passes = config.pass_count;

        let chunker = TextChunker::with_default_overlap(config.chunk_size);
        let windows = chunker.split(text);
        metadata.windows_total = windows.len();

        if windows.is_empty() {
            metadata.duration_ms = start_time.elapsed().as_millis() as u64;
            return Ok(ExtractionOutcome {
                clauses: Vec::new(),
                metadata,
            });
        }

        debug!("Split document into {} windows", windows.len());

        let results = self.run_windows(&windows, &config).await;

        // Process in (pass, window) order so warnings and candidates are
        // deterministic regardless of task completion order
        let mut candidates = Vec::new();
        let mut window_succeeded = vec![false; windows.len()];

        for ((pass, window_id), result) in &results {
            match result {
                Ok(raws) => {
                    window_succeeded[*window_id] = true;
                    let window = &windows[*window_id];
                    for raw in raws {
                        match to_candidate(text, window, raw) {
                            Ok(candidate) => candidates.push(candidate),
                            Err(reason) => {
                                metadata.warnings.push(format!(
                                    "window {} pass {}: discarded span: {}",
                                    window_id,
                                    pass + 1,
                                    reason
                                ));
                            }
                        }
                    }
                }
                Err(e) => {
                    metadata.warnings.push(format!(
                        "window {} pass {} dropped after retries: {}",
                        window_id,
                        pass + 1,
                        e
                    ));
                }
            }
        }

        metadata.windows_failed = window_succeeded.iter().filter(|ok| !**ok).count();
        if metadata.windows_failed == windows.len() {
            return Err(ExtractError::ExtractionFailed(windows.len()));
        }

        let merged = merge_candidates(candidates);
        let clauses: Vec<Clause> = merged
            .into_iter()
            .enumerate()
            .map(|(ordinal, candidate)| {
                candidate.into_clause(Clause::format_id(document_id, ordinal))
            })
            .collect();

        metadata.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Extraction complete for '{}': {} clauses, {}/{} windows failed, {} warnings",
            document_id,
            clauses.len(),
            metadata.windows_failed,
            metadata.windows_total,
            metadata.warnings.len()
        );

        Ok(ExtractionOutcome { clauses, metadata })
    }

    /// Run all (pass, window) provider calls, bounded by the config's
    /// parallelism, and collect results keyed for deterministic processing
    async fn run_windows(
        &self,
        windows: &[Window],
        config: &ExtractionConfig,
    ) -> BTreeMap<(u32, usize), Result<Vec<RawExtraction>, ProviderError>> {
        let semaphore = Arc::new(Semaphore::new(config.max_parallel_windows.max(1)));
        let mut results = BTreeMap::new();

        for pass in 0..config.pass_count {
            let mut join_set = JoinSet::new();

            for window in windows {
                let request = WindowRequest {
                    window_id: window.id,
                    text: window.text.clone(),
                    prompt: config.prompt_text.clone(),
                    examples: config.worked_examples.clone(),
                    model_id: config.model_id.clone(),
                    temperature: config.temperature,
                };
                let provider = Arc::clone(&self.provider);
                let semaphore = Arc::clone(&semaphore);
                let settings = self.settings.clone();
                let window_id = window.id;

                join_set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let result = call_with_retry(provider, request, &settings).await;
                    (pass, window_id, result)
                });
            }

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((pass, window_id, result)) => {
                        results.insert((pass, window_id), result);
                    }
                    Err(e) => {
                        warn!("Window task failed to join: {}", e);
                    }
                }
            }
        }

        results
    }
}

/// One window call with per-attempt timeout and exponential backoff
async fn call_with_retry<P>(
    provider: Arc<P>,
    request: WindowRequest,
    settings: &ExtractorSettings,
) -> Result<Vec<RawExtraction>, ProviderError>
where
    P: ExtractionProvider + Send + Sync + 'static,
{
    let mut last_error = ProviderError::Unavailable("no attempts made".to_string());

    for attempt in 0..=settings.max_retries {
        if attempt > 0 {
            let delay = settings.backoff_delay(attempt - 1);
            debug!(
                "Retrying window {} (attempt {}) after {:?}",
                request.window_id,
                attempt + 1,
                delay
            );
            tokio::time::sleep(delay).await;
        }

        let provider = Arc::clone(&provider);
        let call_request = request.clone();
        let call = tokio::task::spawn_blocking(move || provider.invoke(&call_request));

        match timeout(settings.provider_timeout(), call).await {
            Ok(Ok(Ok(spans))) => return Ok(spans),
            Ok(Ok(Err(e))) => {
                warn!("Window {} attempt {} failed: {}", request.window_id, attempt + 1, e);
                last_error = e;
            }
            Ok(Err(join_err)) => {
                last_error =
                    ProviderError::Unavailable(format!("provider task failed: {}", join_err));
            }
            Err(_) => {
                last_error = ProviderError::Unavailable(format!(
                    "provider call timed out after {}s",
                    settings.provider_timeout_secs
                ));
            }
        }
    }

    Err(last_error)
}

/// Lift a raw extraction to absolute offsets and build a candidate clause
///
/// The document text is authoritative: the span must match the document at
/// its claimed offsets, or be locatable inside its window; otherwise it is
/// discarded.
fn to_candidate(
    text: &str,
    window: &Window,
    raw: &RawExtraction,
) -> Result<CandidateClause, String> {
    raw.validate()?;

    let claimed = char_slice(&window.text, raw.char_offset_start, raw.char_offset_end);
    let (local_start, local_end) = if claimed == raw.extraction_text {
        (raw.char_offset_start, raw.char_offset_end)
    } else if let Some(found) = find_char_offset(&window.text, &raw.extraction_text) {
        // Provider returned the right text at the wrong offsets - realign
        (found, found + raw.extraction_text.chars().count())
    } else {
        return Err(format!(
            "text {:?} not present in window",
            truncate_for_log(&raw.extraction_text)
        ));
    };

    let char_start = window.char_start + local_start;
    let char_end = window.char_start + local_end;
    let clause_text = char_slice(text, char_start, char_end).to_string();

    Ok(CandidateClause {
        clause_type: ClauseType::from_class(&raw.extraction_class),
        key_terms: derive_key_terms(&clause_text, &raw.attributes),
        confidence: raw.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0),
        text: clause_text,
        char_start,
        char_end,
    })
}

/// Char offset of the first occurrence of `needle` in `haystack`
fn find_char_offset(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte_offset| haystack[..byte_offset].chars().count())
}

fn truncate_for_log(text: &str) -> String {
    if text.chars().count() <= 40 {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(40).collect();
        format!("{}…", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexgraph_domain::DocumentType;
    use lexgraph_provider::MockProvider;

    const RENTAL_TEXT: &str = "Rental agreement. Monthly rent: $1,200, due monthly.";

    fn fast_settings() -> ExtractorSettings {
        ExtractorSettings {
            max_text_length: 10_000,
            provider_timeout_secs: 5,
            max_retries: 0,
            retry_backoff_ms: 1,
        }
    }

    /// Registry whose generic config uses the given chunk size and passes
    fn test_registry(chunk_size: usize, pass_count: u32) -> ExtractionConfigRegistry {
        let mut registry = ExtractionConfigRegistry::new();
        registry.register(ExtractionConfig {
            document_type: DocumentType::Generic,
            prompt_text: "Extract clauses.".to_string(),
            worked_examples: Vec::new(),
            model_id: "mock".to_string(),
            chunk_size,
            pass_count,
            temperature: 0.0,
            max_parallel_windows: 2,
        });
        registry
    }

    fn rent_span() -> RawExtraction {
        // "Monthly rent: $1,200" sits at chars [18, 38) of RENTAL_TEXT
        RawExtraction::new("FINANCIAL_TERMS", "Monthly rent: $1,200", 0, 18, 38)
            .with_confidence(0.85)
            .with_attribute("key_terms", "rent, payment")
    }

    #[tokio::test]
    async fn test_empty_text_extracts_nothing() {
        let provider = MockProvider::empty();
        let counter = provider.clone();
        let extractor = ClauseExtractor::new(provider, test_registry(100, 1), fast_settings());

        let outcome = extractor
            .extract("doc-1", "", DocumentType::Generic)
            .await
            .unwrap();

        assert!(outcome.clauses.is_empty());
        assert_eq!(outcome.metadata.windows_total, 0);
        assert_eq!(counter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rental_snippet_yields_financial_clause() {
        let provider = MockProvider::new(vec![rent_span()]);
        let extractor = ClauseExtractor::new(provider, test_registry(200, 1), fast_settings());

        let outcome = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Rental)
            .await
            .unwrap();

        assert_eq!(outcome.clauses.len(), 1);
        let clause = &outcome.clauses[0];
        assert_eq!(clause.clause_type, ClauseType::FinancialTerms);
        assert!(clause.clause_text.contains("$1,200"));
        assert!((0.0..=1.0).contains(&clause.confidence_score));
        assert_eq!(clause.clause_id, "doc-1-clause-0");
        assert!(clause.key_terms.contains("rent"));
        assert!(clause.key_terms.contains("payment"));
    }

    #[tokio::test]
    async fn test_extraction_is_deterministic() {
        let provider = MockProvider::new(vec![rent_span()]);
        let extractor = ClauseExtractor::new(provider, test_registry(20, 1), fast_settings());

        let first = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await
            .unwrap();
        let second = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await
            .unwrap();

        assert_eq!(first.clauses, second.clauses);
    }

    #[tokio::test]
    async fn test_duplicate_merge_takes_max_confidence() {
        let spans = vec![
            RawExtraction::new("FINANCIAL_TERMS", "Monthly rent: $1,200", 0, 18, 38)
                .with_confidence(0.6),
            RawExtraction::new("FINANCIAL_TERMS", "rent: $1,200, due monthly", 0, 26, 51)
                .with_confidence(0.9),
        ];
        let provider = MockProvider::new(spans);
        let extractor = ClauseExtractor::new(provider, test_registry(200, 1), fast_settings());

        let outcome = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await
            .unwrap();

        assert_eq!(outcome.clauses.len(), 1);
        assert_eq!(outcome.clauses[0].confidence_score, 0.9);
    }

    #[tokio::test]
    async fn test_failed_window_dropped_with_warning() {
        let text = "a financial clause of $500 here. ".repeat(4);
        let chunk_size = 40;
        let windows = TextChunker::with_default_overlap(chunk_size).split(&text);
        assert!(windows.len() >= 2);

        let mut provider = MockProvider::empty();
        // First window yields a span, second window always fails
        let span_text = "financial clause of $500";
        let local = windows[0].text.find(span_text).unwrap();
        provider.add_response(
            windows[0].text.clone(),
            vec![RawExtraction::new(
                "FINANCIAL_TERMS",
                span_text,
                0,
                local,
                local + span_text.len(),
            )],
        );
        provider.add_failure(
            windows[1].text.clone(),
            ProviderError::Unavailable("window down".to_string()),
        );

        let extractor =
            ClauseExtractor::new(provider, test_registry(chunk_size, 1), fast_settings());
        let outcome = extractor
            .extract("doc-1", &text, DocumentType::Generic)
            .await
            .unwrap();

        assert_eq!(outcome.clauses.len(), 1);
        assert_eq!(outcome.metadata.windows_failed, 1);
        assert!(outcome
            .metadata
            .warnings
            .iter()
            .any(|w| w.contains("window 1") && w.contains("window down")));
    }

    #[tokio::test]
    async fn test_all_windows_failed_is_extraction_failed() {
        let mut provider = MockProvider::empty();
        provider.add_failure(RENTAL_TEXT, ProviderError::RateLimited);

        let extractor = ClauseExtractor::new(provider, test_registry(200, 1), fast_settings());
        let result = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await;

        assert!(matches!(result, Err(ExtractError::ExtractionFailed(1))));
    }

    #[tokio::test]
    async fn test_failed_calls_are_retried() {
        let mut provider = MockProvider::empty();
        provider.add_failure(RENTAL_TEXT, ProviderError::RateLimited);
        let counter = provider.clone();

        let mut settings = fast_settings();
        settings.max_retries = 2;

        let extractor = ClauseExtractor::new(provider, test_registry(200, 1), settings);
        let result = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await;

        assert!(result.is_err());
        // Initial attempt plus two retries
        assert_eq!(counter.call_count(), 3);
    }

    #[tokio::test]
    async fn test_offsets_absolute_across_windows() {
        let filler = "lorem ipsum dolor sit amet consectetur. ".repeat(2);
        let text = format!("{}Security deposit: $500 refundable.", filler);
        let chunk_size = 60;
        let windows = TextChunker::with_default_overlap(chunk_size).split(&text);
        let span_text = "Security deposit: $500";
        let (window_idx, local) = windows
            .iter()
            .enumerate()
            .find_map(|(i, w)| w.text.find(span_text).map(|b| (i, b)))
            .unwrap();
        assert!(window_idx > 0, "span should land past the first window");

        let mut provider = MockProvider::empty();
        provider.add_response(
            windows[window_idx].text.clone(),
            vec![RawExtraction::new(
                "FINANCIAL_TERMS",
                span_text,
                0,
                local,
                local + span_text.len(),
            )],
        );

        let extractor =
            ClauseExtractor::new(provider, test_registry(chunk_size, 1), fast_settings());
        let outcome = extractor
            .extract("doc-1", &text, DocumentType::Generic)
            .await
            .unwrap();

        assert_eq!(outcome.clauses.len(), 1);
        let clause = &outcome.clauses[0];
        assert_eq!(
            char_slice(&text, clause.char_offset_start, clause.char_offset_end),
            clause.clause_text
        );
        assert_eq!(clause.clause_text, span_text);
        assert!(clause.char_offset_start >= windows[window_idx].char_start);
    }

    #[tokio::test]
    async fn test_misaligned_span_is_realigned() {
        // Offsets are wrong but the text exists in the window
        let span = RawExtraction::new("DATE_TERM", "due monthly", 0, 0, 11);
        let provider = MockProvider::new(vec![span]);
        let extractor = ClauseExtractor::new(provider, test_registry(200, 1), fast_settings());

        let outcome = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await
            .unwrap();

        assert_eq!(outcome.clauses.len(), 1);
        let clause = &outcome.clauses[0];
        assert_eq!(clause.clause_text, "due monthly");
        assert_eq!(
            char_slice(
                RENTAL_TEXT,
                clause.char_offset_start,
                clause.char_offset_end
            ),
            "due monthly"
        );
    }

    #[tokio::test]
    async fn test_unlocatable_span_discarded_with_warning() {
        let span = RawExtraction::new("OBLIGATION", "hallucinated clause text", 0, 0, 24);
        let provider = MockProvider::new(vec![span]);
        let extractor = ClauseExtractor::new(provider, test_registry(200, 1), fast_settings());

        let outcome = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await
            .unwrap();

        assert!(outcome.clauses.is_empty());
        assert!(outcome
            .metadata
            .warnings
            .iter()
            .any(|w| w.contains("not present in window")));
    }

    #[tokio::test]
    async fn test_unknown_class_maps_to_other() {
        let span = RawExtraction::new("INDEMNIFICATION", "Monthly rent: $1,200", 0, 18, 38);
        let provider = MockProvider::new(vec![span]);
        let extractor = ClauseExtractor::new(provider, test_registry(200, 1), fast_settings());

        let outcome = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await
            .unwrap();

        assert_eq!(outcome.clauses[0].clause_type, ClauseType::Other);
    }

    #[tokio::test]
    async fn test_missing_confidence_defaults_neutral() {
        let span = RawExtraction::new("FINANCIAL_TERMS", "Monthly rent: $1,200", 0, 18, 38);
        let provider = MockProvider::new(vec![span]);
        let extractor = ClauseExtractor::new(provider, test_registry(200, 1), fast_settings());

        let outcome = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await
            .unwrap();

        assert_eq!(outcome.clauses[0].confidence_score, DEFAULT_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_second_pass_corroborates_not_duplicates() {
        let provider = MockProvider::new(vec![rent_span()]);
        let counter = provider.clone();
        let extractor = ClauseExtractor::new(provider, test_registry(200, 2), fast_settings());

        let outcome = extractor
            .extract("doc-1", RENTAL_TEXT, DocumentType::Generic)
            .await
            .unwrap();

        assert_eq!(outcome.clauses.len(), 1);
        assert_eq!(outcome.metadata.passes, 2);
        assert_eq!(counter.call_count(), 2);
    }

    #[tokio::test]
    async fn test_text_too_long_rejected() {
        let provider = MockProvider::empty();
        let extractor = ClauseExtractor::new(provider, test_registry(200, 1), fast_settings());

        let long_text = "a".repeat(20_000);
        let result = extractor
            .extract("doc-1", &long_text, DocumentType::Generic)
            .await;

        assert!(matches!(result, Err(ExtractError::TextTooLong(_, _))));
    }
}
