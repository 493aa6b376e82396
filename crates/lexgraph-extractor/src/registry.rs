//! Per-document-type configuration registry
//!
//! Built once at startup, read concurrently afterwards with no locks. A
//! generic fallback is always part of the default build, so lookups cannot
//! fail in practice; the error path exists only for hand-assembled
//! registries missing a fallback.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use lexgraph_domain::{DocumentType, ExampleExtraction, WorkedExample};
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Default model for the built-in configurations
const DEFAULT_MODEL: &str = "llama3.1";

/// Maps a document type to its extraction configuration
#[derive(Debug, Clone)]
pub struct ExtractionConfigRegistry {
    configs: HashMap<DocumentType, ExtractionConfig>,
}

impl ExtractionConfigRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            configs: HashMap::new(),
        }
    }

    /// Create a registry with the built-in configurations
    ///
    /// Registers rental, employment, NDA, service agreement, and the generic
    /// fallback.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(rental_config());
        registry.register(employment_config());
        registry.register(nda_config());
        registry.register(service_agreement_config());
        registry.register(generic_config());
        registry
    }

    /// Register a configuration for its document type, replacing any previous
    pub fn register(&mut self, config: ExtractionConfig) {
        self.configs.insert(config.document_type, config);
    }

    /// Look up the configuration for a document type
    ///
    /// Unknown types fall back to the generic configuration. Errors only when
    /// no generic fallback was registered - callers must not rely on this.
    pub fn config_for(&self, document_type: DocumentType) -> Result<&ExtractionConfig, ExtractError> {
        self.configs
            .get(&document_type)
            .or_else(|| self.configs.get(&DocumentType::Generic))
            .ok_or_else(|| ExtractError::UnknownDocumentType(document_type.as_str().to_string()))
    }
}

impl Default for ExtractionConfigRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn base_prompt(domain_line: &str) -> String {
    format!(
        r#"Extract legal clauses from the text between the --- markers.
{}

Classes:
- PARTY_IDENTIFICATION: who is bound by the document
- FINANCIAL_TERMS: amounts, payment schedules, deposits, penalties
- DATE_TERM: effective dates, deadlines, renewal dates
- TERMINATION: how and when the agreement ends
- OBLIGATION: duties imposed on a party
- RISK_FACTOR: language creating exposure for a party

Rules:
- extraction_text is copied verbatim from the source
- one clause per extraction; do not combine sentences
- attach a "party" attribute when a clause names a party
- attach a "key_terms" attribute with comma-separated linking terms"#,
        domain_line
    )
}

fn example(text: &str, extractions: Vec<(&str, &str, &[(&str, &str)])>) -> WorkedExample {
    WorkedExample {
        text: text.to_string(),
        extractions: extractions
            .into_iter()
            .map(|(class, span, attrs)| ExampleExtraction {
                extraction_class: class.to_string(),
                extraction_text: span.to_string(),
                attributes: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect(),
    }
}

fn rental_config() -> ExtractionConfig {
    ExtractionConfig {
        document_type: DocumentType::Rental,
        prompt_text: base_prompt("The document is a residential or commercial lease."),
        worked_examples: vec![example(
            "This lease is between Jordan Reyes (Landlord) and Casey Liu (Tenant). \
             Monthly rent: $1,200, due on the first of each month. \
             Either party may terminate with 60 days written notice.",
            vec![
                (
                    "PARTY_IDENTIFICATION",
                    "This lease is between Jordan Reyes (Landlord) and Casey Liu (Tenant).",
                    &[("party", "Jordan Reyes, Casey Liu")],
                ),
                (
                    "FINANCIAL_TERMS",
                    "Monthly rent: $1,200, due on the first of each month.",
                    &[("amount", "$1,200"), ("key_terms", "rent, monthly")],
                ),
                (
                    "TERMINATION",
                    "Either party may terminate with 60 days written notice.",
                    &[("key_terms", "terminate, notice")],
                ),
            ],
        )],
        model_id: DEFAULT_MODEL.to_string(),
        chunk_size: 4000,
        pass_count: 1,
        temperature: 0.1,
        max_parallel_windows: 4,
    }
}

fn employment_config() -> ExtractionConfig {
    ExtractionConfig {
        document_type: DocumentType::Employment,
        prompt_text: base_prompt("The document is an employment agreement."),
        worked_examples: vec![example(
            "Morgan Patel is employed by Delta Fabrication Inc. as Site Engineer. \
             Annual salary: $96,000 paid semi-monthly. \
             The Employee shall not disclose proprietary processes.",
            vec![
                (
                    "PARTY_IDENTIFICATION",
                    "Morgan Patel is employed by Delta Fabrication Inc. as Site Engineer.",
                    &[("party", "Morgan Patel, Delta Fabrication Inc.")],
                ),
                (
                    "FINANCIAL_TERMS",
                    "Annual salary: $96,000 paid semi-monthly.",
                    &[("amount", "$96,000"), ("key_terms", "salary")],
                ),
                (
                    "OBLIGATION",
                    "The Employee shall not disclose proprietary processes.",
                    &[("key_terms", "disclose, proprietary")],
                ),
            ],
        )],
        model_id: DEFAULT_MODEL.to_string(),
        chunk_size: 4000,
        pass_count: 2,
        temperature: 0.1,
        max_parallel_windows: 4,
    }
}

fn nda_config() -> ExtractionConfig {
    ExtractionConfig {
        document_type: DocumentType::Nda,
        prompt_text: base_prompt("The document is a non-disclosure agreement."),
        worked_examples: vec![example(
            "The Receiving Party shall keep all Confidential Information secret \
             for a period of five years from the Effective Date of March 3, 2025.",
            vec![
                (
                    "OBLIGATION",
                    "The Receiving Party shall keep all Confidential Information secret",
                    &[("key_terms", "confidential, secret")],
                ),
                (
                    "DATE_TERM",
                    "five years from the Effective Date of March 3, 2025",
                    &[("date", "March 3, 2025"), ("key_terms", "effective date")],
                ),
            ],
        )],
        model_id: DEFAULT_MODEL.to_string(),
        chunk_size: 4000,
        pass_count: 1,
        temperature: 0.1,
        max_parallel_windows: 4,
    }
}

fn service_agreement_config() -> ExtractionConfig {
    ExtractionConfig {
        document_type: DocumentType::ServiceAgreement,
        prompt_text: base_prompt("The document is a services or consulting agreement."),
        worked_examples: vec![example(
            "Contractor will deliver monthly reports to Harbor Analytics LLC. \
             Fees: $4,500 per month, net 30. Late delivery incurs a 5% penalty.",
            vec![
                (
                    "OBLIGATION",
                    "Contractor will deliver monthly reports to Harbor Analytics LLC.",
                    &[("party", "Harbor Analytics LLC"), ("key_terms", "deliver, reports")],
                ),
                (
                    "FINANCIAL_TERMS",
                    "Fees: $4,500 per month, net 30.",
                    &[("amount", "$4,500"), ("key_terms", "fees")],
                ),
                (
                    "RISK_FACTOR",
                    "Late delivery incurs a 5% penalty.",
                    &[("key_terms", "penalty, late")],
                ),
            ],
        )],
        model_id: DEFAULT_MODEL.to_string(),
        chunk_size: 4000,
        pass_count: 1,
        temperature: 0.1,
        max_parallel_windows: 4,
    }
}

fn generic_config() -> ExtractionConfig {
    ExtractionConfig {
        document_type: DocumentType::Generic,
        prompt_text: base_prompt("The document type is unknown; extract any clause that fits a class."),
        worked_examples: vec![example(
            "Payment of $300 is due by June 1, 2025.",
            vec![
                (
                    "FINANCIAL_TERMS",
                    "Payment of $300",
                    &[("amount", "$300"), ("key_terms", "payment")],
                ),
                (
                    "DATE_TERM",
                    "due by June 1, 2025",
                    &[("date", "June 1, 2025")],
                ),
            ],
        )],
        model_id: DEFAULT_MODEL.to_string(),
        chunk_size: 4000,
        pass_count: 1,
        temperature: 0.2,
        max_parallel_windows: 4,
    }
}
