//! Document type module - per-type extraction and compliance behavior

use crate::clause::ClauseType;
use serde::{Deserialize, Serialize};

/// Kind of legal document being analyzed
///
/// Unknown tags fall back to `Generic` so extraction always has a
/// configuration to work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Residential or commercial lease
    Rental,

    /// Employment agreement
    Employment,

    /// Non-disclosure agreement
    Nda,

    /// Services / consulting agreement
    ServiceAgreement,

    /// Anything without a more specific configuration
    Generic,
}

impl DocumentType {
    /// Get the document type tag as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Rental => "rental",
            DocumentType::Employment => "employment",
            DocumentType::Nda => "nda",
            DocumentType::ServiceAgreement => "service_agreement",
            DocumentType::Generic => "generic",
        }
    }

    /// Parse a document type from a tag
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rental" | "lease" => Some(DocumentType::Rental),
            "employment" => Some(DocumentType::Employment),
            "nda" | "non_disclosure" => Some(DocumentType::Nda),
            "service_agreement" | "services" => Some(DocumentType::ServiceAgreement),
            "generic" => Some(DocumentType::Generic),
            _ => None,
        }
    }

    /// Parse a tag, falling back to `Generic` for anything unrecognized
    pub fn from_tag(s: &str) -> Self {
        Self::parse(s).unwrap_or(DocumentType::Generic)
    }

    /// Clause types this document type is expected to contain
    ///
    /// Drives the compliance check: each type listed here that is absent
    /// from the extracted clauses becomes a compliance issue.
    pub fn mandatory_clauses(&self) -> &'static [ClauseType] {
        match self {
            DocumentType::Rental => &[
                ClauseType::PartyIdentification,
                ClauseType::FinancialTerms,
                ClauseType::DateTerm,
                ClauseType::Termination,
            ],
            DocumentType::Employment => &[
                ClauseType::PartyIdentification,
                ClauseType::FinancialTerms,
                ClauseType::Obligation,
                ClauseType::Termination,
            ],
            DocumentType::Nda => &[
                ClauseType::PartyIdentification,
                ClauseType::Obligation,
                ClauseType::DateTerm,
            ],
            DocumentType::ServiceAgreement => &[
                ClauseType::PartyIdentification,
                ClauseType::FinancialTerms,
                ClauseType::Obligation,
            ],
            DocumentType::Generic => &[ClauseType::PartyIdentification],
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid document type: {}", s))
    }
}
