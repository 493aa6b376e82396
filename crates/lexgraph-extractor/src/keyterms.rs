//! Key-term derivation for clauses
//!
//! Key terms feed relationship inference: attribute values from the provider
//! (party names, amounts) are kept whole, and the clause text contributes its
//! significant tokens. Everything is lowercased; the result is an ordered set
//! so downstream output is deterministic.

use std::collections::{BTreeMap, BTreeSet};

/// Minimum token length for a text-derived key term
const MIN_TOKEN_LEN: usize = 4;

/// Boilerplate legal vocabulary that carries no linking signal
const STOPWORDS: &[&str] = &[
    "agreement", "between", "clause", "consideration", "document", "each", "following",
    "hereby", "herein", "hereof", "hereto", "including", "other", "parties", "party",
    "pursuant", "section", "shall", "that", "their", "there", "therein", "thereof",
    "these", "this", "under", "upon", "whereas", "which", "will", "with", "without",
];

/// Derive the key-term set for a clause
///
/// Attribute values are split on commas and kept as whole lowercase phrases;
/// clause text contributes lowercase alphanumeric tokens of at least
/// [`MIN_TOKEN_LEN`] chars that are not legal boilerplate.
pub fn derive_key_terms(text: &str, attributes: &BTreeMap<String, String>) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();

    for value in attributes.values() {
        for part in value.split(',') {
            let phrase = part.trim().to_lowercase();
            if !phrase.is_empty() {
                terms.insert(phrase);
            }
        }
    }

    for token in tokenize(text) {
        terms.insert(token);
    }

    terms
}

/// Significant lowercase tokens of a text
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .filter(|t| !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_filtered_and_lowercased() {
        let tokens = tokenize("The Tenant shall pay Rent monthly");
        assert!(tokens.contains(&"tenant".to_string()));
        assert!(tokens.contains(&"rent".to_string()));
        assert!(tokens.contains(&"monthly".to_string()));
        // "The" is short, "shall" is a stopword
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"shall".to_string()));
    }

    #[test]
    fn test_attribute_values_kept_whole() {
        let attrs = BTreeMap::from([("party".to_string(), "Acme Holdings LLC".to_string())]);
        let terms = derive_key_terms("Acme Holdings LLC, the Landlord", &attrs);
        assert!(terms.contains("acme holdings llc"));
    }

    #[test]
    fn test_comma_separated_attribute_split() {
        let attrs = BTreeMap::from([("key_terms".to_string(), "payment, rent".to_string())]);
        let terms = derive_key_terms("", &attrs);
        assert!(terms.contains("payment"));
        assert!(terms.contains("rent"));
    }

    #[test]
    fn test_punctuation_breaks_tokens() {
        let tokens = tokenize("rent: $1,200/month (late fee $50)");
        assert!(tokens.contains(&"rent".to_string()));
        assert!(tokens.contains(&"month".to_string()));
        // "$1,200" splits into numeric fragments below the length floor
        assert!(!tokens.iter().any(|t| t.contains('$')));
    }

    #[test]
    fn test_deterministic_ordering() {
        let attrs = BTreeMap::new();
        let a = derive_key_terms("termination notice period notice", &attrs);
        let b = derive_key_terms("notice period termination", &attrs);
        assert_eq!(a, b);
    }
}
