//! Pairwise relationship inference over the clause list
//!
//! An ordered-pair scan, O(n²) in the clause count. Fine for the tens of
//! clauses real documents produce; above `max_clauses` the mapper falls back
//! to scanning adjacent pairs only, so a pathological document cannot blow
//! up a job.
//!
//! Rules apply in priority order and the first match wins per ordered pair.
//! Targets are visited in clause-id order, so when several targets qualify
//! the lower target id is emitted first.

use lexgraph_domain::{Clause, ClauseRelationship, ClauseType, RelationshipType};
use std::collections::BTreeSet;
use tracing::warn;

/// Lexical markers that signal one clause limiting or negating another
const CONFLICT_MARKERS: &[&str] = &["notwithstanding", "except", "provided that"];

/// Tuning knobs for relationship inference
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Edges weaker than this are suppressed (boilerplate guard)
    pub min_strength: f64,

    /// Clause count above which only adjacent pairs are scanned
    pub max_clauses: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            min_strength: 0.05,
            max_clauses: 500,
        }
    }
}

/// Infer relationships with the default configuration
pub fn map_relationships(clauses: &[Clause]) -> Vec<ClauseRelationship> {
    RelationshipMapper::default().map(clauses)
}

/// Infers pairwise relationships between clauses
#[derive(Debug, Clone, Default)]
pub struct RelationshipMapper {
    config: MapperConfig,
}

impl RelationshipMapper {
    /// Create a mapper with explicit configuration
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Infer relationships for one document's clause list
    pub fn map(&self, clauses: &[Clause]) -> Vec<ClauseRelationship> {
        if clauses.len() < 2 {
            return Vec::new();
        }

        // Party names: key terms of PARTY_IDENTIFICATION clauses
        let party_terms: BTreeSet<String> = clauses
            .iter()
            .filter(|c| c.clause_type == ClauseType::PartyIdentification)
            .flat_map(|c| c.key_terms.iter().cloned())
            .collect();

        // Distinguishing terms: key terms carried by exactly one clause
        let distinguishing: Vec<BTreeSet<String>> = clauses
            .iter()
            .map(|c| {
                c.key_terms
                    .iter()
                    .filter(|term| {
                        clauses
                            .iter()
                            .filter(|other| other.key_terms.contains(*term))
                            .count()
                            == 1
                    })
                    .cloned()
                    .collect()
            })
            .collect();

        let pairs: Vec<(usize, usize)> = if clauses.len() > self.config.max_clauses {
            warn!(
                "{} clauses exceeds the pairwise bound ({}), scanning adjacent pairs only",
                clauses.len(),
                self.config.max_clauses
            );
            (0..clauses.len() - 1)
                .flat_map(|i| [(i, i + 1), (i + 1, i)])
                .collect()
        } else {
            (0..clauses.len())
                .flat_map(|i| (0..clauses.len()).map(move |j| (i, j)))
                .filter(|(i, j)| i != j)
                .collect()
        };

        let mut relationships = Vec::new();

        for (i, j) in pairs {
            let source = &clauses[i];
            let target = &clauses[j];

            let Some((relationship_type, description)) =
                infer(source, target, &party_terms, &distinguishing[j])
            else {
                continue;
            };

            let strength = edge_strength(source, target);
            if strength < self.config.min_strength {
                continue;
            }

            relationships.push(ClauseRelationship::new(
                source.clause_id.clone(),
                target.clause_id.clone(),
                relationship_type,
                description,
                strength,
            ));
        }

        relationships
    }
}

/// Apply the inference rules in priority order; first match wins
fn infer(
    source: &Clause,
    target: &Clause,
    party_terms: &BTreeSet<String>,
    target_distinguishing: &BTreeSet<String>,
) -> Option<(RelationshipType, String)> {
    let shared: Vec<&String> = source
        .key_terms
        .iter()
        .filter(|term| target.key_terms.contains(*term))
        .collect();

    // Financial terms tied to the same party: the later clause depends on
    // the earlier one
    if source.clause_type == ClauseType::FinancialTerms
        && target.clause_type == ClauseType::FinancialTerms
        && source.char_offset_start > target.char_offset_start
    {
        if let Some(party) = shared.iter().find(|term| party_terms.contains(**term)) {
            return Some((
                RelationshipType::DependsOn,
                format!("financial terms tied to the same party ({})", party),
            ));
        }
    }

    // A date clause ahead of an obligation it shares a term with sets its
    // timing
    if source.clause_type == ClauseType::DateTerm
        && target.clause_type == ClauseType::Obligation
        && source.char_offset_start < target.char_offset_start
    {
        if let Some(term) = shared.first() {
            return Some((
                RelationshipType::Precedes,
                format!("establishes timing for the obligation ({})", term),
            ));
        }
    }

    let source_text = source.clause_text.to_lowercase();

    // Overlapping terms plus a limiting marker in the source text
    if !shared.is_empty() {
        if let Some(marker) = CONFLICT_MARKERS
            .iter()
            .find(|marker| source_text.contains(*marker))
        {
            return Some((
                RelationshipType::ConflictsWith,
                format!("limits the related clause (\"{}\")", marker),
            ));
        }
    }

    // Explicit textual cross-reference to a term only the target carries
    if let Some(term) = target_distinguishing
        .iter()
        .find(|term| source_text.contains(term.as_str()))
    {
        return Some((
            RelationshipType::References,
            format!("mentions \"{}\"", term),
        ));
    }

    None
}

/// Jaccard similarity of key-term sets, floored when a rule fired without
/// lexical overlap
fn edge_strength(source: &Clause, target: &Clause) -> f64 {
    let intersection = source.key_terms.intersection(&target.key_terms).count();
    if intersection == 0 {
        return 0.1;
    }
    let union = source.key_terms.union(&target.key_terms).count();
    intersection as f64 / union as f64
}
