//! Merge overlapping raw extractions into single candidates
//!
//! Overlapping windows and multiple passes both produce duplicate sightings
//! of the same clause. Two candidates are the same clause when their classes
//! match and their spans overlap by more than half of the shorter span. The
//! merge keeps the higher-confidence span and takes the max confidence -
//! corroboration must never dilute a strong match.

use crate::types::CandidateClause;

/// Merge duplicate candidates; output is sorted by (start, end, type)
pub(crate) fn merge_candidates(mut candidates: Vec<CandidateClause>) -> Vec<CandidateClause> {
    candidates.sort_by(|a, b| {
        (a.char_start, a.char_end, a.clause_type).cmp(&(b.char_start, b.char_end, b.clause_type))
    });

    let mut merged: Vec<CandidateClause> = Vec::new();

    'candidates: for candidate in candidates {
        for existing in merged.iter_mut() {
            if is_same_clause(existing, &candidate) {
                merge_into(existing, candidate);
                continue 'candidates;
            }
        }
        merged.push(candidate);
    }

    merged.sort_by(|a, b| {
        (a.char_start, a.char_end, a.clause_type).cmp(&(b.char_start, b.char_end, b.clause_type))
    });
    merged
}

/// Same clause: matching class and >50%-of-shorter-span overlap
fn is_same_clause(a: &CandidateClause, b: &CandidateClause) -> bool {
    if a.clause_type != b.clause_type {
        return false;
    }
    let overlap = overlap_chars(a, b);
    let shorter = a.span_len().min(b.span_len());
    shorter > 0 && overlap * 2 > shorter
}

fn overlap_chars(a: &CandidateClause, b: &CandidateClause) -> usize {
    let start = a.char_start.max(b.char_start);
    let end = a.char_end.min(b.char_end);
    end.saturating_sub(start)
}

/// Fold `incoming` into `existing`: union key terms, max confidence, and
/// keep the span of the stronger sighting (ties go to the longer span)
fn merge_into(existing: &mut CandidateClause, incoming: CandidateClause) {
    let incoming_wins = incoming.confidence > existing.confidence
        || (incoming.confidence == existing.confidence
            && incoming.span_len() > existing.span_len());

    existing.key_terms.extend(incoming.key_terms.iter().cloned());
    existing.confidence = existing.confidence.max(incoming.confidence);

    if incoming_wins {
        existing.text = incoming.text;
        existing.char_start = incoming.char_start;
        existing.char_end = incoming.char_end;
    }
}
