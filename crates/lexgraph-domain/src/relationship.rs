//! Relationship module - pairwise connections between clauses

use serde::{Deserialize, Serialize};

/// Type of inferred relationship between two clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// One clause textually refers to another
    References,

    /// One clause alters the effect of another
    Modifies,

    /// One clause limits or negates another
    ConflictsWith,

    /// One clause establishes timing for another
    Precedes,

    /// One clause's effect is conditioned on another
    DependsOn,
}

impl RelationshipType {
    /// Get the relationship type name as a string (stable wire tag)
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::References => "REFERENCES",
            RelationshipType::Modifies => "MODIFIES",
            RelationshipType::ConflictsWith => "CONFLICTS_WITH",
            RelationshipType::Precedes => "PRECEDES",
            RelationshipType::DependsOn => "DEPENDS_ON",
        }
    }

    /// Parse a relationship type from its wire tag
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "REFERENCES" => Some(RelationshipType::References),
            "MODIFIES" => Some(RelationshipType::Modifies),
            "CONFLICTS_WITH" => Some(RelationshipType::ConflictsWith),
            "PRECEDES" => Some(RelationshipType::Precedes),
            "DEPENDS_ON" => Some(RelationshipType::DependsOn),
            _ => None,
        }
    }
}

/// A pairwise relationship between two clauses of the same document
///
/// Invariant: `source_clause_id != target_clause_id`, and both ids exist in
/// the clause list the relationship was inferred from. The mapper enforces
/// both by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseRelationship {
    /// Clause the relationship originates from
    pub source_clause_id: String,

    /// Clause the relationship points at
    pub target_clause_id: String,

    /// Type of relationship
    pub relationship_type: RelationshipType,

    /// Human-readable summary of why the edge exists
    pub relationship_description: String,

    /// Strength of the relationship in [0, 1]
    pub strength: f64,
}

impl ClauseRelationship {
    /// Create a new relationship
    ///
    /// # Panics
    /// Panics if source and target are the same clause or strength is outside
    /// [0, 1] - both are construction bugs, not runtime conditions.
    pub fn new(
        source_clause_id: impl Into<String>,
        target_clause_id: impl Into<String>,
        relationship_type: RelationshipType,
        relationship_description: impl Into<String>,
        strength: f64,
    ) -> Self {
        let source_clause_id = source_clause_id.into();
        let target_clause_id = target_clause_id.into();
        assert_ne!(
            source_clause_id, target_clause_id,
            "Relationship must connect two distinct clauses"
        );
        assert!(
            (0.0..=1.0).contains(&strength),
            "Strength must be in [0, 1]"
        );

        Self {
            source_clause_id,
            target_clause_id,
            relationship_type,
            relationship_description: relationship_description.into(),
            strength,
        }
    }
}
