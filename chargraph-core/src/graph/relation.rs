//! Relations between character pairs.

use crate::graph::CharacterId;
use serde::{Deserialize, Serialize};

/// Unordered pair of character ids, used as the identity of a relation.
///
/// `PairKey::new(a, b)` and `PairKey::new(b, a)` compare equal, so a graph
/// holds at most one relation per pair regardless of endpoint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(CharacterId, CharacterId);

impl PairKey {
    pub fn new(a: CharacterId, b: CharacterId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// A relationship between two characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// One endpoint of the relationship.
    pub id1: CharacterId,
    /// The other endpoint.
    pub id2: CharacterId,
    /// Relationship-type labels, e.g. "friend", "enemy", "sibling".
    pub relation: Vec<String>,
    /// Strength of the relationship, nominally 1 (weakest) to 10 (strongest).
    pub weight: f64,
    /// Emotional valence from -1 (hostile) through 0 (neutral) to 1 (loving).
    pub positivity: f64,
}

impl Relation {
    pub fn new(
        id1: CharacterId,
        id2: CharacterId,
        label: impl Into<String>,
        weight: f64,
        positivity: f64,
    ) -> Self {
        Self {
            id1,
            id2,
            relation: vec![label.into()],
            weight,
            positivity,
        }
    }

    /// Order-insensitive identity of this relation.
    pub fn pair(&self) -> PairKey {
        PairKey::new(self.id1, self.id2)
    }

    /// Valence bucket for rendering and statistics.
    pub fn tone(&self) -> LinkTone {
        LinkTone::classify(self.positivity)
    }
}

/// Valence bucket of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTone {
    Negative,
    Neutral,
    Positive,
}

impl LinkTone {
    /// Classify a positivity value.
    ///
    /// The boundaries are exclusive: exactly -0.2 or 0.2 is neutral.
    pub fn classify(positivity: f64) -> Self {
        if positivity < -0.2 {
            LinkTone::Negative
        } else if positivity > 0.2 {
            LinkTone::Positive
        } else {
            LinkTone::Neutral
        }
    }
}
