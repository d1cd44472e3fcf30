//! Graph snapshots: the durable JSON document and its validation.

use crate::graph::{Character, CharacterId, PairKey, Relation};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// How much raw model output to quote in parse errors.
const EXCERPT_LEN: usize = 160;

/// Errors from parsing, validating, or persisting a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("model output truncated: unexpected end of input after {length} bytes (tail: ...{tail})")]
    Truncated { length: usize, tail: String },

    #[error("malformed model output: {detail} (near: {excerpt})")]
    Malformed { detail: String, excerpt: String },

    #[error("duplicate character id {0}")]
    DuplicateCharacter(CharacterId),

    #[error("relation references unknown character id {0}")]
    UnknownCharacter(CharacterId),

    #[error("relation links character {0} to itself")]
    SelfRelation(CharacterId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One complete character graph, as produced by a single iteration.
///
/// The serialized form is the interchange contract shared with the
/// visualization frontend; field order follows the struct declarations and
/// optional fields are omitted when absent, so a parsed document
/// re-serializes byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub characters: Vec<Character>,
    pub relations: Vec<Relation>,
}

impl GraphSnapshot {
    pub fn new(characters: Vec<Character>, relations: Vec<Relation>) -> Self {
        Self {
            characters,
            relations,
        }
    }

    /// Parse raw model output into a snapshot.
    ///
    /// Truncated output (the usual failure when a response hits the token
    /// limit) is reported separately from otherwise malformed output, and
    /// both carry an excerpt of the offending region.
    pub fn parse(raw: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(raw).map_err(|error| {
            if error.is_eof() {
                SnapshotError::Truncated {
                    length: raw.len(),
                    tail: tail_excerpt(raw).to_string(),
                }
            } else {
                SnapshotError::Malformed {
                    excerpt: context_excerpt(raw, error.line(), error.column()),
                    detail: error.to_string(),
                }
            }
        })
    }

    /// Repair the small liberties models take with the contract.
    ///
    /// Rejects duplicate character ids (there is no sane repair for those),
    /// then ensures each `common_name` appears in `names`, clamps
    /// positivity into [-1, 1], and collapses relations that mention the
    /// same unordered pair twice: labels are unioned in first-seen order,
    /// the larger weight wins, and the first positivity is kept.
    pub fn normalize(&mut self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::with_capacity(self.characters.len());
        for character in &self.characters {
            if !seen.insert(character.id) {
                return Err(SnapshotError::DuplicateCharacter(character.id));
            }
        }

        for character in &mut self.characters {
            character.ensure_common_name_listed();
        }

        for relation in &mut self.relations {
            relation.positivity = relation.positivity.clamp(-1.0, 1.0);
        }

        let mut by_pair: HashMap<PairKey, usize> = HashMap::new();
        let mut collapsed: Vec<Relation> = Vec::with_capacity(self.relations.len());
        for relation in self.relations.drain(..) {
            match by_pair.get(&relation.pair()) {
                Some(&index) => {
                    let existing = &mut collapsed[index];
                    for label in relation.relation {
                        if !existing.relation.contains(&label) {
                            existing.relation.push(label);
                        }
                    }
                    existing.weight = existing.weight.max(relation.weight);
                }
                None => {
                    by_pair.insert(relation.pair(), collapsed.len());
                    collapsed.push(relation);
                }
            }
        }
        self.relations = collapsed;

        Ok(())
    }

    /// Check the structural invariants of a finished snapshot: unique
    /// character ids, no self-relations, and every relation endpoint
    /// resolving to a listed character.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut ids = HashSet::with_capacity(self.characters.len());
        for character in &self.characters {
            if !ids.insert(character.id) {
                return Err(SnapshotError::DuplicateCharacter(character.id));
            }
        }

        for relation in &self.relations {
            if relation.id1 == relation.id2 {
                return Err(SnapshotError::SelfRelation(relation.id1));
            }
            for id in [relation.id1, relation.id2] {
                if !ids.contains(&id) {
                    return Err(SnapshotError::UnknownCharacter(id));
                }
            }
        }

        Ok(())
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|character| character.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Serialize in the on-disk interchange form.
    pub fn to_pretty_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a previously persisted snapshot.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let contents = fs::read_to_string(path).await?;
        let snapshot = serde_json::from_str(&contents)?;
        Ok(snapshot)
    }

    /// Persist this snapshot as pretty-printed JSON.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let json = self.to_pretty_json()?;
        fs::write(path, json).await?;
        Ok(())
    }
}

fn floor_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(s: &str, mut index: usize) -> usize {
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// The last `EXCERPT_LEN` bytes, trimmed to a character boundary.
fn tail_excerpt(raw: &str) -> &str {
    let start = ceil_boundary(raw, raw.len().saturating_sub(EXCERPT_LEN));
    &raw[start..]
}

/// A window around the position serde_json reported (1-based line/column).
fn context_excerpt(raw: &str, line: usize, column: usize) -> String {
    let Some(line_text) = raw.lines().nth(line.saturating_sub(1)) else {
        return tail_excerpt(raw).to_string();
    };
    let column = column.min(line_text.len());
    let start = floor_boundary(line_text, column.saturating_sub(EXCERPT_LEN / 2));
    let end = ceil_boundary(line_text, (column + EXCERPT_LEN / 2).min(line_text.len()));
    line_text[start..end].to_string()
}
