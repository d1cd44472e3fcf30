//! Summary statistics over a snapshot, for end-of-iteration logs.

use crate::graph::{CharacterId, GraphSnapshot, LinkTone};
use std::collections::HashMap;
use std::fmt;

/// How many of the best-connected characters to name.
const TOP_CONNECTED: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub characters: usize,
    pub main_characters: usize,
    pub relations: usize,
    /// Characters with no relation at all.
    pub isolated: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub mean_weight: f64,
    /// Highest-degree characters as (common_name, degree), best first.
    pub most_connected: Vec<(String, usize)>,
}

impl GraphStats {
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        let mut degrees: HashMap<CharacterId, usize> = HashMap::new();
        let mut positive = 0;
        let mut neutral = 0;
        let mut negative = 0;
        let mut total_weight = 0.0;

        for relation in &snapshot.relations {
            *degrees.entry(relation.id1).or_default() += 1;
            *degrees.entry(relation.id2).or_default() += 1;
            total_weight += relation.weight;
            match relation.tone() {
                LinkTone::Positive => positive += 1,
                LinkTone::Neutral => neutral += 1,
                LinkTone::Negative => negative += 1,
            }
        }

        let mean_weight = if snapshot.relations.is_empty() {
            0.0
        } else {
            total_weight / snapshot.relations.len() as f64
        };

        let isolated = snapshot
            .characters
            .iter()
            .filter(|character| !degrees.contains_key(&character.id))
            .count();

        let mut most_connected: Vec<(String, usize)> = snapshot
            .characters
            .iter()
            .filter_map(|character| {
                degrees
                    .get(&character.id)
                    .map(|&degree| (character.common_name.clone(), degree))
            })
            .collect();
        most_connected.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        most_connected.truncate(TOP_CONNECTED);

        Self {
            characters: snapshot.characters.len(),
            main_characters: snapshot
                .characters
                .iter()
                .filter(|character| character.main_character)
                .count(),
            relations: snapshot.relations.len(),
            isolated,
            positive,
            neutral,
            negative,
            mean_weight,
            most_connected,
        }
    }
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} characters ({} main, {} isolated), {} relations ({} positive, {} neutral, {} negative), mean weight {:.1}",
            self.characters,
            self.main_characters,
            self.isolated,
            self.relations,
            self.positive,
            self.neutral,
            self.negative,
            self.mean_weight,
        )?;
        if !self.most_connected.is_empty() {
            write!(f, "; most connected: ")?;
            for (index, (name, degree)) in self.most_connected.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{name} ({degree})")?;
            }
        }
        Ok(())
    }
}
