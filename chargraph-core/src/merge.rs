//! Merging a refinement response into the previous draft.
//!
//! The model receives the previous snapshot embedded in its prompt and is
//! instructed to return the complete refined graph, keeping ids stable.
//! The merge trusts that contract: identity is the model-assigned id (for
//! characters) or the unordered id pair (for relations), with no
//! independent reconciliation of names or labels. Where the response
//! speaks it wins; draft entries the response dropped are carried forward,
//! since a character introduced in one iteration stays in every later one.

use crate::graph::{Character, CharacterId, GraphSnapshot, PairKey, Relation};
use std::collections::BTreeMap;

/// Merge `response` over `draft`, producing the next snapshot.
///
/// Output order is deterministic: characters sorted by id, relations by
/// their normalized pair.
pub fn refine(draft: &GraphSnapshot, response: GraphSnapshot) -> GraphSnapshot {
    let mut characters: BTreeMap<CharacterId, Character> = draft
        .characters
        .iter()
        .cloned()
        .map(|character| (character.id, character))
        .collect();
    for character in response.characters {
        characters.insert(character.id, character);
    }

    let mut relations: BTreeMap<PairKey, Relation> = draft
        .relations
        .iter()
        .cloned()
        .map(|relation| (relation.pair(), relation))
        .collect();
    for relation in response.relations {
        relations.insert(relation.pair(), relation);
    }

    GraphSnapshot::new(
        characters.into_values().collect(),
        relations.into_values().collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Character, CharacterId, Relation};

    fn id(raw: u64) -> CharacterId {
        CharacterId::new(raw)
    }

    #[test]
    fn response_reuses_draft_ids() {
        let draft = GraphSnapshot::new(
            vec![
                Character::new(id(1), "Alice"),
                Character::new(id(2), "Bob"),
            ],
            vec![],
        );
        let response = GraphSnapshot::new(
            vec![
                Character::new(id(1), "Alice").with_alias("Ally").main(),
                Character::new(id(2), "Bob"),
                Character::new(id(3), "Carol"),
            ],
            vec![],
        );

        let merged = refine(&draft, response);

        assert_eq!(merged.characters.len(), 3);
        let alice = merged.character(id(1)).unwrap();
        assert_eq!(alice.names, vec!["Alice", "Ally"]);
        assert!(alice.main_character);
        assert_eq!(merged.character(id(3)).unwrap().common_name, "Carol");
    }

    #[test]
    fn dropped_draft_characters_are_carried_forward() {
        let draft = GraphSnapshot::new(
            vec![
                Character::new(id(1), "Alice"),
                Character::new(id(2), "Bob").with_description("A sailor."),
            ],
            vec![Relation::new(id(1), id(2), "friend", 4.0, 0.5)],
        );
        // The response forgot Bob and the friendship entirely.
        let response = GraphSnapshot::new(vec![Character::new(id(1), "Alice")], vec![]);

        let merged = refine(&draft, response);

        assert_eq!(merged.characters.len(), 2);
        assert_eq!(
            merged.character(id(2)).unwrap().description.as_deref(),
            Some("A sailor.")
        );
        assert_eq!(merged.relations.len(), 1);
        assert_eq!(merged.relations[0].relation, vec!["friend"]);
    }

    #[test]
    fn response_wins_for_shared_pairs() {
        let draft = GraphSnapshot::new(
            vec![
                Character::new(id(1), "Alice"),
                Character::new(id(2), "Bob"),
            ],
            vec![Relation::new(id(1), id(2), "acquaintance", 2.0, 0.1)],
        );
        // Same pair with endpoints reversed still counts as the same relation.
        let response = GraphSnapshot::new(
            vec![
                Character::new(id(1), "Alice"),
                Character::new(id(2), "Bob"),
            ],
            vec![Relation::new(id(2), id(1), "rival", 6.0, -0.7)],
        );

        let merged = refine(&draft, response);

        assert_eq!(merged.relations.len(), 1);
        assert_eq!(merged.relations[0].relation, vec!["rival"]);
        assert_eq!(merged.relations[0].weight, 6.0);
    }

    #[test]
    fn distinct_pairs_accumulate() {
        let draft = GraphSnapshot::new(
            vec![
                Character::new(id(1), "Alice"),
                Character::new(id(2), "Bob"),
            ],
            vec![Relation::new(id(1), id(2), "friend", 4.0, 0.5)],
        );
        let response = GraphSnapshot::new(
            vec![
                Character::new(id(1), "Alice"),
                Character::new(id(2), "Bob"),
                Character::new(id(3), "Carol"),
            ],
            vec![Relation::new(id(1), id(3), "mentor", 3.0, 0.4)],
        );

        let merged = refine(&draft, response);

        assert_eq!(merged.relations.len(), 2);
        merged.validate().unwrap();
    }

    #[test]
    fn output_order_is_deterministic() {
        let draft = GraphSnapshot::default();
        let response = GraphSnapshot::new(
            vec![
                Character::new(id(3), "Carol"),
                Character::new(id(1), "Alice"),
                Character::new(id(2), "Bob"),
            ],
            vec![
                Relation::new(id(2), id(3), "friend", 2.0, 0.3),
                Relation::new(id(1), id(2), "friend", 2.0, 0.3),
            ],
        );

        let merged = refine(&draft, response);

        let ids: Vec<u64> = merged
            .characters
            .iter()
            .map(|character| character.id.value())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(merged.relations[0].pair(), PairKey::new(id(1), id(2)));
    }
}
