//! The typed character graph: characters, relations, and snapshots.

mod character;
mod relation;
mod snapshot;

pub use character::{Character, CharacterId};
pub use relation::{LinkTone, PairKey, Relation};
pub use snapshot::{GraphSnapshot, SnapshotError};
