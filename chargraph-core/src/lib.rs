//! Character-relationship graph extraction from long texts.
//!
//! A large-context model reads a complete text and produces a graph of its
//! characters and their relationships as structured JSON. The graph is
//! refined over repeated passes: each iteration feeds the previous
//! snapshot back to the model as a draft, merges the reply over it, and
//! persists the result, so every pass can only grow what earlier passes
//! found.
//!
//! ```ignore
//! use chargraph_core::{Extractor, ExtractorConfig, SnapshotStore};
//! use llmclient::{Client, Provider};
//!
//! let client = Client::from_env(Provider::Gemini)?;
//! let store = SnapshotStore::open("out/dracula").await?;
//! let config = ExtractorConfig::new().with_iterations(3);
//! let report = Extractor::new(client, config).run(&text, &store).await?;
//! println!("{} snapshots written", report.completed());
//! ```

pub mod extract;
pub mod graph;
pub mod index;
pub mod merge;
pub mod model;
pub mod prompt;
pub mod render;
pub mod schema;
pub mod stats;
pub mod store;
pub mod testing;

pub use extract::{
    ExtractError, Extractor, ExtractorConfig, FailureMode, IterationError, IterationOutcome,
    RunReport,
};
pub use graph::{Character, CharacterId, GraphSnapshot, LinkTone, Relation, SnapshotError};
pub use index::BookIndex;
pub use model::TextModel;
pub use schema::SchemaOptions;
pub use stats::GraphStats;
pub use store::SnapshotStore;
