//! The book index consumed by the graph viewer.

use crate::graph::SnapshotError;
use crate::store::SnapshotStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File name of the index, kept in the same directory as the snapshots.
pub const INDEX_FILE: &str = "books.json";

/// Index of every extracted book in an output directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookIndex {
    pub books: Vec<BookEntry>,
}

/// One extracted book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    /// Display title shown by the viewer.
    pub title: String,
    /// Snapshot file stem, relative to the index.
    pub base: String,
    /// Snapshot slots to look for: `{base}_0.json` through `{base}_{n-1}.json`.
    pub iterations: usize,
}

impl BookIndex {
    /// Load an index, treating a missing file as an empty index.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        match fs::read_to_string(path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(error.into()),
        }
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await?;
        Ok(())
    }

    /// Insert or update the entry whose `base` matches.
    pub fn upsert(&mut self, title: impl Into<String>, base: impl Into<String>, iterations: usize) {
        let title = title.into();
        let base = base.into();
        if let Some(entry) = self.books.iter_mut().find(|entry| entry.base == base) {
            entry.title = title;
            entry.iterations = iterations;
        } else {
            self.books.push(BookEntry {
                title,
                base,
                iterations,
            });
        }
    }
}

/// Where the index for a store's directory lives.
pub fn index_path(store: &SnapshotStore) -> PathBuf {
    store.directory().join(INDEX_FILE)
}

/// Record a finished run in the index next to its snapshots.
pub async fn record_run(store: &SnapshotStore, title: &str) -> Result<(), SnapshotError> {
    let iterations = store.iteration_span().await?;
    let path = index_path(store);
    let mut index = BookIndex::load(&path).await?;
    index.upsert(title, store.stem(), iterations);
    index.save(&path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Character, CharacterId, GraphSnapshot};
    use tempfile::TempDir;

    #[test]
    fn upsert_inserts_then_updates() {
        let mut index = BookIndex::default();
        index.upsert("Dracula", "dracula", 2);
        index.upsert("Emma", "emma", 1);
        assert_eq!(index.books.len(), 2);

        index.upsert("Dracula (revised)", "dracula", 5);
        assert_eq!(index.books.len(), 2);
        assert_eq!(index.books[0].title, "Dracula (revised)");
        assert_eq!(index.books[0].iterations, 5);
    }

    #[tokio::test]
    async fn load_missing_index_is_empty() {
        let dir = TempDir::new().unwrap();
        let index = BookIndex::load(dir.path().join(INDEX_FILE)).await.unwrap();
        assert!(index.books.is_empty());
    }

    #[tokio::test]
    async fn record_run_reflects_persisted_snapshots() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::open(dir.path().join("dracula")).await.unwrap();
        let snapshot =
            GraphSnapshot::new(vec![Character::new(CharacterId::new(1), "Mina")], vec![]);
        store.write_snapshot(0, &snapshot).await.unwrap();
        store.write_snapshot(1, &snapshot).await.unwrap();

        record_run(&store, "Dracula").await.unwrap();

        let index = BookIndex::load(index_path(&store)).await.unwrap();
        assert_eq!(index.books.len(), 1);
        assert_eq!(index.books[0].base, "dracula");
        assert_eq!(index.books[0].iterations, 2);

        // A second run over the same base updates in place.
        store.write_snapshot(2, &snapshot).await.unwrap();
        record_run(&store, "Dracula").await.unwrap();
        let index = BookIndex::load(index_path(&store)).await.unwrap();
        assert_eq!(index.books.len(), 1);
        assert_eq!(index.books[0].iterations, 3);
    }
}
