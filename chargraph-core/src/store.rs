//! On-disk layout for a run's artifacts.

use crate::graph::{GraphSnapshot, SnapshotError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Writes a run's artifacts next to one output base path.
///
/// A base of `out/dracula` (or `out/dracula.json`) produces
/// `out/dracula_0.json`, `out/dracula_1.json`, ... for the per-iteration
/// snapshots, with a `.debug.txt` holding the raw model output and
/// optionally an `.svg` render beside each.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    directory: PathBuf,
    stem: String,
    extension: String,
}

impl SnapshotStore {
    /// Open a store for `base`, creating its parent directory if needed.
    pub async fn open(base: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let base = base.as_ref();
        let directory = match base.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&directory).await?;

        let Some(stem) = base.file_stem().and_then(|stem| stem.to_str()) else {
            return Err(SnapshotError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "output base has no file name",
            )));
        };
        let extension = base
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| format!(".{extension}"))
            .unwrap_or_else(|| ".json".to_string());

        Ok(Self {
            directory,
            stem: stem.to_string(),
            extension,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn snapshot_path(&self, iteration: usize) -> PathBuf {
        self.indexed(iteration, &self.extension)
    }

    pub fn debug_path(&self, iteration: usize) -> PathBuf {
        self.indexed(iteration, ".debug.txt")
    }

    pub fn image_path(&self, iteration: usize) -> PathBuf {
        self.indexed(iteration, ".svg")
    }

    fn indexed(&self, iteration: usize, suffix: &str) -> PathBuf {
        self.directory
            .join(format!("{}_{iteration}{suffix}", self.stem))
    }

    pub async fn write_snapshot(
        &self,
        iteration: usize,
        snapshot: &GraphSnapshot,
    ) -> Result<PathBuf, SnapshotError> {
        let path = self.snapshot_path(iteration);
        snapshot.save(&path).await?;
        Ok(path)
    }

    pub async fn load_snapshot(&self, iteration: usize) -> Result<GraphSnapshot, SnapshotError> {
        GraphSnapshot::load(self.snapshot_path(iteration)).await
    }

    /// Keep the raw model output verbatim for diagnosing bad iterations.
    pub async fn write_debug(&self, iteration: usize, raw: &str) -> Result<(), SnapshotError> {
        fs::write(self.debug_path(iteration), raw).await?;
        Ok(())
    }

    pub async fn write_image(&self, iteration: usize, svg: &str) -> Result<PathBuf, SnapshotError> {
        let path = self.image_path(iteration);
        fs::write(&path, svg).await?;
        Ok(path)
    }

    /// Number of snapshot slots on disk: one past the highest iteration
    /// index with a persisted snapshot, or 0 when there is none. Skipped
    /// iterations can leave holes, so the directory is scanned rather than
    /// read one index at a time.
    pub async fn iteration_span(&self) -> Result<usize, SnapshotError> {
        let mut entries = fs::read_dir(&self.directory).await?;
        let mut span = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(index) = self.parse_index(name) {
                span = span.max(index + 1);
            }
        }
        Ok(span)
    }

    fn parse_index(&self, file_name: &str) -> Option<usize> {
        let rest = file_name
            .strip_prefix(self.stem.as_str())?
            .strip_prefix('_')?;
        let digits = rest.strip_suffix(self.extension.as_str())?;
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Character, CharacterId};
    use tempfile::TempDir;

    fn snapshot() -> GraphSnapshot {
        GraphSnapshot::new(vec![Character::new(CharacterId::new(1), "Alice")], vec![])
    }

    #[tokio::test]
    async fn open_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("nested/out/book");
        let store = SnapshotStore::open(&base).await.unwrap();
        assert!(store.directory().is_dir());
        assert_eq!(store.stem(), "book");
    }

    #[tokio::test]
    async fn paths_follow_the_layout() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::open(dir.path().join("book")).await.unwrap();

        assert_eq!(
            store.snapshot_path(0),
            dir.path().join("book_0.json")
        );
        assert_eq!(
            store.debug_path(2),
            dir.path().join("book_2.debug.txt")
        );
        assert_eq!(store.image_path(1), dir.path().join("book_1.svg"));
    }

    #[tokio::test]
    async fn explicit_extension_is_kept() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::open(dir.path().join("book.json")).await.unwrap();
        assert_eq!(store.snapshot_path(3), dir.path().join("book_3.json"));
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_store() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::open(dir.path().join("book")).await.unwrap();

        let written = store.write_snapshot(0, &snapshot()).await.unwrap();
        assert!(written.is_file());
        let loaded = store.load_snapshot(0).await.unwrap();
        assert_eq!(loaded, snapshot());
    }

    #[tokio::test]
    async fn debug_output_is_verbatim() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::open(dir.path().join("book")).await.unwrap();

        store.write_debug(0, "{\"partial").await.unwrap();
        let contents = std::fs::read_to_string(store.debug_path(0)).unwrap();
        assert_eq!(contents, "{\"partial");
    }

    #[tokio::test]
    async fn iteration_span_counts_past_holes() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::open(dir.path().join("book")).await.unwrap();

        assert_eq!(store.iteration_span().await.unwrap(), 0);

        store.write_snapshot(0, &snapshot()).await.unwrap();
        store.write_snapshot(2, &snapshot()).await.unwrap();
        store.write_debug(3, "raw").await.unwrap();

        // The hole at 1 still counts toward the span; the debug file at 3
        // does not.
        assert_eq!(store.iteration_span().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn span_ignores_other_stems() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::open(dir.path().join("book")).await.unwrap();
        let other = SnapshotStore::open(dir.path().join("book_two")).await.unwrap();
        other.write_snapshot(4, &snapshot()).await.unwrap();

        assert_eq!(store.iteration_span().await.unwrap(), 0);
        assert_eq!(other.iteration_span().await.unwrap(), 5);
    }
}
