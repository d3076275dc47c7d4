use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StorageError;
use crate::types::{sorted_ids, ContentKind, Identifier, SeenSet};

/// Durable per-kind record of already announced identifiers.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns the persisted set, creating an empty record first if none exists.
    async fn load(&self, kind: ContentKind) -> Result<SeenSet, StorageError>;
    /// Replaces the persisted set; a failed save leaves the previous record intact.
    async fn save(&self, kind: ContentKind, seen: &SeenSet) -> Result<(), StorageError>;
}

/// One JSON array file per kind inside a state directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn path_for(&self, kind: ContentKind) -> PathBuf {
        let name = match kind { ContentKind::Vod => "vod_ids.json", ContentKind::Series => "series_ids.json" };
        self.dir.join(name)
    }

    async fn read_set(path: &Path) -> Result<SeenSet, StorageError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| StorageError::io(path, e))?;
        // Older files may hold duplicates; set semantics collapse them
        let ids: Vec<Identifier> = serde_json::from_str(&raw)
            .map_err(|source| StorageError::Parse { path: path.to_path_buf(), source })?;
        Ok(ids.into_iter().collect())
    }

    async fn write_set(&self, path: &Path, seen: &SeenSet) -> Result<(), StorageError> {
        let payload = serde_json::to_vec(&sorted_ids(seen))
            .map_err(|source| StorageError::Encode { path: path.to_path_buf(), source })?;
        let (dir, target) = (self.dir.clone(), path.to_path_buf());
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &payload))
            .await
            .map_err(|e| StorageError::io(path, std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    /// Reads the record for `kind` without creating anything; `None` when nothing was saved yet.
    pub async fn peek(&self, kind: ContentKind) -> Result<Option<SeenSet>, StorageError> {
        let path = self.path_for(kind);
        if !tokio::fs::try_exists(&path).await.map_err(|e| StorageError::io(&path, e))? {
            return Ok(None);
        }
        Self::read_set(&path).await.map(Some)
    }
}

/// Writes `payload` to a temp file next to `path`, syncs it, then renames it over `path`.
fn write_atomic(dir: &Path, path: &Path, payload: &[u8]) -> Result<(), StorageError> {
    std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
    // Temp file in the same directory so the final rename stays on one filesystem
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
    tmp.write_all(payload).map_err(|e| StorageError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| StorageError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StorageError::Persist { path: path.to_path_buf(), source: e.error })?;
    Ok(())
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self, kind: ContentKind) -> Result<SeenSet, StorageError> {
        let path = self.path_for(kind);
        match tokio::fs::metadata(&path).await {
            Ok(_) => Self::read_set(&path).await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(kind = %kind, path = %path.display(), "no state yet, creating empty record");
                let empty = SeenSet::new();
                self.write_set(&path, &empty).await?;
                Ok(empty)
            }
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    async fn save(&self, kind: ContentKind, seen: &SeenSet) -> Result<(), StorageError> {
        let path = self.path_for(kind);
        self.write_set(&path, seen).await?;
        debug!(kind = %kind, count = seen.len(), "state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(items: &[&str]) -> SeenSet { items.iter().map(|s| Identifier::from(*s)).collect() }

    #[tokio::test]
    async fn load_creates_empty_record() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("state"));
        let seen = store.load(ContentKind::Vod).await.unwrap();
        assert!(seen.is_empty());
        let raw = std::fs::read_to_string(store.path_for(ContentKind::Vod)).unwrap();
        assert_eq!(raw, "[]");
        assert!(!store.path_for(ContentKind::Series).exists());
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path());
        store.save(ContentKind::Series, &ids(&["a", "b"])).await.unwrap();
        let first = store.load(ContentKind::Series).await.unwrap();
        let second = store.load(ContentKind::Series).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, ids(&["a", "b"]));
    }

    #[tokio::test]
    async fn save_round_trips_mixed_ids() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path());
        let seen: SeenSet = [Identifier::Int(7), Identifier::from("7"), Identifier::from("x")].into_iter().collect();
        store.save(ContentKind::Vod, &seen).await.unwrap();
        assert_eq!(store.load(ContentKind::Vod).await.unwrap(), seen);
        let raw = std::fs::read_to_string(store.path_for(ContentKind::Vod)).unwrap();
        assert_eq!(raw, r#"[7,"7","x"]"#);
    }

    #[tokio::test]
    async fn duplicates_on_disk_collapse() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path());
        std::fs::write(store.path_for(ContentKind::Vod), "[1, 2, 2, 1]").unwrap();
        let seen = store.load(ContentKind::Vod).await.unwrap();
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path());
        std::fs::write(store.path_for(ContentKind::Series), "{not json").unwrap();
        let err = store.load(ContentKind::Series).await.unwrap_err();
        assert!(matches!(err, StorageError::Parse { .. }));
    }

    #[tokio::test]
    async fn failed_persist_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path());

        // A non-empty directory at the target path makes the final rename fail
        std::fs::create_dir_all(store.path_for(ContentKind::Vod)).unwrap();
        std::fs::write(store.path_for(ContentKind::Vod).join("keep"), "x").unwrap();
        let err = store.save(ContentKind::Vod, &ids(&["a", "b"])).await.unwrap_err();
        assert!(matches!(err, StorageError::Persist { .. }));

        let leftovers: Vec<_> = std::fs::read_dir(store.dir()).unwrap().filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp")).collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn large_numeric_ids_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path());
        std::fs::write(store.path_for(ContentKind::Vod), "[18446744073709551615, -3, 12]").unwrap();
        let seen = store.load(ContentKind::Vod).await.unwrap();
        assert!(seen.contains(&Identifier::UInt(u64::MAX)));
        store.save(ContentKind::Vod, &seen).await.unwrap();
        let raw = std::fs::read_to_string(store.path_for(ContentKind::Vod)).unwrap();
        assert_eq!(raw, "[-3,12,18446744073709551615]");
        assert_eq!(store.load(ContentKind::Vod).await.unwrap(), seen);
    }

    #[tokio::test]
    async fn peek_does_not_create_records() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("state"));
        assert!(store.peek(ContentKind::Series).await.unwrap().is_none());
        assert!(!store.dir().exists());

        store.save(ContentKind::Series, &ids(&["s"])).await.unwrap();
        assert_eq!(store.peek(ContentKind::Series).await.unwrap(), Some(ids(&["s"])));
    }

    #[test]
    fn encode_error_names_encoding() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = StorageError::Encode { path: PathBuf::from("/state/vod_ids.json"), source };
        assert!(err.to_string().starts_with("could not encode state for /state/vod_ids.json"));
    }
}
