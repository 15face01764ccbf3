//! # File Store
//!
//! This module implements the on-device persistent store: one JSON file per key.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io;
use tracing::{debug, warn};

use super::{KeyValueStore, StoreResult};

/// Distinguishes temporary files of writes in flight, across all stores in the process
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    initialized: Arc<AtomicBool>,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn ensure_initialized(&self) -> io::Result<()> {
        // Fast path - already initialized
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        // create_dir_all is idempotent, so racing initializers are harmless
        fs::create_dir_all(&self.dir).await?;
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Keys are hashed so any URL maps to a legal file name
    fn path_for(&self, key: &str) -> PathBuf {
        let hash = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(hash)))
    }

    /// A temporary path next to `path` that no other write uses
    fn temp_path_for(path: &Path) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("{}.{}.tmp", std::process::id(), seq))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);

        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read store file");
                Err(e)
            }
        }
    }

    async fn write(&self, key: &str, value: String) -> StoreResult<()> {
        self.ensure_initialized().await?;

        let path = self.path_for(key);
        let temp_path = Self::temp_path_for(&path);

        // Each write fills its own temporary file and renames it into place, so
        // concurrent writers of one key never share a file and readers never see a torn value
        if let Err(e) = fs::write(&temp_path, value.as_bytes()).await {
            warn!(path = ?temp_path, error = %e, "Failed to write store file");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            warn!(
                from = ?temp_path,
                to = ?path,
                error = %e,
                "Failed to rename temporary store file"
            );
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        debug!(key = %key, path = ?path, "Stored value to file");
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "Removed store file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to remove store file");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_missing_key() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());

        assert_eq!(store.read("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_reads_back() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("nested").join("store");
        let store = FileStore::new(&dir);

        store
            .write("callobj_bundle_https://example.com/a.js?v=1", "value".to_string())
            .await
            .unwrap();

        assert!(dir.exists());
        assert_eq!(
            store
                .read("callobj_bundle_https://example.com/a.js?v=1")
                .await
                .unwrap()
                .as_deref(),
            Some("value")
        );
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());

        store.write("k", "first".to_string()).await.unwrap();
        store.write("k", "second".to_string()).await.unwrap();

        assert_eq!(store.read("k").await.unwrap().as_deref(), Some("second"));

        // No temporary files left behind
        let files: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());

        store.write("k", "v".to_string()).await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), None);

        // Removing again is fine
        store.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_read_error() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());

        store.write("k", "v".to_string()).await.unwrap();
        std::fs::write(store.path_for("k"), [0xff, 0xfe, 0xfd]).unwrap();

        assert!(store.read("k").await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_same_key() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let first = "a".repeat(1 << 20);
        let second = "b".repeat(1 << 20);

        for _ in 0..50 {
            let writers: Vec<_> = [first.clone(), second.clone()]
                .into_iter()
                .map(|value| {
                    let store = store.clone();
                    tokio::spawn(async move { store.write("k", value).await })
                })
                .collect();
            let reader = {
                let store = store.clone();
                tokio::spawn(async move { store.read("k").await })
            };

            for writer in writers {
                writer.await.unwrap().unwrap();
            }
            if let Some(seen) = reader.await.unwrap().unwrap() {
                assert!(seen == first || seen == second, "read a torn value");
            }

            let stored = store.read("k").await.unwrap().unwrap();
            assert!(stored == first || stored == second);
        }

        // Only the record itself is left behind
        let files: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let path = Path::new("/tmp/store/abc.json");
        let a = FileStore::temp_path_for(path);
        let b = FileStore::temp_path_for(path);

        assert_ne!(a, b);
        assert_eq!(a.parent(), path.parent());
        assert!(a.to_string_lossy().ends_with(".tmp"));
    }

    #[test]
    fn test_distinct_keys_distinct_paths() {
        let store = FileStore::new("/tmp/store");
        assert_ne!(store.path_for("a"), store.path_for("b"));
        assert_eq!(store.path_for("a"), store.path_for("a"));
        assert!(store.path_for("a").to_string_lossy().ends_with(".json"));
    }
}
