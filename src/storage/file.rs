use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::{SessionStorage, StorageBatch, StorageError};

/// Session storage backed by a JSON object file.
///
/// Survives process restarts. Each batch rewrites the whole file through a
/// sibling temp file and a rename, so a crash mid-write leaves the previous
/// contents intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`load`](Self::load), but an unparsable file counts as empty.
    ///
    /// Used before writes: the batch rewrites the file, so stale garbage must
    /// not block a new session.
    async fn load_for_write(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.load().await {
            Err(e) if e.is::<serde_json::Error>() => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Discarding unreadable session file"
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    async fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut entries = self.load().await?;
        Ok(entries.remove(key))
    }

    async fn snapshot(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        // One load: the file is only ever replaced by rename, never edited in place
        let mut entries = self.load().await?;
        Ok(keys.iter().map(|key| entries.remove(*key)).collect())
    }

    async fn apply(&self, batch: StorageBatch) -> Result<(), StorageError> {
        if batch.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_for_write().await?;
        batch.apply_to(&mut entries);
        self.store(&entries).await
    }
}
