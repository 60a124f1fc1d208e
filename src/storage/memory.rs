use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::{SessionStorage, StorageBatch, StorageError};

/// Process-local storage. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn snapshot(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let entries = self.entries.read().await;
        Ok(keys.iter().map(|key| entries.get(*key).cloned()).collect())
    }

    async fn apply(&self, batch: StorageBatch) -> Result<(), StorageError> {
        // One write guard per batch: readers see all or nothing
        let mut entries = self.entries.write().await;
        batch.apply_to(&mut entries);
        Ok(())
    }
}
