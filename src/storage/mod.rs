//! Durable key/value storage for session state.
//!
//! [`SessionStorage`] plays the role of browser `localStorage`: string keys,
//! string values, surviving restarts when the backend is durable. Writes go
//! through a [`StorageBatch`] that backends must apply atomically, so the
//! `token` and `user` keys are never observed half-written.

#[cfg(feature = "file-store")]
mod file;
mod memory;

use std::future::Future;

#[cfg(feature = "file-store")]
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Error type returned by storage backends.
pub type StorageError = Box<dyn std::error::Error + Send + Sync>;

/// A single write operation inside a [`StorageBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Set { key: String, value: String },
    Remove { key: String },
}

/// Ordered group of writes applied as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageBatch {
    ops: Vec<StorageOp>,
}

impl StorageBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(StorageOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.ops.push(StorageOp::Remove { key: key.into() });
        self
    }

    #[must_use]
    pub fn ops(&self) -> &[StorageOp] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply the batch to an in-memory map, in order.
    pub(crate) fn apply_to(self, entries: &mut std::collections::BTreeMap<String, String>) {
        for op in self.ops {
            match op {
                StorageOp::Set { key, value } => {
                    entries.insert(key, value);
                }
                StorageOp::Remove { key } => {
                    entries.remove(&key);
                }
            }
        }
    }
}

/// Consumer-provided session persistence.
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStorage for KeyringStorage {
///     async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
///         Ok(self.keyring.read(key)?)
///     }
///
///     async fn snapshot(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
///         let view = self.keyring.read_view()?;
///         keys.iter().map(|key| Ok(view.read(key)?)).collect()
///     }
///
///     async fn apply(&self, batch: StorageBatch) -> Result<(), StorageError> {
///         self.keyring.transaction(|tx| batch.ops().iter().try_for_each(|op| tx.apply(op)))?;
///         Ok(())
///     }
/// }
/// ```
pub trait SessionStorage: Send + Sync + 'static {
    /// Read a single key. Returns `None` if the key is absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Read several keys from one consistent view of the store.
    ///
    /// Values come back in the order of `keys`. A concurrent batch is either
    /// fully visible or not visible at all.
    fn snapshot(
        &self,
        keys: &[&str],
    ) -> impl Future<Output = Result<Vec<Option<String>>, StorageError>> + Send;

    /// Apply every operation in `batch`, or none of them.
    fn apply(&self, batch: StorageBatch) -> impl Future<Output = Result<(), StorageError>> + Send;
}
