//! # Store Provider
//!
//! The key-value storage port the bundle cache persists through.

use async_trait::async_trait;

/// Result of a store operation
pub type StoreResult<T> = std::io::Result<T>;

/// A string-keyed, string-valued persistent store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if the key is absent
    async fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn write(&self, key: &str, value: String) -> StoreResult<()>;

    /// Remove `key`; removing an absent key succeeds
    async fn remove(&self, key: &str) -> StoreResult<()>;
}
