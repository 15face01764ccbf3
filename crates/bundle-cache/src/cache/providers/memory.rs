//! # Memory Store
//!
//! In-process store, used for ephemeral sessions and as a test double.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::{KeyValueStore, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn write(&self, key: &str, value: String) -> StoreResult<()> {
        self.entries.write().insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        if self.entries.write().remove(key).is_some() {
            debug!(key = %key, "Removed entry from memory store");
        }
        Ok(())
    }
}
