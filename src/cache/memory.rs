//! In-memory cache backend.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{CacheEntry, CacheStore, StoreError};

/// Process-wide store backed by a locked map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".to_string())
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let slots = self.slots.read().map_err(|_| Self::poisoned())?;
        Ok(slots.get(key).cloned())
    }

    fn save(&self, key: &str, entry: &CacheEntry) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| Self::poisoned())?;
        slots.insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut slots = self.slots.write().map_err(|_| Self::poisoned())?;
        Ok(slots.remove(key).is_some())
    }
}
