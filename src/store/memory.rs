// SPDX-License-Identifier: GPL-3.0-only
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use crate::store::traits::{ensure_fits, StorageArea, StoreError};

/// In-process storage area for sessions that must not touch the disk.
///
/// Clones share the same underlying map, so several registries built from
/// clones behave like tabs of one origin. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse values longer than `quota` bytes, like a full browser store
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }
}

impl StorageArea for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        ensure_fits(value, self.quota)?;

        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
