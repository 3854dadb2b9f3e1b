// SPDX-License-Identifier: GPL-3.0-only
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("stored value is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("storage quota exceeded ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded { needed: usize, quota: usize },
}

/// Origin-scoped key/value text storage shared by every registry attached to it.
///
/// Writes replace the whole value of a key; there are no partial updates.
pub trait StorageArea: Send + Sync {
    /// Read the value stored under `key`, `None` if it was never written
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Reject a value larger than `quota` bytes; no quota accepts anything
pub fn ensure_fits(value: &str, quota: Option<usize>) -> Result<(), StoreError> {
    match quota {
        Some(quota) if value.len() > quota => Err(StoreError::QuotaExceeded {
            needed: value.len(),
            quota,
        }),
        _ => Ok(()),
    }
}
