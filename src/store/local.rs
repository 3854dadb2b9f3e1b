// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tracing::{debug, error, warn};
use crate::registry::models::{dedup_favorites, PlaceId};
use crate::store::traits::{StorageArea, StoreError};

/// Key the favorites list is stored under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "marica_favorites";

/// The favorites list as stored in a [`StorageArea`]: a JSON array of ids
/// under one fixed key. Never fails towards its caller.
#[derive(Clone)]
pub struct LocalStore {
    area: Arc<dyn StorageArea>,
    key: String,
}

impl LocalStore {
    pub fn new(area: Arc<dyn StorageArea>, key: impl Into<String>) -> Self {
        Self {
            area,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored favorites; empty when missing, corrupt, or unreadable
    pub fn read(&self) -> Vec<PlaceId> {
        match self.try_read() {
            Ok(favorites) => favorites,
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to read favorites from storage");
                Vec::new()
            }
        }
    }

    /// Replace the stored list. Returns whether the value was persisted; a
    /// failure is logged and otherwise ignored.
    pub fn write(&self, favorites: &[PlaceId]) -> bool {
        match self.try_write(favorites) {
            Ok(()) => {
                debug!(key = %self.key, count = favorites.len(), "Persisted favorites");
                true
            }
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to save favorites to storage");
                false
            }
        }
    }

    fn try_read(&self) -> Result<Vec<PlaceId>, StoreError> {
        match self.area.get_item(&self.key)? {
            Some(text) => Ok(decode_record(&text)?),
            None => Ok(Vec::new()),
        }
    }

    fn try_write(&self, favorites: &[PlaceId]) -> Result<(), StoreError> {
        let text = serde_json::to_string(favorites)?;
        self.area.set_item(&self.key, &text)
    }
}

/// Decode a stored record.
///
/// The document must be a JSON array. Positive integers are kept, including
/// ones written in float form such as `12.0`. Anything else (older clients
/// stored `null` for ids they failed to parse) is dropped, as are repeated ids.
pub fn decode_record(text: &str) -> Result<Vec<PlaceId>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    let total = values.len();

    let favorites = dedup_favorites(values.iter().filter_map(stored_place_id));

    if favorites.len() != total {
        warn!(
            stored = total,
            kept = favorites.len(),
            "Dropped invalid or repeated entries from stored favorites"
        );
    }

    Ok(favorites)
}

fn stored_place_id(value: &serde_json::Value) -> Option<PlaceId> {
    let id = match value.as_u64() {
        Some(id) => id,
        None => {
            let float = value.as_f64()?;
            // Integral and within u64; the cast is exact for these
            if float.fract() != 0.0 || float < 1.0 || float >= u64::MAX as f64 {
                return None;
            }
            float as u64
        }
    };
    PlaceId::new(id)
}
