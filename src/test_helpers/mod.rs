// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use crate::config::Config;
use crate::registry::models::{merge_favorites, PlaceId};
use crate::registry::FavoritesRegistry;
use crate::store::{LocalStore, MemoryStorage, DEFAULT_STORAGE_KEY};
use crate::sync::traits::{SyncError, SyncService, ToggleResponse};

pub fn ids(values: &[u64]) -> Vec<PlaceId> {
    values
        .iter()
        .map(|v| PlaceId::new(*v).expect("test ids must be positive"))
        .collect()
}

/// Registry over a fresh in-memory storage area; the storage handle is
/// returned so tests can inspect or share it
pub fn setup_test_registry() -> (MemoryStorage, Arc<FavoritesRegistry>) {
    let storage = MemoryStorage::new();
    let store = LocalStore::new(Arc::new(storage.clone()), DEFAULT_STORAGE_KEY);
    (storage, Arc::new(FavoritesRegistry::new(store)))
}

/// Create a test configuration with temporary paths
pub fn create_test_config() -> Config {
    Config {
        storage_dir: std::env::temp_dir().join("marica-favorites-test"),
        storage_key: DEFAULT_STORAGE_KEY.to_string(),
        storage_quota_bytes: None,
        backend_api_url: "http://localhost:8000/explore/".to_string(),
        csrf_token: None,
        session_cookie: None,
        authenticated: false,
        request_timeout_secs: 5,
        log_level: "error".to_string(), // Reduce log noise in tests
        log_json: false,
    }
}

/// In-memory stand-in for the backend
#[derive(Default)]
pub struct FakeSyncService {
    remote: Mutex<Vec<PlaceId>>,
    pushes: Mutex<Vec<Vec<PlaceId>>>,
    toggles: Mutex<Vec<PlaceId>>,
    failing: AtomicBool,
}

impl FakeSyncService {
    pub fn with_remote(remote: &[u64]) -> Self {
        Self {
            remote: Mutex::new(ids(remote)),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn remote(&self) -> Vec<PlaceId> {
        self.remote.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<Vec<PlaceId>> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn toggles(&self) -> Vec<PlaceId> {
        self.toggles.lock().unwrap().clone()
    }

    fn check_failing(&self) -> Result<(), SyncError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "backend down".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SyncService for FakeSyncService {
    async fn sync_favorites(&self, favorites: Vec<PlaceId>) -> Result<Vec<PlaceId>, SyncError> {
        self.check_failing()?;
        self.pushes.lock().unwrap().push(favorites.clone());

        let mut remote = self.remote.lock().unwrap();
        let merged = merge_favorites(&remote, &favorites);
        *remote = merged.clone();
        Ok(merged)
    }

    async fn fetch_favorites(&self) -> Result<Vec<PlaceId>, SyncError> {
        self.check_failing()?;
        Ok(self.remote())
    }

    async fn toggle_favorite(&self, id: PlaceId) -> Result<ToggleResponse, SyncError> {
        self.check_failing()?;
        self.toggles.lock().unwrap().push(id);

        let mut remote = self.remote.lock().unwrap();
        let is_favorited = match remote.iter().position(|r| *r == id) {
            Some(index) => {
                remote.remove(index);
                false
            }
            None => {
                remote.push(id);
                true
            }
        };

        Ok(ToggleResponse {
            success: true,
            is_favorited: Some(is_favorited),
            favorites_count: None,
            message: None,
        })
    }
}
