// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use crate::registry::models::{merge_favorites, PlaceId};
use crate::registry::FavoritesRegistry;
use crate::sync::traits::{SyncError, SyncService};

/// Reconciles a registry with the backend for an authenticated session.
///
/// Local favorites keep working without it: every failure leaves the
/// registry untouched and is only logged.
pub struct FavoritesSync {
    registry: Arc<FavoritesRegistry>,
    service: Arc<dyn SyncService>,
}

impl FavoritesSync {
    pub fn new(registry: Arc<FavoritesRegistry>, service: Arc<dyn SyncService>) -> Self {
        Self { registry, service }
    }

    /// Send the local favorites and adopt the merged list the backend returns
    pub async fn push(&self) -> Result<Vec<PlaceId>, SyncError> {
        let local = self.registry.snapshot();

        match self.service.sync_favorites(local).await {
            Ok(merged) => Ok(self.registry.replace(merged)),
            Err(e) => {
                warn!(error = %e, "Favorites push failed, keeping local favorites");
                Err(e)
            }
        }
    }

    /// Fetch the backend's favorites and merge them into the local list
    pub async fn pull(&self) -> Result<Vec<PlaceId>, SyncError> {
        let remote = match self.service.fetch_favorites().await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, "Favorites pull failed, keeping local favorites");
                return Err(e);
            }
        };

        // Merge against the list as it is now, not as it was when the request started
        let merged = merge_favorites(&self.registry.snapshot(), &remote);
        info!(remote = remote.len(), merged = merged.len(), "Merged favorites from backend");

        Ok(self.registry.replace(merged))
    }

    /// Notify the backend that `id` was toggled. Failures are logged and returned.
    pub async fn toggle_remote(&self, id: PlaceId) -> Result<(), SyncError> {
        match self.service.toggle_favorite(id).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(
                    place_id = %id,
                    error = %e,
                    "Backend toggle failed, local favorites unchanged"
                );
                Err(e)
            }
        }
    }

    /// Fire-and-forget [`toggle_remote`](Self::toggle_remote) on a detached task.
    /// No retry; the local state stays authoritative whatever happens.
    pub fn spawn_toggle_remote(self: &Arc<Self>, id: PlaceId) -> JoinHandle<()> {
        let sync = Arc::clone(self);
        tokio::spawn(async move {
            let _ = sync.toggle_remote(id).await;
        })
    }
}
