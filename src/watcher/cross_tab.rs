// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, info};
use crate::binder::FavoritesBinder;
use crate::registry::FavoritesRegistry;
use crate::watcher::traits::StorageEvent;

/// Keeps one tab consistent with writes made by the others.
///
/// Each storage event reloads the registry and re-renders the whole page
/// from it. Nothing is patched incrementally and nothing is polled.
pub struct CrossTabListener {
    registry: Arc<FavoritesRegistry>,
    binder: Arc<FavoritesBinder>,
}

impl CrossTabListener {
    pub fn new(registry: Arc<FavoritesRegistry>, binder: Arc<FavoritesBinder>) -> Self {
        Self { registry, binder }
    }

    /// Handle events until the sender side closes. Returns how many were handled.
    pub async fn run(&self, mut events: Receiver<StorageEvent>) -> usize {
        info!("Cross-tab listener started");
        let mut handled = 0;

        while let Some(event) = events.recv().await {
            self.handle(&event);
            handled += 1;
        }

        info!(handled, "Cross-tab listener stopped");
        handled
    }

    pub fn handle(&self, event: &StorageEvent) {
        let changed = self.registry.reload();
        match event {
            StorageEvent::Changed(path) => {
                debug!(path = %path.display(), changed, "Favorites changed in another tab");
            }
            StorageEvent::Removed(path) => {
                info!(path = %path.display(), changed, "Favorites removed in another tab");
            }
        }
        self.binder.refresh_all();
    }
}
