// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use crate::binder::traits::{ButtonAppearance, FavoriteControl, FavoritesView};
use crate::registry::models::{IntoPlaceId, PlaceId};
use crate::registry::FavoritesRegistry;
use crate::sync::FavoritesSync;

/// Projects a registry onto a page and turns button clicks into registry calls.
///
/// Holds no favorites state of its own; every render reads the registry.
pub struct FavoritesBinder {
    registry: Arc<FavoritesRegistry>,
    view: Arc<dyn FavoritesView>,
    sync: Option<Arc<FavoritesSync>>,
}

impl FavoritesBinder {
    pub fn new(
        registry: Arc<FavoritesRegistry>,
        view: Arc<dyn FavoritesView>,
        sync: Option<Arc<FavoritesSync>>,
    ) -> Self {
        Self { registry, view, sync }
    }

    /// Render every button and the total badge from the registry
    pub fn refresh_all(&self) {
        let controls = self.view.controls();
        for control in &controls {
            if let Some(id) = control_place_id(&**control) {
                control.render(ButtonAppearance::for_state(self.registry.is_favorited(id)));
            }
        }

        self.update_total();
        debug!(controls = controls.len(), "Refreshed favorites view");
    }

    /// Render the page, then merge the backend's favorites in for a logged-in
    /// session and render again. A failed merge leaves the first render.
    pub async fn initialize(&self) {
        self.refresh_all();

        if !self.view.is_authenticated() {
            return;
        }

        if let Some(ref sync) = self.sync {
            if sync.pull().await.is_ok() {
                self.refresh_all();
            }
        }
    }

    /// Toggle the place behind `control`.
    ///
    /// The backend notification, if any, is started but not awaited; its
    /// handle is returned for callers that must outlive it.
    pub fn handle_click(&self, control: &dyn FavoriteControl) -> Option<JoinHandle<()>> {
        let Some(id) = control_place_id(control) else {
            error!("No place ID found on favorite button");
            return None;
        };

        control.set_disabled(true);

        let now_favorited = self.registry.toggle(id);
        control.render(ButtonAppearance::for_state(now_favorited));
        self.view.adjust_place_count(id, if now_favorited { 1 } else { -1 });
        self.update_total();

        let pending = self.notify_backend(id);

        control.set_disabled(false);
        pending
    }

    /// Remove the place behind a favorites-page button and take its card away
    pub fn handle_remove(&self, control: &dyn FavoriteControl) -> Option<JoinHandle<()>> {
        let id = control_place_id(control)?;

        self.registry.remove(id);
        control.dismiss();
        self.update_total();

        if self.view.controls().is_empty() {
            info!("Last favorite removed from page");
            self.view.show_empty_state();
        }

        self.notify_backend(id)
    }

    /// Dispatch a click to toggle or remove depending on the button
    pub fn dispatch(&self, control: &dyn FavoriteControl) -> Option<JoinHandle<()>> {
        if control.remove_mode() {
            self.handle_remove(control)
        } else {
            self.handle_click(control)
        }
    }

    fn update_total(&self) {
        let count = self.registry.count();
        self.view.set_total_badge((count > 0).then_some(count));
    }

    fn notify_backend(&self, id: PlaceId) -> Option<JoinHandle<()>> {
        if !self.view.is_authenticated() {
            return None;
        }
        self.sync.as_ref().map(|sync| sync.spawn_toggle_remote(id))
    }
}

fn control_place_id(control: &dyn FavoriteControl) -> Option<PlaceId> {
    control.place_id().and_then(|raw| raw.into_place_id())
}
