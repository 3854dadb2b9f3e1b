// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod backend;
pub mod reconcile;

pub use traits::SyncService;
pub use backend::BackendSyncService;
pub use reconcile::FavoritesSync;
