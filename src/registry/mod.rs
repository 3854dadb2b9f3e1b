// SPDX-License-Identifier: GPL-3.0-only
pub mod models;
pub mod favorites;

pub use models::PlaceId;
pub use favorites::FavoritesRegistry;
