// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::registry::models::PlaceId;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request to backend failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("backend response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend response has no favorites list")]
    MissingFavorites,

    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Body of a sync request and of every favorites list the backend returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritesPayload {
    pub favorites: Vec<PlaceId>,
}

/// Favorites list as received; the field is optional on the wire
#[derive(Debug, Deserialize)]
pub struct FavoritesResponse {
    #[serde(default)]
    pub favorites: Option<Vec<PlaceId>>,
}

/// Reply to a single toggle. Only logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub is_favorited: Option<bool>,
    #[serde(default)]
    pub favorites_count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait SyncService: Send + Sync {
    /// Send the local favorites; the backend stores and returns the union with its own
    async fn sync_favorites(&self, favorites: Vec<PlaceId>) -> Result<Vec<PlaceId>, SyncError>;

    /// Fetch the favorites the backend holds for the session's user
    async fn fetch_favorites(&self) -> Result<Vec<PlaceId>, SyncError>;

    /// Tell the backend a single place was toggled
    async fn toggle_favorite(&self, id: PlaceId) -> Result<ToggleResponse, SyncError>;
}
