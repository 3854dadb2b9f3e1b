// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;
use crate::config::Config;
use crate::registry::models::PlaceId;
use crate::sync::traits::{
    FavoritesPayload, FavoritesResponse, SyncError, SyncService, ToggleResponse,
};

const SYNC_PATH: &str = "favorites/sync/";
const LIST_PATH: &str = "favorites/list/";

#[derive(Debug, Clone)]
pub struct BackendSyncService {
    client: Client,
    base_url: Url,
    csrf_token: Option<String>,
    session_cookie: Option<String>,
}

impl BackendSyncService {
    pub fn new(
        base_url: Url,
        csrf_token: Option<String>,
        session_cookie: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("marica-favorites/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
            csrf_token,
            session_cookie,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let base_url = crate::utils::validate_backend_url(&config.backend_api_url)?;
        Ok(Self::new(
            base_url,
            config.csrf_token.clone(),
            config.session_cookie.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_request(&self, method: Method, path: &str) -> Result<RequestBuilder, SyncError> {
        let url = self.base_url.join(path)?;
        let mut request = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json");

        if let Some(ref token) = self.csrf_token {
            request = request.header("X-CSRFToken", token);
        }
        if let Some(ref cookie) = self.session_cookie {
            request = request.header("Cookie", cookie);
        }

        Ok(request)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Like [`read_json`](Self::read_json), but an empty successful body is `None`
    async fn read_optional_json<T: DeserializeOwned>(
        response: Response,
    ) -> Result<Option<T>, SyncError> {
        let body = Self::read_body(response).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn read_body(response: Response) -> Result<String, SyncError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SyncError::Status { status, body });
        }
        Ok(body)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl SyncService for BackendSyncService {
    async fn sync_favorites(&self, favorites: Vec<PlaceId>) -> Result<Vec<PlaceId>, SyncError> {
        info!(count = favorites.len(), "Syncing favorites to backend");

        let request = FavoritesPayload { favorites };
        let response = self
            .build_request(Method::POST, SYNC_PATH)?
            .json(&request)
            .send()
            .await?;

        let merged: FavoritesResponse = Self::read_json(response).await.inspect_err(|e| {
            error!(error = %e, "Backend favorites sync failed");
        })?;
        let merged = merged.favorites.ok_or(SyncError::MissingFavorites)?;

        info!(count = merged.len(), "Favorites sync completed successfully");
        Ok(merged)
    }

    async fn fetch_favorites(&self) -> Result<Vec<PlaceId>, SyncError> {
        info!("Fetching favorites from backend");

        let response = self.build_request(Method::GET, LIST_PATH)?.send().await?;

        let remote: FavoritesResponse = Self::read_json(response).await.inspect_err(|e| {
            warn!(error = %e, "Failed to fetch favorites from backend");
        })?;
        let remote = remote.favorites.ok_or(SyncError::MissingFavorites)?;

        info!(count = remote.len(), "Fetched favorites from backend");
        Ok(remote)
    }

    async fn toggle_favorite(&self, id: PlaceId) -> Result<ToggleResponse, SyncError> {
        let path = format!("place/{}/favorite/toggle/", id);
        let response = self.build_request(Method::POST, &path)?.send().await?;

        // The endpoint owes us no body; an empty success means it was recorded
        let toggled = Self::read_optional_json::<ToggleResponse>(response)
            .await?
            .unwrap_or(ToggleResponse {
                success: true,
                ..ToggleResponse::default()
            });

        if toggled.success {
            info!(
                place_id = %id,
                favorited = ?toggled.is_favorited,
                favorites_count = ?toggled.favorites_count,
                "Backend recorded favorite toggle"
            );
        } else {
            warn!(
                place_id = %id,
                message = toggled.message.as_deref().unwrap_or("none"),
                "Backend declined favorite toggle"
            );
        }
        Ok(toggled)
    }
}
