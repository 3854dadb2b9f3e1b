// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::store::DEFAULT_STORAGE_KEY;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one file per storage key
    pub storage_dir: PathBuf,

    /// Key the favorites list is stored under
    pub storage_key: String,

    /// Largest value in bytes a storage write may hold; unlimited when unset
    pub storage_quota_bytes: Option<usize>,

    /// Base URL of the backend's explore endpoints
    pub backend_api_url: String,

    /// CSRF token sent with every backend request
    pub csrf_token: Option<String>,

    /// Session cookie (`name=value`) identifying the logged-in user
    pub session_cookie: Option<String>,

    /// Whether the session is logged in; enables backend sync
    pub authenticated: bool,

    /// Backend request timeout in seconds
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("MARICA_CONFIG")
            .unwrap_or_else(|_| "config.toml".to_string());

        Self::load_from(Path::new(&config_path), |key| std::env::var(key).ok())
    }

    /// Load from `path` (defaults if it does not exist), then apply overrides
    /// looked up through `env`
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config: Config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            // Use default configuration
            Config::default()
        };

        config.apply_overrides(env)?;
        Ok(config)
    }

    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(val) = env("MARICA_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(val);
        }
        if let Some(val) = env("MARICA_STORAGE_KEY") {
            self.storage_key = val;
        }
        if let Some(val) = env("MARICA_STORAGE_QUOTA_BYTES") {
            self.storage_quota_bytes = Some(val.parse()?);
        }
        if let Some(val) = env("MARICA_BACKEND_API_URL") {
            self.backend_api_url = val;
        }
        if let Some(val) = env("MARICA_CSRF_TOKEN") {
            self.csrf_token = Some(val);
        }
        if let Some(val) = env("MARICA_SESSION_COOKIE") {
            self.session_cookie = Some(val);
        }
        if let Some(val) = env("MARICA_AUTHENTICATED") {
            self.authenticated = val.parse()?;
        }
        if let Some(val) = env("MARICA_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = val.parse()?;
        }
        if let Some(val) = env("MARICA_LOG_LEVEL") {
            self.log_level = val;
        }
        if let Some(val) = env("MARICA_LOG_JSON") {
            self.log_json = val.parse()?;
        }

        Ok(())
    }

    /// File the favorites list lives in
    pub fn storage_path(&self) -> PathBuf {
        self.storage_dir.join(crate::store::file::file_name_for(&self.storage_key))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("data"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_quota_bytes: None,
            backend_api_url: String::from("http://localhost:8000/explore/"),
            csrf_token: None,
            session_cookie: None,
            authenticated: false,
            request_timeout_secs: 30,
            log_level: String::from("info"),
            log_json: false,
        }
    }
}
