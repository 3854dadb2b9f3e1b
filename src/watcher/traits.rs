// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc::Receiver;

/// Another writer changed the value of the watched storage key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

#[async_trait]
pub trait StorageWatcher: Send + Sync {
    /// Start watching `key` in the storage directory `dir` and return a receiver for its events
    async fn watch(&mut self, dir: PathBuf, key: &str) -> anyhow::Result<Receiver<StorageEvent>>;

    /// Stop watching
    async fn stop(&mut self) -> anyhow::Result<()>;
}
