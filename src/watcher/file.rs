// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use crate::store::file::file_name_for;
use crate::watcher::traits::{StorageEvent, StorageWatcher};

/// Watches a [`FileStorage`](crate::store::FileStorage) directory for
/// changes to one key's file.
///
/// The directory is watched rather than the file itself because writers
/// replace the file by renaming a temporary over it.
pub struct FileStorageWatcher {
    watcher: Option<RecommendedWatcher>,
}

impl FileStorageWatcher {
    pub fn new() -> Self {
        Self { watcher: None }
    }
}

#[async_trait]
impl StorageWatcher for FileStorageWatcher {
    async fn watch(
        &mut self,
        dir: PathBuf,
        key: &str,
    ) -> anyhow::Result<mpsc::Receiver<StorageEvent>> {
        if !dir.exists() {
            return Err(anyhow::anyhow!("Storage directory does not exist: {}", dir.display()));
        }

        let (tx, rx) = mpsc::channel(1024);
        let target = OsString::from(file_name_for(key));

        let mut watcher = RecommendedWatcher::new(
            move |event| {
                Self::handle_static_event(&tx, &target, event);
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        self.watcher = Some(watcher);
        info!(dir = %dir.display(), key = %key, "Started watching storage key");

        Ok(rx)
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(watcher) = self.watcher.take() {
            // Dropping the watcher stops it
            drop(watcher);
            info!("Stopped watching storage");
        }
        Ok(())
    }
}

impl FileStorageWatcher {
    fn handle_static_event(
        event_tx: &mpsc::Sender<StorageEvent>,
        target: &OsString,
        event: notify::Result<Event>,
    ) {
        match event {
            Ok(event) => {
                for storage_event in classify_event(&event, target) {
                    if let Err(e) = event_tx.try_send(storage_event) {
                        warn!(error = %e, "Failed to send storage event, receiver may be closed");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Storage watcher error");
            }
        }
    }
}

/// Storage events carried by a filesystem event, keeping only paths that
/// name the watched key's file
pub fn classify_event(event: &Event, target: &OsString) -> Vec<StorageEvent> {
    event
        .paths
        .iter()
        .filter(|path| path.file_name() == Some(target.as_os_str()))
        .filter_map(|path| match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {
                Some(StorageEvent::Changed(path.clone()))
            }
            EventKind::Remove(_) => Some(StorageEvent::Removed(path.clone())),
            _ => None,
        })
        .collect()
}

impl Default for FileStorageWatcher {
    fn default() -> Self {
        Self::new()
    }
}
