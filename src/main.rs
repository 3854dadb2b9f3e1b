// SPDX-License-Identifier: GPL-3.0-only
mod binder;
mod config;
mod logging;
mod registry;
mod store;
mod sync;
mod utils;
mod watcher;

#[cfg(test)]
mod test_helpers;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use binder::{run_clicks, spawn_stdin_clicks, FavoritesBinder, TerminalView};
use config::Config;
use logging::setup_logging;
use registry::{FavoritesRegistry, PlaceId};
use store::{FileStorage, LocalStore, MemoryStorage, StorageArea};
use sync::{BackendSyncService, FavoritesSync, SyncService};
use watcher::{CrossTabListener, FileStorageWatcher, StorageWatcher};

#[derive(Debug, Parser)]
#[command(name = "marica-favorites", version, about = "Manage MaricaCity favorite places")]
struct Cli {
    /// Keep favorites in memory for this run only, without reading or writing the storage directory
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print favorite place ids, one per line
    List,
    /// Print the number of favorites
    Count,
    /// Mark a place as favorite
    Add { id: PlaceId },
    /// Unmark a place
    Remove { id: PlaceId },
    /// Flip a place, notifying the backend when logged in
    Toggle { id: PlaceId },
    /// Remove every favorite
    Clear,
    /// Send local favorites to the backend and adopt the merged list
    Push,
    /// Merge the backend's favorites into the local list
    Pull,
    /// Show favorite buttons and keep them in sync with other writers until Ctrl+C.
    /// Typing a place id and Enter presses its button.
    Watch {
        /// Place ids to show a button for
        #[arg(long = "place")]
        places: Vec<PlaceId>,

        /// Show the favorites page: buttons remove their place, and every
        /// favorite gets one unless --place is given
        #[arg(long)]
        remove_mode: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    setup_logging(&config.log_level, config.log_json)?;

    info!("Starting marica-favorites v{}", env!("CARGO_PKG_VERSION"));

    // One registry per session, shared by everything below
    let storage = open_storage(&config, cli.ephemeral)?;
    let registry = Arc::new(FavoritesRegistry::new(LocalStore::new(
        storage,
        config.storage_key.clone(),
    )));

    let sync = if config.authenticated {
        let backend = BackendSyncService::from_config(&config)?;
        info!(backend = %backend.base_url(), "Backend sync enabled");
        let service: Arc<dyn SyncService> = Arc::new(backend);
        Some(Arc::new(FavoritesSync::new(Arc::clone(&registry), service)))
    } else {
        None
    };

    match cli.command {
        Command::List => {
            for id in registry.snapshot() {
                println!("{}", id);
            }
        }
        Command::Count => {
            println!("{}", registry.count());
        }
        Command::Add { id } => {
            if registry.add(id) {
                println!("added {}", id);
            } else {
                println!("{} is already a favorite", id);
            }
        }
        Command::Remove { id } => {
            if registry.remove(id) {
                println!("removed {}", id);
            } else {
                println!("{} is not a favorite", id);
            }
        }
        Command::Toggle { id } => {
            let view = Arc::new(TerminalView::new([id.to_string()], config.authenticated, true));
            let binder = FavoritesBinder::new(Arc::clone(&registry), view.clone(), sync);

            if let Some(control) = view.control(0) {
                // Exiting would abandon the backend notification, so wait for it here
                if let Some(pending) = binder.handle_click(&*control) {
                    pending.await?;
                }
            }
        }
        Command::Clear => {
            registry.clear();
            println!("cleared");
        }
        Command::Push => {
            let sync = require_sync(sync)?;
            let merged = sync.push().await?;
            println!("{} favorites after sync", merged.len());
        }
        Command::Pull => {
            let sync = require_sync(sync)?;
            let merged = sync.pull().await?;
            println!("{} favorites after merge", merged.len());
        }
        Command::Watch { places, remove_mode } => {
            let page = Page {
                places,
                remove_mode,
                follow_storage: !cli.ephemeral,
            };
            watch(&config, registry, sync, page).await?;
        }
    }

    Ok(())
}

fn open_storage(config: &Config, ephemeral: bool) -> anyhow::Result<Arc<dyn StorageArea>> {
    if ephemeral {
        info!("Using in-memory storage, favorites are discarded on exit");
        let storage = MemoryStorage::new().with_quota(config.storage_quota_bytes);
        return Ok(Arc::new(storage));
    }

    let storage = FileStorage::new(&config.storage_dir)?.with_quota(config.storage_quota_bytes);
    Ok(Arc::new(storage))
}

fn require_sync(sync: Option<Arc<FavoritesSync>>) -> anyhow::Result<Arc<FavoritesSync>> {
    sync.ok_or_else(|| {
        anyhow::anyhow!("Backend sync needs a logged-in session (set authenticated = true)")
    })
}

/// What the `watch` command puts on screen
struct Page {
    places: Vec<PlaceId>,
    remove_mode: bool,
    /// Reload when another process writes the storage file
    follow_storage: bool,
}

async fn watch(
    config: &Config,
    registry: Arc<FavoritesRegistry>,
    sync: Option<Arc<FavoritesSync>>,
    page: Page,
) -> anyhow::Result<()> {
    let view = Arc::new(if page.remove_mode {
        // The favorites page lists every favorite unless told which ones
        let places = if page.places.is_empty() {
            registry.snapshot()
        } else {
            page.places
        };
        let labels = places.iter().map(ToString::to_string);
        TerminalView::favorites_page(labels, config.authenticated, true)
    } else {
        let labels = page.places.iter().map(ToString::to_string);
        TerminalView::new(labels, config.authenticated, true)
    });
    let binder = Arc::new(FavoritesBinder::new(Arc::clone(&registry), view.clone(), sync));

    let subscription = registry.subscribe(|favorites| {
        info!(count = favorites.len(), "Favorites changed");
    });

    binder.initialize().await;

    let mut storage_watcher = FileStorageWatcher::new();
    let listener_task = if page.follow_storage {
        let events = storage_watcher
            .watch(config.storage_dir.clone(), &config.storage_key)
            .await?;
        let listener = CrossTabListener::new(Arc::clone(&registry), Arc::clone(&binder));
        info!(path = %config.storage_path().display(), "Following changes from other writers");
        Some(tokio::spawn(async move {
            listener.run(events).await;
        }))
    } else {
        None
    };

    let clicks = spawn_stdin_clicks();
    let clicks_task = {
        let binder = Arc::clone(&binder);
        let view = Arc::clone(&view);
        tokio::spawn(async move {
            run_clicks(&binder, &view, clicks).await;
        })
    };

    info!("Type a place id and press Enter to press its button. Waiting for shutdown signal...");

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    clicks_task.abort();
    storage_watcher.stop().await?;
    if let Some(task) = listener_task {
        task.abort();
    }
    subscription.unsubscribe();

    info!("Shutdown complete");
    Ok(())
}
