//! Store import watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::store::{import, ConfigEntry, MemoryStore};

/// Watches the store import document and swaps new contents into the live
/// store. Inline entries from the config file are kept underneath.
pub struct StoreWatcher {
    path: PathBuf,
    store: Arc<MemoryStore>,
    base_entries: Vec<ConfigEntry>,
}

impl StoreWatcher {
    pub fn new(path: &Path, store: Arc<MemoryStore>, base_entries: Vec<ConfigEntry>) -> Self {
        Self {
            path: path.to_path_buf(),
            store,
            base_entries,
        }
    }

    /// Re-read the import document and apply it.
    ///
    /// On failure the current snapshot stays in place.
    pub fn reload(&self) -> Result<usize, import::StoreError> {
        let entries = import::load_import(&self.path)?;
        let count = entries.len();
        self.store
            .replace(self.base_entries.iter().cloned().chain(entries));
        Ok(count)
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for reloads to continue.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Store import change detected, reloading...");
                        match self.reload() {
                            Ok(count) => tracing::info!(entries = count, "Store reloaded"),
                            Err(e) => tracing::error!(
                                "Failed to reload store: {}. Keeping current snapshot.",
                                e
                            ),
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Store watcher started");
        Ok(watcher)
    }
}
