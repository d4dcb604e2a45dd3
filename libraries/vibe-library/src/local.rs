//! Client-persisted library slot.
//!
//! The whole collection lives in one JSON file. Writers in this process are
//! announced over an in-process broadcast; writers in other processes are
//! picked up by a filesystem watcher on the slot's directory.

use crate::backend::{LibraryBackend, SnapshotFeed, FEED_CAPACITY};
use crate::defaults::default_library;
use crate::error::{LibraryError, Result};
use async_trait::async_trait;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, error, info, warn};
use vibe_core::{Track, TrackId};

/// Default slot location
pub const DEFAULT_SLOT_PATH: &str = "./data/stm_library.json";

/// Configuration for the local slot
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// JSON file holding the collection
    pub slot_path: PathBuf,
    /// Seed an absent slot with the built-in library
    pub seed_defaults: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            slot_path: PathBuf::from(DEFAULT_SLOT_PATH),
            seed_defaults: true,
        }
    }
}

impl LocalConfig {
    /// Slot at `path`, seeded with the defaults
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            slot_path: path.into(),
            seed_defaults: true,
        }
    }
}

struct LocalInner {
    config: LocalConfig,
    changes: broadcast::Sender<()>,
    write_lock: Mutex<()>,
}

/// Library backend persisted in a single local slot
#[derive(Clone)]
pub struct LocalBackend {
    inner: Arc<LocalInner>,
}

impl LocalBackend {
    /// Create a backend for `config.slot_path`; nothing is touched until first use
    pub fn new(config: LocalConfig) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(LocalInner {
                config,
                changes,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Path of the slot file
    pub fn slot_path(&self) -> &Path {
        &self.inner.config.slot_path
    }

    /// Current collection
    ///
    /// An absent slot is seeded (when enabled) and the seed returned. A slot
    /// that cannot be read yields the built-in library for this call.
    pub async fn load(&self) -> Vec<Track> {
        self.inner.load().await
    }
}

impl LocalInner {
    fn seed(&self) -> Vec<Track> {
        if self.config.seed_defaults {
            default_library()
        } else {
            Vec::new()
        }
    }

    async fn load(&self) -> Vec<Track> {
        match self.read_slot().await {
            Ok(Some(tracks)) => tracks,
            Ok(None) => {
                let seed = self.seed();
                if self.config.seed_defaults {
                    let _guard = self.write_lock.lock().await;
                    // Another writer may have created it meanwhile
                    if let Ok(Some(tracks)) = self.read_slot().await {
                        return tracks;
                    }
                    if let Err(e) = self.write_slot(&seed).await {
                        warn!(error = %e, path = %self.config.slot_path.display(), "Failed to seed library slot");
                    } else {
                        info!(path = %self.config.slot_path.display(), tracks = seed.len(), "Seeded library slot");
                    }
                }
                seed
            }
            Err(e) => {
                error!(error = %e, path = %self.config.slot_path.display(), "Local library load failed");
                default_library()
            }
        }
    }

    async fn read_slot(&self) -> Result<Option<Vec<Track>>> {
        match tokio::fs::read(&self.config.slot_path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_slot(&self, tracks: &[Track]) -> Result<()> {
        let path = &self.config.slot_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(tracks)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    fn announce(&self) {
        // No receivers just means nobody is subscribed
        let _ = self.changes.send(());
    }
}

fn slot_watcher(slot: &Path, tx: mpsc::UnboundedSender<()>) -> Result<RecommendedWatcher> {
    let dir = slot
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    std::fs::create_dir_all(&dir)?;

    let file_name = slot.file_name().map(std::ffi::OsStr::to_os_string);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let touches_slot = event
                .paths
                .iter()
                .any(|p| p.file_name().map(std::ffi::OsStr::to_os_string) == file_name);
            if touches_slot && !event.kind.is_access() {
                let _ = tx.send(());
            }
        }
        Err(e) => error!("Slot watcher error: {:?}", e),
    })
    .map_err(|e| LibraryError::Watch(e.to_string()))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| LibraryError::Watch(e.to_string()))?;

    Ok(watcher)
}

#[async_trait]
impl LibraryBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn watch(&self) -> Result<SnapshotFeed> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let mut changes = self.inner.changes.subscribe();
        let (fs_tx, mut fs_rx) = mpsc::unbounded_channel();

        // Same-process writes still arrive through `changes` without it
        let watcher = match slot_watcher(&self.inner.config.slot_path, fs_tx) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!(error = %e, "Cross-process library notifications unavailable");
                None
            }
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _watcher = watcher;
            let mut last = inner.load().await;
            if tx.send(Ok(last.clone())).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    () = tx.closed() => break,
                    change = changes.recv() => {
                        if matches!(change, Err(broadcast::error::RecvError::Closed)) {
                            break;
                        }
                    }
                    Some(()) = fs_rx.recv() => {}
                }

                let next = inner.load().await;
                if next != last {
                    last = next.clone();
                    if tx.send(Ok(next)).await.is_err() {
                        break;
                    }
                }
            }
            debug!("Local snapshot feed closed");
        });

        Ok(rx)
    }

    async fn insert(&self, track: &Track) -> Result<()> {
        let inner = &self.inner;
        {
            let _guard = inner.write_lock.lock().await;
            let mut tracks = inner.read_slot().await?.unwrap_or_else(|| inner.seed());
            tracks.insert(0, track.clone());
            inner.write_slot(&tracks).await?;
        }
        inner.announce();
        debug!(id = %track.id, title = %track.title, "Track saved locally");
        Ok(())
    }

    async fn delete(&self, id: &TrackId) -> Result<()> {
        let inner = &self.inner;
        {
            let _guard = inner.write_lock.lock().await;
            let Some(tracks) = inner.read_slot().await? else {
                debug!(id = %id, "No library slot; nothing to remove");
                return Ok(());
            };
            let remaining: Vec<Track> = tracks.into_iter().filter(|t| &t.id != id).collect();
            inner.write_slot(&remaining).await?;
        }
        inner.announce();
        debug!(id = %id, "Track removed locally");
        Ok(())
    }
}
