//! The library store: one collection, two backends, one-way fallback.
//!
//! The store starts in remote mode when a remote backend is configured.
//! The first remote failure (a feed error or a failed write) switches it to
//! the local slot for the rest of the process; it never switches back.
//! Every live subscription follows the switch, so writes made after the
//! fallback are visible to all subscribers.

use crate::backend::{LibraryBackend, SnapshotFeed};
use crate::local::{LocalBackend, LocalConfig};
use crate::remote::{HttpRemoteBackend, RemoteConfig};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vibe_core::{Track, TrackId};

/// Which backend currently serves the library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Remote collection, shared across sessions
    RemoteActive,
    /// Local slot, for the rest of this process
    LocalFallback,
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteActive => f.write_str("remote"),
            Self::LocalFallback => f.write_str("local"),
        }
    }
}

type Callback = Box<dyn FnMut(Vec<Track>) + Send>;

struct StoreInner {
    local: Arc<dyn LibraryBackend>,
    remote: Option<Arc<dyn LibraryBackend>>,
    mode: watch::Sender<StoreMode>,
    latest: Mutex<Option<Vec<Track>>>,
}

impl StoreInner {
    fn mode(&self) -> StoreMode {
        *self.mode.borrow()
    }

    fn backend_for(&self, mode: StoreMode) -> &Arc<dyn LibraryBackend> {
        match (mode, &self.remote) {
            (StoreMode::RemoteActive, Some(remote)) => remote,
            _ => &self.local,
        }
    }

    /// Switch to the local slot; later calls are no-ops
    fn fall_back(&self, reason: &dyn fmt::Display) {
        let switched = self.mode.send_if_modified(|mode| {
            if *mode == StoreMode::RemoteActive {
                *mode = StoreMode::LocalFallback;
                true
            } else {
                false
            }
        });
        if switched {
            warn!(reason = %reason, "Remote library failed; switching to local mode");
        }
    }

    fn remember(&self, tracks: &[Track]) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(tracks.to_vec());
    }

    /// Drop the cached snapshot so new subscribers wait for fresh state
    fn forget(&self) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cached(&self) -> Option<Vec<Track>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Library store shared by the playback controller and the UI
///
/// Cloning is cheap; clones share mode and backends. Subscriptions need a
/// tokio runtime.
#[derive(Clone)]
pub struct LibraryStore {
    inner: Arc<StoreInner>,
}

impl LibraryStore {
    /// Store over explicit backends
    ///
    /// Starts in remote mode when `remote` is given.
    pub fn new(local: Arc<dyn LibraryBackend>, remote: Option<Arc<dyn LibraryBackend>>) -> Self {
        let mode = if remote.is_some() {
            StoreMode::RemoteActive
        } else {
            StoreMode::LocalFallback
        };
        let (mode, _) = watch::channel(mode);

        Self {
            inner: Arc::new(StoreInner {
                local,
                remote,
                mode,
                latest: Mutex::new(None),
            }),
        }
    }

    /// Store over the local slot only
    pub fn local_only(local: LocalConfig) -> Self {
        Self::new(Arc::new(LocalBackend::new(local)), None)
    }

    /// Store from configuration
    ///
    /// A remote section that cannot be turned into a client is logged and
    /// the store starts in local mode.
    pub fn connect(local: LocalConfig, remote: Option<RemoteConfig>) -> Self {
        let remote: Option<Arc<dyn LibraryBackend>> = match remote.map(HttpRemoteBackend::new) {
            Some(Ok(backend)) => {
                info!(url = %backend.base_url(), "Remote library configured");
                Some(Arc::new(backend))
            }
            Some(Err(e)) => {
                warn!(error = %e, "Remote library unavailable; using local mode");
                None
            }
            None => None,
        };
        Self::new(Arc::new(LocalBackend::new(local)), remote)
    }

    /// Current mode
    pub fn mode(&self) -> StoreMode {
        self.inner.mode()
    }

    /// Whether the remote collection is in use
    ///
    /// Re-check after every subscription callback; a remote failure can
    /// flip this at any time.
    pub fn is_live(&self) -> bool {
        self.mode() == StoreMode::RemoteActive
    }

    /// Watch mode changes
    pub fn mode_changes(&self) -> watch::Receiver<StoreMode> {
        self.inner.mode.subscribe()
    }

    /// Register for library snapshots
    ///
    /// If a snapshot is already known it is delivered before this returns;
    /// afterwards `callback` runs on a background task for every change, in
    /// the order changes are observed. Unchanged snapshots are not
    /// repeated. Dropping or disposing the returned handle stops delivery.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(Vec<Track>) + Send + 'static,
    {
        let mut callback: Callback = Box::new(callback);
        let last = self.inner.cached();
        if let Some(tracks) = &last {
            callback(tracks.clone());
        }

        let cancel = CancellationToken::new();
        let task = Delivery {
            inner: Arc::clone(&self.inner),
            mode_rx: self.inner.mode.subscribe(),
            cancel: cancel.clone(),
            callback,
            last,
        };
        tokio::spawn(task.run());

        Subscription { cancel }
    }

    /// Persist a new track
    ///
    /// Never fails: a remote write error switches to local mode and the
    /// track is written there instead.
    pub async fn add(&self, track: Track) {
        if let (StoreMode::RemoteActive, Some(remote)) = (self.mode(), &self.inner.remote) {
            match remote.insert(&track).await {
                Ok(()) => {
                    self.inner.forget();
                    return;
                }
                Err(e) => {
                    error!(error = %e, id = %track.id, "Remote write failed");
                    self.inner.fall_back(&e);
                }
            }
        }

        match self.inner.local.insert(&track).await {
            Ok(()) => {
                self.inner.forget();
                info!(id = %track.id, title = %track.title, "Track added to local library");
            }
            Err(e) => error!(error = %e, id = %track.id, "Local write failed"),
        }
    }

    /// Delete a track by id
    ///
    /// Same failure handling as [`LibraryStore::add`].
    pub async fn remove(&self, id: &TrackId) {
        if let (StoreMode::RemoteActive, Some(remote)) = (self.mode(), &self.inner.remote) {
            match remote.delete(id).await {
                Ok(()) => {
                    self.inner.forget();
                    return;
                }
                Err(e) => {
                    error!(error = %e, id = %id, "Remote delete failed");
                    self.inner.fall_back(&e);
                }
            }
        }

        match self.inner.local.delete(id).await {
            Ok(()) => {
                self.inner.forget();
                info!(id = %id, "Track removed from local library");
            }
            Err(e) => error!(error = %e, id = %id, "Local delete failed"),
        }
    }
}

/// Per-subscription delivery task
struct Delivery {
    inner: Arc<StoreInner>,
    mode_rx: watch::Receiver<StoreMode>,
    cancel: CancellationToken,
    callback: Callback,
    last: Option<Vec<Track>>,
}

enum FeedEnd {
    Cancelled,
    ModeChanged,
    Failed,
}

impl Delivery {
    async fn run(mut self) {
        loop {
            let mode = *self.mode_rx.borrow_and_update();
            let backend = Arc::clone(self.inner.backend_for(mode));

            let feed = tokio::select! {
                () = self.cancel.cancelled() => break,
                feed = backend.watch() => feed,
            };

            let end = match feed {
                Ok(feed) => self.pump(feed, mode).await,
                Err(e) => {
                    error!(error = %e, backend = backend.name(), "Library subscription failed");
                    FeedEnd::Failed
                }
            };

            match end {
                FeedEnd::Cancelled => break,
                FeedEnd::ModeChanged => {}
                FeedEnd::Failed if mode == StoreMode::RemoteActive => {
                    self.inner.fall_back(&"remote subscription error");
                }
                // The local slot is the last resort
                FeedEnd::Failed => break,
            }
        }
        debug!("Library subscription ended");
    }

    async fn pump(&mut self, mut feed: SnapshotFeed, mode: StoreMode) -> FeedEnd {
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return FeedEnd::Cancelled,
                changed = self.mode_rx.changed() => {
                    if changed.is_err() {
                        return FeedEnd::Cancelled;
                    }
                    if *self.mode_rx.borrow() != mode {
                        return FeedEnd::ModeChanged;
                    }
                }
                item = feed.recv() => match item {
                    Some(Ok(tracks)) => self.deliver(tracks),
                    Some(Err(e)) => {
                        error!(error = %e, mode = %mode, "Library feed error");
                        return FeedEnd::Failed;
                    }
                    None => return FeedEnd::Failed,
                },
            }
        }
    }

    fn deliver(&mut self, tracks: Vec<Track>) {
        self.inner.remember(&tracks);
        if self.last.as_ref() == Some(&tracks) || self.cancel.is_cancelled() {
            return;
        }
        self.last = Some(tracks.clone());
        (self.callback)(tracks);
    }
}

/// Handle keeping a subscription alive
///
/// `dispose` is idempotent; dropping the handle disposes it.
#[derive(Debug)]
pub struct Subscription {
    cancel: CancellationToken,
}

impl Subscription {
    /// Stop delivery and release the backend feed
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    /// Whether `dispose` has run
    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
