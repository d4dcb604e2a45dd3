//! Backend contract shared by the remote and local stores.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use vibe_core::{Track, TrackId};

/// Ordered stream of full library snapshots.
///
/// The first item is the state at the time of the call; later items follow
/// every observed change. Dropping the receiver stops the producer. An
/// `Err` item means the feed has failed and will produce nothing further.
pub type SnapshotFeed = mpsc::Receiver<Result<Vec<Track>>>;

/// Capacity of snapshot feeds
pub(crate) const FEED_CAPACITY: usize = 16;

/// A durable track collection with change notification
#[async_trait]
pub trait LibraryBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Start a snapshot feed
    async fn watch(&self) -> Result<SnapshotFeed>;

    /// Persist a new track
    async fn insert(&self, track: &Track) -> Result<()>;

    /// Delete a track by id
    async fn delete(&self, id: &TrackId) -> Result<()>;
}
