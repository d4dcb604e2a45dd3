//! Subcommand implementations

pub mod insight;
pub mod library;
pub mod play;

use tokio::sync::mpsc;
use vibe_core::Track;
use vibe_library::{LibraryStore, Subscription};

/// Subscribe to `store`, forwarding snapshots into a channel
pub fn snapshot_channel(store: &LibraryStore) -> (Subscription, mpsc::UnboundedReceiver<Vec<Track>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = store.subscribe(move |tracks| {
        let _ = tx.send(tracks);
    });
    (subscription, rx)
}

/// Wait for the first snapshot
pub async fn first_snapshot(store: &LibraryStore) -> Vec<Track> {
    let (subscription, mut rx) = snapshot_channel(store);
    let tracks = rx.recv().await.unwrap_or_default();
    subscription.dispose();
    tracks
}

/// One line per track
pub fn format_track(index: usize, track: &Track) -> String {
    let origin = if track.is_remote() { "remote" } else { "local" };
    format!(
        "{:>3}. {} by {} [{}] ({})",
        index + 1,
        track.title,
        track.artist,
        track.id,
        origin
    )
}
