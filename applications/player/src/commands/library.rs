//! `library` subcommands

use super::{first_snapshot, format_track, snapshot_channel};
use crate::error::PlayerError;
use crate::session::AdminSession;
use crate::upload::track_from_file;
use std::path::Path;
use vibe_core::TrackId;
use vibe_library::LibraryStore;

/// Print the current library and the active mode
pub async fn list(store: &LibraryStore) -> anyhow::Result<()> {
    let tracks = first_snapshot(store).await;
    println!("Library ({} tracks, {}):", tracks.len(), store.mode());
    for (i, track) in tracks.iter().enumerate() {
        println!("{}", format_track(i, track));
    }
    Ok(())
}

/// Print every snapshot until Ctrl-C
pub async fn watch(store: &LibraryStore) -> anyhow::Result<()> {
    let (subscription, mut rx) = snapshot_channel(store);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            snapshot = rx.recv() => {
                let Some(tracks) = snapshot else { break };
                println!("--- {} tracks ({}) ---", tracks.len(), store.mode());
                for (i, track) in tracks.iter().enumerate() {
                    println!("{}", format_track(i, track));
                }
            }
        }
    }

    subscription.dispose();
    Ok(())
}

/// Upload a local file
pub async fn add(
    store: &LibraryStore,
    session: AdminSession,
    path: &Path,
    title: Option<String>,
    artist: Option<String>,
) -> anyhow::Result<()> {
    session.require_admin("library add")?;

    let track = track_from_file(path, title, artist).await?;
    let id = track.id.clone();
    let title = track.title.clone();
    store.add(track).await;

    println!("Added \"{}\" as {} ({})", title, id, store.mode());
    Ok(())
}

/// Delete a track by id
pub async fn remove(store: &LibraryStore, session: AdminSession, id: &str) -> anyhow::Result<()> {
    session.require_admin("library remove")?;

    // Reading first lets the remote backend resolve its document id
    let tracks = first_snapshot(store).await;
    let id = TrackId::from(id);
    if !tracks.iter().any(|t| t.id == id) {
        return Err(PlayerError::BadRequest(format!("No track with id {}", id)).into());
    }

    store.remove(&id).await;
    println!("Removed {} ({})", id, store.mode());
    Ok(())
}
