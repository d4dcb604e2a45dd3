//! Device-local uploads
//!
//! Turns a file on this machine into a library track that carries its own
//! bytes, so it plays without touching the path again.

use crate::error::{PlayerError, Result};
use std::path::Path;
use url::Url;
use vibe_core::{Track, TrackOrigin};

/// Artist given to uploads without one
pub const LOCAL_ARTIST: &str = "Local Artist";

/// Build a track from `path`
///
/// The title defaults to the file stem and the artist to
/// [`LOCAL_ARTIST`]. The URI is the file's absolute `file://` URL.
pub async fn track_from_file(
    path: &Path,
    title: Option<String>,
    artist: Option<String>,
) -> Result<Track> {
    let absolute = tokio::fs::canonicalize(path).await?;
    if !absolute.is_file() {
        return Err(PlayerError::BadRequest(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let stem = absolute
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled")
        .to_string();
    let url = Url::from_file_path(&absolute)
        .map_err(|()| PlayerError::BadRequest(format!("{} is not absolute", absolute.display())))?;
    let bytes = tokio::fs::read(&absolute).await?;

    Ok(Track::new(
        title.unwrap_or(stem),
        artist.unwrap_or_else(|| LOCAL_ARTIST.to_string()),
        url.to_string(),
    )
    .with_origin(TrackOrigin::LocalDevice)
    .with_data(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_uses_stem_and_local_artist() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Night Drive.mp3");
        std::fs::write(&file, b"ID3 fake").unwrap();

        let track = track_from_file(&file, None, None).await.unwrap();

        assert_eq!(track.title, "Night Drive");
        assert_eq!(track.artist, "Local Artist");
        assert!(track.url.starts_with("file://"));
        assert!(!track.is_remote());
        assert_eq!(track.data.as_deref().map(Vec::len), Some(8));
        assert_eq!(track.id.as_str().len(), 36);
    }

    #[tokio::test]
    async fn overrides_title_and_artist() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let track = track_from_file(&file, Some("Title".into()), Some("Band".into()))
            .await
            .unwrap();
        assert_eq!((track.title.as_str(), track.artist.as_str()), ("Title", "Band"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(track_from_file(&dir.path().join("nope.mp3"), None, None).await.is_err());
    }

    #[tokio::test]
    async fn directories_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            track_from_file(dir.path(), None, None).await,
            Err(PlayerError::BadRequest(_))
        ));
    }
}
