//! Media loading
//!
//! Resolves a track to bytes (in-memory upload, local file or HTTP),
//! decodes it and converts it to the output rate. Decoding runs on the
//! blocking pool so the caller's runtime keeps serving I/O.

use crate::error::{OutputError, Result};
use crate::resample::resample;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;
use vibe_audio::SymphoniaDecoder;
use vibe_core::{AudioBuffer, Track};

/// Where a track's audio bytes come from
#[derive(Debug, Clone, PartialEq)]
pub enum MediaLocation {
    /// Bytes carried by the track itself
    Memory(Arc<Vec<u8>>),
    /// File on disk
    File(PathBuf),
    /// HTTP(S) resource
    Http(Url),
}

impl MediaLocation {
    /// Resolve the location of `track`
    ///
    /// In-memory bytes win over the URI. URIs without a scheme are treated
    /// as file paths.
    pub fn of(track: &Track) -> Result<Self> {
        if let Some(data) = &track.data {
            return Ok(Self::Memory(Arc::clone(data)));
        }

        match Url::parse(&track.url) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Http(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::File)
                    .map_err(|()| OutputError::UnsupportedLocation(track.url.clone())),
                _ => Err(OutputError::UnsupportedLocation(track.url.clone())),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) if !track.url.is_empty() => {
                Ok(Self::File(PathBuf::from(&track.url)))
            }
            Err(_) => Err(OutputError::UnsupportedLocation(track.url.clone())),
        }
    }
}

/// Extension used as a format hint, from the URI or the title
fn extension_hint(track: &Track) -> Option<String> {
    let from = |s: &str| {
        Path::new(s.split(['?', '#']).next().unwrap_or(s))
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    };
    from(&track.url).or_else(|| from(&track.title))
}

/// Fetches and decodes tracks for one output rate
#[derive(Debug, Clone)]
pub struct TrackLoader {
    http: Client,
    target_rate: u32,
}

impl TrackLoader {
    /// Loader producing audio at `target_rate`
    pub fn new(target_rate: u32) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("VibePlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, target_rate })
    }

    /// Output rate
    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Load `track` as interleaved stereo at the output rate
    pub async fn load(&self, track: &Track) -> Result<AudioBuffer> {
        let start = Instant::now();
        let location = MediaLocation::of(track)?;
        let hint = extension_hint(track);
        debug!(id = %track.id, location = ?location, "Loading track");

        let bytes = match location {
            MediaLocation::Memory(data) => data.as_ref().clone(),
            MediaLocation::File(path) => tokio::fs::read(&path).await?,
            MediaLocation::Http(url) => self.fetch(url).await?,
        };

        let target_rate = self.target_rate;
        let buffer = tokio::task::spawn_blocking(move || -> Result<AudioBuffer> {
            let decoded = SymphoniaDecoder::new().decode_bytes(bytes, hint.as_deref())?;
            resample(decoded, target_rate)
        })
        .await
        .map_err(|_| OutputError::ThreadStopped)??;

        info!(
            id = %track.id,
            title = %track.title,
            secs = buffer.duration_secs(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Track loaded"
        );
        Ok(buffer)
    }

    async fn fetch(&self, url: Url) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutputError::FetchStatus(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
