//! HTTP document-collection backend.
//!
//! Talks to a small REST surface:
//!
//! - `GET  {base}/collections/{collection}/documents?orderBy=createdAt&direction=desc`
//!   returns `{"documents": [{"id": "<doc id>", "data": {<track fields>, "createdAt": <ms>}}]}`
//! - `POST {base}/collections/{collection}/documents` with `{"data": {...}}`
//!   returns `{"id": "<doc id>"}`
//! - `DELETE {base}/collections/{collection}/documents/{doc id}`
//!
//! Change notification is done by polling; a feed emits whenever the ordered
//! collection differs from what it last emitted. Writes through this backend
//! trigger an immediate re-read.

use crate::backend::{LibraryBackend, SnapshotFeed, FEED_CAPACITY};
use crate::error::{LibraryError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use vibe_core::{Track, TrackId, TrackOrigin};

/// Default poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Remote store configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL, `http://` or `https://`
    pub base_url: String,
    /// Collection holding the tracks
    pub collection: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// How often feeds re-read the collection
    pub poll_interval: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Config for `base_url` with default collection and timings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            collection: "songs".to_string(),
            api_key: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    id: String,
    data: TrackDocument,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<TrackId>,
    title: String,
    artist: String,
    url: String,
    #[serde(default)]
    duration: f64,
    #[serde(default = "default_is_cloud")]
    is_cloud: bool,
    #[serde(default)]
    created_at: i64,
}

fn default_is_cloud() -> bool {
    true
}

impl TrackDocument {
    fn from_track(track: &Track, created_at: i64) -> Self {
        Self {
            id: Some(track.id.clone()),
            title: track.title.clone(),
            artist: track.artist.clone(),
            url: track.url.clone(),
            duration: track.duration,
            is_cloud: track.is_remote(),
            created_at,
        }
    }

    fn into_track(self, doc_id: &str) -> Track {
        let id = self.id.unwrap_or_else(|| TrackId::new(doc_id));
        let origin = if self.is_cloud {
            TrackOrigin::Remote
        } else {
            TrackOrigin::LocalDevice
        };
        Track::new(self.title, self.artist, self.url)
            .with_id(id)
            .with_origin(origin)
            .with_duration(self.duration)
    }
}

#[derive(Debug, Serialize)]
struct NewDocument<'a> {
    data: &'a TrackDocument,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

struct RemoteInner {
    http: Client,
    config: RemoteConfig,
    /// Track id -> document id, learned from reads and inserts
    doc_ids: Mutex<HashMap<TrackId, String>>,
    /// Bumped after every write; feeds re-read when it moves
    writes: watch::Sender<u64>,
}

/// Library backend backed by a remote document collection
#[derive(Clone)]
pub struct HttpRemoteBackend {
    inner: Arc<RemoteInner>,
}

impl HttpRemoteBackend {
    /// Create a backend; validates the URL and builds the HTTP client
    pub fn new(config: RemoteConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(LibraryError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(LibraryError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        url::Url::parse(&base_url).map_err(|e| LibraryError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("VibePlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(LibraryError::Request)?;

        Ok(Self {
            inner: Arc::new(RemoteInner {
                http,
                config: RemoteConfig { base_url, ..config },
                doc_ids: Mutex::new(HashMap::new()),
                writes: watch::channel(0).0,
            }),
        })
    }

    /// Normalized base URL
    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    /// Read the collection once, newest first
    pub async fn fetch_snapshot(&self) -> Result<Vec<Track>> {
        self.inner.fetch().await
    }
}

impl RemoteInner {
    fn documents_url(&self) -> String {
        format!(
            "{}/collections/{}/documents",
            self.config.base_url, self.config.collection
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn doc_ids(&self) -> std::sync::MutexGuard<'_, HashMap<TrackId, String>> {
        self.doc_ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(LibraryError::ServerError {
                status: status.as_u16(),
                message,
            })
        }
    }

    fn written(&self) {
        self.writes.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    async fn fetch(&self) -> Result<Vec<Track>> {
        let url = self.documents_url();
        debug!(url = %url, "Fetching remote library");

        let response = self
            .authorize(self.http.get(&url))
            .query(&[("orderBy", "createdAt"), ("direction", "desc")])
            .send()
            .await
            .map_err(LibraryError::from_request)?;

        let list: DocumentList = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LibraryError::ParseError(format!("Failed to parse documents: {}", e)))?;

        let mut documents = list.documents;
        // Stable sort keeps server order for equal timestamps
        documents.sort_by(|a, b| b.data.created_at.cmp(&a.data.created_at));

        let mut doc_ids = HashMap::with_capacity(documents.len());
        let tracks: Vec<Track> = documents
            .into_iter()
            .map(|doc| {
                let track = doc.data.into_track(&doc.id);
                doc_ids.insert(track.id.clone(), doc.id);
                track
            })
            .collect();
        *self.doc_ids() = doc_ids;

        Ok(tracks)
    }
}

#[async_trait]
impl LibraryBackend for HttpRemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn watch(&self) -> Result<SnapshotFeed> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let mut last: Option<Vec<Track>> = None;
            let mut writes = inner.writes.subscribe();
            loop {
                // Writes landing during the fetch leave `writes` marked changed
                writes.borrow_and_update();
                match inner.fetch().await {
                    Ok(tracks) => {
                        if last.as_ref() != Some(&tracks) {
                            last = Some(tracks.clone());
                            if tx.send(Ok(tracks)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        // A failed feed ends; the receiver decides what happens next
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }

                tokio::select! {
                    () = tx.closed() => break,
                    () = tokio::time::sleep(inner.config.poll_interval) => {}
                    _ = writes.changed() => {}
                }
            }
            debug!("Remote snapshot feed closed");
        });

        Ok(rx)
    }

    async fn insert(&self, track: &Track) -> Result<()> {
        let inner = &self.inner;
        let document = TrackDocument::from_track(track, chrono::Utc::now().timestamp_millis());

        let response = inner
            .authorize(inner.http.post(inner.documents_url()))
            .json(&NewDocument { data: &document })
            .send()
            .await
            .map_err(LibraryError::from_request)?;

        let created: Created = RemoteInner::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LibraryError::ParseError(format!("Failed to parse insert response: {}", e)))?;

        inner.doc_ids().insert(track.id.clone(), created.id.clone());
        inner.written();

        info!(id = %track.id, doc = %created.id, title = %track.title, "Track added to remote library");
        Ok(())
    }

    async fn delete(&self, id: &TrackId) -> Result<()> {
        let inner = &self.inner;
        let doc_id = inner
            .doc_ids()
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string());
        let url = format!("{}/{}", inner.documents_url(), doc_id);

        let response = inner
            .authorize(inner.http.delete(&url))
            .send()
            .await
            .map_err(LibraryError::from_request)?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(id = %id, doc = %doc_id, "Remote track already gone");
        } else {
            RemoteInner::check(response).await?;
        }

        inner.doc_ids().remove(id);
        inner.written();

        info!(id = %id, doc = %doc_id, "Track deleted from remote library");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(
            HttpRemoteBackend::new(RemoteConfig::new("")),
            Err(LibraryError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpRemoteBackend::new(RemoteConfig::new("ftp://example.com")),
            Err(LibraryError::InvalidUrl(_))
        ));
    }

    #[test]
    fn normalizes_trailing_slash() {
        let backend = HttpRemoteBackend::new(RemoteConfig::new("https://store.example.com/")).unwrap();
        assert_eq!(backend.base_url(), "https://store.example.com");
    }

    #[test]
    fn document_identity_prefers_embedded_id() {
        let doc: TrackDocument = serde_json::from_str(
            r#"{"id":"cloud-7","title":"T","artist":"A","url":"https://x/y.mp3","createdAt":5}"#,
        )
        .unwrap();
        let track = doc.into_track("doc-123");
        assert_eq!(track.id.as_str(), "cloud-7");
        assert!(track.is_remote());

        let doc: TrackDocument =
            serde_json::from_str(r#"{"title":"T","artist":"A","url":"u","isCloud":false}"#).unwrap();
        let track = doc.into_track("doc-456");
        assert_eq!(track.id.as_str(), "doc-456");
        assert!(!track.is_remote());
    }
}
