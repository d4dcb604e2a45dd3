//! Library store tests.
//!
//! Local mode runs against a temporary slot; remote mode runs against a
//! mock document-collection server.

use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;
use vibe_core::{Track, TrackId};
use vibe_library::{
    default_library, HttpRemoteBackend, LibraryBackend, LibraryStore, LocalBackend, LocalConfig,
    RemoteConfig, StoreMode, Subscription,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const DOCS_PATH: &str = "/collections/songs/documents";

fn slot(dir: &TempDir) -> LocalConfig {
    LocalConfig::new(dir.path().join("stm_library.json"))
}

fn listen(store: &LibraryStore) -> (Subscription, mpsc::UnboundedReceiver<Vec<Track>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sub = store.subscribe(move |tracks| {
        let _ = tx.send(tracks);
    });
    (sub, rx)
}

async fn next_snapshot(rx: &mut mpsc::UnboundedReceiver<Vec<Track>>) -> Vec<Track> {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no snapshot within 5s")
        .expect("subscription closed")
}

/// Skip snapshots until one satisfies `pred`
async fn snapshot_where<F>(rx: &mut mpsc::UnboundedReceiver<Vec<Track>>, pred: F) -> Vec<Track>
where
    F: Fn(&[Track]) -> bool,
{
    loop {
        let tracks = next_snapshot(rx).await;
        if pred(&tracks) {
            return tracks;
        }
    }
}

fn ids(tracks: &[Track]) -> Vec<&str> {
    tracks.iter().map(|t| t.id.as_str()).collect()
}

fn remote_store(server: &MockServer, dir: &TempDir) -> LibraryStore {
    let mut config = RemoteConfig::new(server.uri());
    config.poll_interval = Duration::from_millis(50);
    let remote = HttpRemoteBackend::new(config).unwrap();
    LibraryStore::new(Arc::new(LocalBackend::new(slot(dir))), Some(Arc::new(remote)))
}

fn documents() -> serde_json::Value {
    json!({
        "documents": [
            {
                "id": "doc-older",
                "data": {
                    "id": "song-a",
                    "title": "Older",
                    "artist": "Band",
                    "url": "https://cdn.example.com/a.mp3",
                    "isCloud": true,
                    "createdAt": 1000
                }
            },
            {
                "id": "doc-newer",
                "data": {
                    "title": "Newer",
                    "artist": "Band",
                    "url": "https://cdn.example.com/b.mp3",
                    "createdAt": 2000
                }
            }
        ]
    })
}

/// In-memory document collection: POST appends, GET lists
#[derive(Clone, Default)]
struct Collection {
    documents: Arc<Mutex<Vec<serde_json::Value>>>,
    list_delay: Duration,
}

impl Collection {
    fn with_list_delay(list_delay: Duration) -> Self {
        Self {
            list_delay,
            ..Self::default()
        }
    }

    async fn mount(&self, server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .respond_with(self.clone())
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(DOCS_PATH))
            .respond_with(self.clone())
            .mount(server)
            .await;
    }
}

impl Respond for Collection {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut documents = self.documents.lock().unwrap();
        if request.method.to_string() == "POST" {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            let id = format!("doc-{}", documents.len() + 1);
            documents.push(json!({"id": id, "data": body["data"]}));
            return ResponseTemplate::new(200).set_body_json(json!({ "id": id }));
        }
        ResponseTemplate::new(200)
            .set_body_json(json!({ "documents": documents.clone() }))
            .set_delay(self.list_delay)
    }
}

// =============================================================================
// Local Mode
// =============================================================================

mod local_mode {
    use super::*;

    #[tokio::test]
    async fn first_callback_is_seeded_library() {
        let dir = TempDir::new().unwrap();
        let store = LibraryStore::local_only(slot(&dir));
        let (_sub, mut rx) = listen(&store);

        assert_eq!(next_snapshot(&mut rx).await, default_library());
        assert!(!store.is_live());
        assert_eq!(store.mode(), StoreMode::LocalFallback);
    }

    #[tokio::test]
    async fn add_then_remove_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = LibraryStore::local_only(slot(&dir));
        let (_sub, mut rx) = listen(&store);
        next_snapshot(&mut rx).await;

        let track = Track::new("Upload", "Local Artist", "file:///music/upload.mp3");
        store.add(track.clone()).await;

        let snapshot = next_snapshot(&mut rx).await;
        let added = snapshot.iter().find(|t| t.id == track.id).unwrap();
        assert_eq!(added.title, "Upload");
        assert_eq!(added.artist, "Local Artist");
        assert_eq!(added.url, "file:///music/upload.mp3");
        assert_eq!(snapshot[0].id, track.id);

        store.remove(&track.id).await;
        let snapshot = next_snapshot(&mut rx).await;
        assert!(snapshot.iter().all(|t| t.id != track.id));
    }

    #[tokio::test]
    async fn every_subscriber_sees_writes() {
        let dir = TempDir::new().unwrap();
        let store = LibraryStore::local_only(slot(&dir));
        let (_a, mut rx_a) = listen(&store);
        let (_b, mut rx_b) = listen(&store);
        next_snapshot(&mut rx_a).await;
        next_snapshot(&mut rx_b).await;

        store.remove(&TrackId::new("cloud-2")).await;

        assert_eq!(ids(&next_snapshot(&mut rx_a).await), vec!["cloud-1"]);
        assert_eq!(ids(&next_snapshot(&mut rx_b).await), vec!["cloud-1"]);
    }

    #[tokio::test]
    async fn known_state_is_delivered_during_subscribe() {
        let dir = TempDir::new().unwrap();
        let store = LibraryStore::local_only(slot(&dir));
        let (_first, mut rx) = listen(&store);
        next_snapshot(&mut rx).await;

        let (_second, mut rx2) = listen(&store);
        let immediate = rx2.try_recv().expect("callback ran inside subscribe");
        assert_eq!(immediate, default_library());
    }

    #[tokio::test]
    async fn disposed_subscription_stops_receiving() {
        let dir = TempDir::new().unwrap();
        let store = LibraryStore::local_only(slot(&dir));
        let (sub, mut rx) = listen(&store);
        next_snapshot(&mut rx).await;

        sub.dispose();
        sub.dispose();
        assert!(sub.is_disposed());

        store
            .add(Track::new("Late", "Nobody", "file:///late.mp3"))
            .await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn repeated_subscribe_cycles_leave_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let store = LibraryStore::local_only(slot(&dir));

        for _ in 0..20 {
            let (sub, mut rx) = listen(&store);
            next_snapshot(&mut rx).await;
            drop(sub);
        }

        let (_sub, mut rx) = listen(&store);
        next_snapshot(&mut rx).await;
        store.remove(&TrackId::new("cloud-1")).await;
        assert_eq!(ids(&next_snapshot(&mut rx).await), vec!["cloud-2"]);
    }
}

// =============================================================================
// Remote Mode
// =============================================================================

mod remote_mode {
    use super::*;

    #[tokio::test]
    async fn snapshots_come_from_remote_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(documents()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = remote_store(&server, &dir);
        let (_sub, mut rx) = listen(&store);

        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(ids(&snapshot), vec!["doc-newer", "song-a"]);
        assert!(store.is_live());
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": []})))
            .mount(&server)
            .await;

        let mut config = RemoteConfig::new(server.uri());
        config.api_key = Some("secret".to_string());
        let remote = HttpRemoteBackend::new(config).unwrap();

        assert!(remote.fetch_snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_posts_document_with_timestamp() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DOCS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let remote = HttpRemoteBackend::new(RemoteConfig::new(server.uri())).unwrap();
        let track = Track::new("Posted", "Artist", "https://cdn.example.com/p.mp3")
            .with_id("song-p");
        remote.insert(&track).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["data"]["id"], "song-p");
        assert_eq!(body["data"]["title"], "Posted");
        assert!(body["data"]["createdAt"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn delete_uses_document_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(documents()))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/doc-older", DOCS_PATH)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let remote = HttpRemoteBackend::new(RemoteConfig::new(server.uri())).unwrap();
        remote.fetch_snapshot().await.unwrap();
        remote.delete(&TrackId::new("song-a")).await.unwrap();
    }

    #[tokio::test]
    async fn subscription_error_falls_back_to_local() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = remote_store(&server, &dir);
        assert!(store.is_live());
        let (_sub, mut rx) = listen(&store);

        assert_eq!(next_snapshot(&mut rx).await, default_library());
        assert!(!store.is_live());
    }

    #[tokio::test]
    async fn remote_write_failure_still_adds_locally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(documents()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DOCS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = remote_store(&server, &dir);
        let (_sub, mut rx) = listen(&store);
        assert_eq!(next_snapshot(&mut rx).await.len(), 2);

        let track = Track::new("Offline", "Local Artist", "file:///offline.mp3");
        store.add(track.clone()).await;

        assert!(!store.is_live());
        let snapshot = snapshot_where(&mut rx, |t| t.iter().any(|x| x.id == track.id)).await;
        assert_eq!(snapshot[0].id, track.id);
        assert!(snapshot.iter().any(|t| t.id.as_str() == "cloud-1"));
    }

    #[tokio::test]
    async fn fallback_is_one_way() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(documents()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = remote_store(&server, &dir);
        let mut modes = store.mode_changes();
        let (_sub, mut rx) = listen(&store);
        next_snapshot(&mut rx).await;

        // A later subscription does not bring the remote back
        let (_again, mut rx2) = listen(&store);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!store.is_live());
        assert_eq!(*modes.borrow_and_update(), StoreMode::LocalFallback);
        while let Ok(snapshot) = rx2.try_recv() {
            assert!(snapshot.iter().all(|t| t.id.as_str() != "song-a"));
        }

        // Writes stay local too
        store.remove(&TrackId::new("cloud-1")).await;
        let snapshot = snapshot_where(&mut rx, |t| t.len() == 1).await;
        assert_eq!(ids(&snapshot), vec!["cloud-2"]);
        let posts = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.to_string() != "GET")
            .count();
        assert_eq!(posts, 0);
    }

    #[tokio::test]
    async fn add_then_remove_round_trip_stays_remote() {
        let server = MockServer::start().await;
        let collection = Collection::default();
        collection.mount(&server).await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/doc-1", DOCS_PATH)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = remote_store(&server, &dir);
        let (_sub, mut rx) = listen(&store);
        assert!(next_snapshot(&mut rx).await.is_empty());

        let track = Track::new("Shared", "Band", "https://cdn.example.com/shared.mp3")
            .with_id("song-shared");
        store.add(track.clone()).await;

        let snapshot = snapshot_where(&mut rx, |t| !t.is_empty()).await;
        assert_eq!(snapshot[0].id, track.id);
        assert_eq!(snapshot[0].title, "Shared");
        assert_eq!(snapshot[0].artist, "Band");
        assert_eq!(snapshot[0].url, "https://cdn.example.com/shared.mp3");
        assert!(store.is_live());

        // A fresh subscriber reads the write too
        let (_late, mut late_rx) = listen(&store);
        assert_eq!(ids(&next_snapshot(&mut late_rx).await), vec!["song-shared"]);

        store.remove(&track.id).await;
        assert!(store.is_live());
    }

    #[tokio::test]
    async fn write_during_fetch_is_picked_up_without_waiting_for_poll() {
        let server = MockServer::start().await;
        let collection = Collection::with_list_delay(Duration::from_millis(300));
        collection.mount(&server).await;

        let mut config = RemoteConfig::new(server.uri());
        config.poll_interval = Duration::from_secs(60);
        let remote = HttpRemoteBackend::new(config).unwrap();
        let mut feed = remote.watch().await.unwrap();

        // The first listing is in flight when the write lands
        tokio::time::sleep(Duration::from_millis(100)).await;
        let track = Track::new("Mid Fetch", "Band", "https://cdn.example.com/mid.mp3")
            .with_id("song-mid");
        remote.insert(&track).await.unwrap();

        let first = timeout(Duration::from_secs(5), feed.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(first.is_empty());

        let second = timeout(Duration::from_secs(5), feed.recv())
            .await
            .expect("write not seen before the next poll")
            .unwrap()
            .unwrap();
        assert_eq!(ids(&second), vec!["song-mid"]);
    }

    #[tokio::test]
    async fn unreachable_remote_falls_back() {
        let dir = TempDir::new().unwrap();
        let mut config = RemoteConfig::new("http://127.0.0.1:9");
        config.timeout = Duration::from_millis(500);
        let store = LibraryStore::connect(slot(&dir), Some(config));
        let (_sub, mut rx) = listen(&store);

        assert_eq!(next_snapshot(&mut rx).await, default_library());
        assert!(!store.is_live());
    }

    #[tokio::test]
    async fn invalid_remote_url_starts_local() {
        let dir = TempDir::new().unwrap();
        let store = LibraryStore::connect(slot(&dir), Some(RemoteConfig::new("not a url")));
        assert!(!store.is_live());
    }
}
