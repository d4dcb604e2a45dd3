//! Vibe Player Library
//!
//! The track collection behind the player. A [`LibraryStore`] serves
//! snapshots from a remote document collection while it works, and from a
//! client-persisted slot once it does not.
//!
//! # Example
//!
//! ```no_run
//! use vibe_library::{LibraryStore, LocalConfig};
//! use vibe_core::Track;
//!
//! # async fn example() {
//! let store = LibraryStore::local_only(LocalConfig::new("./data/stm_library.json"));
//!
//! let subscription = store.subscribe(|tracks| {
//!     println!("{} tracks", tracks.len());
//! });
//!
//! store.add(Track::new("Demo", "Local Artist", "file:///music/demo.mp3")).await;
//! subscription.dispose();
//! # }
//! ```

#![forbid(unsafe_code)]

mod backend;
mod defaults;
mod error;
mod local;
mod remote;
mod store;

pub use backend::{LibraryBackend, SnapshotFeed};
pub use defaults::default_library;
pub use error::{LibraryError, Result};
pub use local::{LocalBackend, LocalConfig, DEFAULT_SLOT_PATH};
pub use remote::{HttpRemoteBackend, RemoteConfig, DEFAULT_POLL_INTERVAL};
pub use store::{LibraryStore, StoreMode, Subscription};
