//! History and bookmark storage.
//!
//! # Data Flow
//! ```text
//! /api/history, /api/bookmarks handlers
//!     → navigation.rs (list semantics: dedupe, newest first, limits)
//!     → kv.rs (KeyValueStore: get/put/delete JSON by key)
//!         → MemoryStore (DashMap, optional JSON snapshot file)
//! ```
//!
//! # Design Decisions
//! - The proxy pipeline never touches this module
//! - Persistence is key-addressed; only read-your-writes per key is assumed
//! - Each list is stored whole under one key

pub mod error;
pub mod kv;
pub mod navigation;
pub mod types;

pub use error::StorageError;
pub use kv::{KeyValueStore, MemoryStore};
pub use navigation::{NavigationStore, BOOKMARKS_KEY, HISTORY_KEY};
pub use types::{Bookmark, HistoryItem, NewBookmark, NewHistoryItem};
