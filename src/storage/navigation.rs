//! History and bookmark list semantics over a [`KeyValueStore`].

use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::{Bookmark, HistoryItem, KeyValueStore, NewBookmark, NewHistoryItem, StorageError};

/// Key holding the history list.
pub const HISTORY_KEY: &str = "browsing_history";
/// Key holding the bookmark list.
pub const BOOKMARKS_KEY: &str = "user_bookmarks";

/// Navigation records for the host UI.
///
/// Lists are newest first. Writes are serialized so concurrent API calls do
/// not lose each other's updates.
pub struct NavigationStore<S> {
    kv: S,
    history_limit: usize,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> NavigationStore<S> {
    pub fn new(kv: S, history_limit: usize) -> Self {
        Self {
            kv,
            history_limit,
            write_lock: Mutex::new(()),
        }
    }

    pub fn get_history(&self) -> Result<Vec<HistoryItem>, StorageError> {
        self.load(HISTORY_KEY)
    }

    /// Record a visit: any older entry for the same URL is dropped, the new one
    /// goes first, and the list is cut to the history limit.
    pub fn add_history_item(&self, entry: NewHistoryItem) -> Result<Vec<HistoryItem>, StorageError> {
        let item = entry.into_item();
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut history = self.get_history()?;
        history.retain(|h| h.url != item.url);
        history.insert(0, item);
        history.truncate(self.history_limit);

        self.store(HISTORY_KEY, &history)?;
        Ok(history)
    }

    pub fn clear_history(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.kv.delete(HISTORY_KEY)
    }

    pub fn get_bookmarks(&self) -> Result<Vec<Bookmark>, StorageError> {
        self.load(BOOKMARKS_KEY)
    }

    /// Remove the bookmark for this URL if there is one, otherwise add it first.
    pub fn toggle_bookmark(&self, entry: NewBookmark) -> Result<Vec<Bookmark>, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut bookmarks = self.get_bookmarks()?;
        if bookmarks.iter().any(|b| b.url == entry.url) {
            bookmarks.retain(|b| b.url != entry.url);
        } else {
            bookmarks.insert(0, entry.into_bookmark());
        }

        self.store(BOOKMARKS_KEY, &bookmarks)?;
        Ok(bookmarks)
    }

    pub fn remove_bookmark(&self, url: &str) -> Result<Vec<Bookmark>, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut bookmarks = self.get_bookmarks()?;
        bookmarks.retain(|b| b.url != url);

        self.store(BOOKMARKS_KEY, &bookmarks)?;
        Ok(bookmarks)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        match self.kv.get(key)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn store<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StorageError> {
        self.kv.put(key, serde_json::to_value(items)?)
    }
}
