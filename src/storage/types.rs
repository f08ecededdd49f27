//! Navigation records and their API input forms.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::target::display::{clean_title, favicon_url};

/// A visited page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub url: String,
    pub title: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
}

/// A saved page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
    /// Epoch milliseconds.
    pub created_at: u64,
}

/// History entry as posted by clients; everything but `url` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryItem {
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub timestamp: Option<u64>,
    pub favicon_url: Option<String>,
}

impl NewHistoryItem {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn into_item(self) -> HistoryItem {
        HistoryItem {
            id: self.id.unwrap_or_else(new_id),
            title: clean_title(&self.title, &self.url),
            timestamp: self.timestamp.unwrap_or_else(now_millis),
            favicon_url: self.favicon_url.or_else(|| non_empty(favicon_url(&self.url))),
            url: self.url,
        }
    }
}

/// Bookmark as posted by clients; everything but `url` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmark {
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub favicon_url: Option<String>,
    pub created_at: Option<u64>,
}

impl NewBookmark {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn into_bookmark(self) -> Bookmark {
        Bookmark {
            id: self.id.unwrap_or_else(new_id),
            title: clean_title(&self.title, &self.url),
            favicon_url: self.favicon_url.or_else(|| non_empty(favicon_url(&self.url))),
            created_at: self.created_at.unwrap_or_else(now_millis),
            url: self.url,
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
