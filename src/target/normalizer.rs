//! Free-form input to absolute URL.
//!
//! Accepts whatever a user typed into an address bar: a full URL, a bare
//! domain, or a search phrase.

use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded;
use url::Url;

/// Labels separated by dots, alphabetic TLD of two or more characters,
/// optional port and path.
static BARE_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z]{2,}(:\d+)?(/.*)?$")
        .expect("bare domain pattern is valid")
});

pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Canonicalizes user input into a scheme-qualified URL.
#[derive(Debug, Clone)]
pub struct Normalizer {
    search_url: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_URL)
    }
}

impl Normalizer {
    /// `search_url` is a prefix; the encoded query is appended to it.
    pub fn new(search_url: impl Into<String>) -> Self {
        Self {
            search_url: search_url.into(),
        }
    }

    /// Normalize `input`.
    ///
    /// Returns an empty string for empty or whitespace-only input; every other
    /// input yields an absolute http(s) URL (a search URL as last resort).
    pub fn normalize(&self, input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        if has_http_prefix(trimmed) {
            return match Url::parse(trimmed) {
                Ok(url) => url.to_string(),
                Err(_) => self.search(trimmed),
            };
        }

        if BARE_DOMAIN.is_match(trimmed) {
            return format!("https://{trimmed}");
        }

        self.search(trimmed)
    }

    /// True when `input` normalizes to a parseable http(s) URL.
    pub fn is_valid_url(&self, input: &str) -> bool {
        Url::parse(&self.normalize(input))
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    fn search(&self, query: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("{}{}", self.search_url, encoded)
    }
}

fn has_http_prefix(s: &str) -> bool {
    let starts_with = |prefix: &str| {
        s.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    starts_with("http://") || starts_with("https://")
}
