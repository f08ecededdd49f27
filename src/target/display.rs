//! Human-facing renderings of target URLs.

use url::Url;

/// Favicon service URL for the host of `url`, or an empty string when `url`
/// has no host.
pub fn favicon_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .map(|host| format!("https://www.google.com/s2/favicons?domain={host}&sz=64"))
        .unwrap_or_default()
}

/// Short label for a URL: the host without `www.`, or `Search: <q>` for a
/// Google search URL.
pub fn display_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let host = parsed.host_str().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);

    if host.contains("google.com") && parsed.path().contains("search") {
        return match parsed.query_pairs().find(|(k, _)| k == "q") {
            Some((_, q)) if !q.is_empty() => format!("Search: {q}"),
            _ => "Google Search".to_string(),
        };
    }
    host.to_string()
}

/// Host plus path, without `www.` or a trailing slash.
pub fn pretty_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let host = parsed.host_str().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    let pretty = format!("{host}{}", parsed.path());
    pretty.strip_suffix('/').map(str::to_owned).unwrap_or(pretty)
}

/// Trimmed page title, falling back to the display domain when the page did
/// not report one.
pub fn clean_title(title: &str, url: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() || trimmed == "undefined" {
        display_domain(url)
    } else {
        trimmed.to_string()
    }
}
