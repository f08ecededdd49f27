//! The attribute rewrite table and URL resolution.
//!
//! Every URL-bearing attribute the gateway touches is listed in
//! [`REWRITE_RULES`]. Resolution is pure: given an attribute value, the page's
//! base URL and the gateway origin it yields the replacement value, `None` to
//! leave the attribute alone, or a [`TransformFault`] which callers recover
//! from by also leaving the attribute alone.

use url::Url;

use crate::rewrite::TransformFault;
use crate::target::GatewayOrigin;

/// How an attribute value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// A single URL.
    Url,
    /// A comma-separated list of `url [descriptor]` candidates.
    SrcSet,
}

/// One row of the rewrite table.
#[derive(Debug)]
pub struct RewriteRule {
    /// lol_html selector for the elements carrying the attribute.
    pub selector: &'static str,
    pub attribute: &'static str,
    pub kind: AttributeKind,
}

const MEDIA_SRC: &str = "img[src], video[src], audio[src], source[src], track[src], \
                         iframe[src], embed[src]";
const MEDIA_POSTER: &str = "img[poster], video[poster], audio[poster], source[poster], \
                            track[poster], iframe[poster], embed[poster]";

pub static REWRITE_RULES: &[RewriteRule] = &[
    RewriteRule {
        selector: "a[href], area[href]",
        attribute: "href",
        kind: AttributeKind::Url,
    },
    RewriteRule {
        selector: MEDIA_SRC,
        attribute: "src",
        kind: AttributeKind::Url,
    },
    RewriteRule {
        selector: MEDIA_POSTER,
        attribute: "poster",
        kind: AttributeKind::Url,
    },
    RewriteRule {
        selector: "img[srcset], source[srcset]",
        attribute: "srcset",
        kind: AttributeKind::SrcSet,
    },
    RewriteRule {
        selector: "link[href]",
        attribute: "href",
        kind: AttributeKind::Url,
    },
    RewriteRule {
        selector: "script[src]",
        attribute: "src",
        kind: AttributeKind::Url,
    },
];

impl RewriteRule {
    /// Compute the replacement for `raw` under this rule.
    pub fn rewrite(
        &self,
        raw: &str,
        base: &Url,
        gateway: &GatewayOrigin,
    ) -> Result<Option<String>, TransformFault> {
        match self.kind {
            AttributeKind::Url => rewrite_url(raw, base, gateway),
            AttributeKind::SrcSet => rewrite_srcset(raw, base, gateway),
        }
    }
}

/// Resolve an attribute value to the absolute URL the gateway should fetch.
///
/// `Ok(None)` means the value is deliberately left alone: empty, a fragment,
/// a `javascript:`/`mailto:` URI, or something that resolves to a non-http(s)
/// scheme.
pub fn resolve(raw: &str, base: &Url) -> Result<Option<Url>, TransformFault> {
    let value = raw.trim();
    if value.is_empty()
        || value.starts_with('#')
        || has_scheme(value, "javascript")
        || has_scheme(value, "mailto")
    {
        return Ok(None);
    }

    if let Some(scheme) = scheme_prefix(value) {
        if !is_valid_scheme(scheme) {
            return Err(TransformFault::MalformedScheme);
        }
    }

    let absolute = base.join(value).map_err(TransformFault::Unresolvable)?;
    if matches!(absolute.scheme(), "http" | "https") {
        Ok(Some(absolute))
    } else {
        Ok(None)
    }
}

/// Resolve `raw` and wrap it as a proxy URL.
pub fn rewrite_url(
    raw: &str,
    base: &Url,
    gateway: &GatewayOrigin,
) -> Result<Option<String>, TransformFault> {
    Ok(resolve(raw, base)?
        .filter(|absolute| !gateway.is_proxy_url(absolute))
        .map(|absolute| gateway.proxy_url(absolute.as_str()).into_string()))
}

/// Rewrite each candidate of a `srcset`, keeping width/density descriptors.
pub fn rewrite_srcset(
    raw: &str,
    base: &Url,
    gateway: &GatewayOrigin,
) -> Result<Option<String>, TransformFault> {
    // Commas inside data: URLs make candidate splitting ambiguous.
    if raw.contains("data:") {
        return Ok(None);
    }

    let mut changed = false;
    let mut candidates = Vec::new();
    for candidate in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let (url, descriptor) = match candidate.split_once(char::is_whitespace) {
            Some((url, descriptor)) => (url, descriptor.trim()),
            None => (candidate, ""),
        };
        let url = match rewrite_url(url, base, gateway)? {
            Some(rewritten) => {
                changed = true;
                rewritten
            }
            None => url.to_string(),
        };
        if descriptor.is_empty() {
            candidates.push(url);
        } else {
            candidates.push(format!("{url} {descriptor}"));
        }
    }

    Ok(changed.then(|| candidates.join(", ")))
}

fn has_scheme(value: &str, scheme: &str) -> bool {
    scheme_prefix(value).is_some_and(|s| s.eq_ignore_ascii_case(scheme))
}

/// The text before a `:` that precedes any `/`, `?` or `#`.
fn scheme_prefix(value: &str) -> Option<&str> {
    let end = value.find([':', '/', '?', '#'])?;
    (value.as_bytes()[end] == b':').then(|| &value[..end])
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/page.html?x=1").unwrap()
    }

    fn gateway() -> GatewayOrigin {
        GatewayOrigin::parse("http://gw.local:8080").unwrap()
    }

    fn proxied(absolute: &str) -> String {
        gateway().proxy_url(absolute).into_string()
    }

    #[test]
    fn test_relative_urls_resolve_against_base() {
        let cases = [
            ("img/a.png", "https://example.com/docs/img/a.png"),
            ("/root.css", "https://example.com/root.css"),
            ("../up.js", "https://example.com/up.js"),
            ("?page=2", "https://example.com/docs/page.html?page=2"),
            ("//cdn.example.net/x.js", "https://cdn.example.net/x.js"),
            ("  spaced.html  ", "https://example.com/docs/spaced.html"),
        ];
        for (relative, absolute) in cases {
            assert_eq!(
                rewrite_url(relative, &base(), &gateway()).unwrap(),
                Some(proxied(absolute)),
                "{relative}"
            );
        }
    }

    #[test]
    fn test_absolute_urls_are_wrapped() {
        assert_eq!(
            rewrite_url("http://other.example/a?b=c", &base(), &gateway()).unwrap(),
            Some(proxied("http://other.example/a?b=c"))
        );
    }

    #[test]
    fn test_skip_list_is_untouched() {
        for value in [
            "#section",
            "#",
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:someone@example.com",
            "",
            "   ",
        ] {
            assert_eq!(rewrite_url(value, &base(), &gateway()).unwrap(), None, "{value}");
        }
    }

    #[test]
    fn test_non_http_schemes_are_untouched() {
        for value in ["data:image/png;base64,AAAA", "tel:+123", "blob:https://x/1", "ftp://f/x"] {
            assert_eq!(rewrite_url(value, &base(), &gateway()).unwrap(), None, "{value}");
        }
    }

    #[test]
    fn test_malformed_scheme_is_a_fault() {
        assert!(matches!(
            rewrite_url("ht!tp://??", &base(), &gateway()),
            Err(TransformFault::MalformedScheme)
        ));
        assert!(matches!(
            rewrite_url(":nothing", &base(), &gateway()),
            Err(TransformFault::MalformedScheme)
        ));
    }

    #[test]
    fn test_unresolvable_is_a_fault() {
        assert!(matches!(
            rewrite_url("http://[::1", &base(), &gateway()),
            Err(TransformFault::Unresolvable(_))
        ));
    }

    #[test]
    fn test_already_proxied_is_untouched() {
        let existing = proxied("https://example.com/");
        assert_eq!(rewrite_url(&existing, &base(), &gateway()).unwrap(), None);
    }

    #[test]
    fn test_srcset_candidates() {
        let out = rewrite_srcset("a.png 1x, /b.png 2x,c.png", &base(), &gateway())
            .unwrap()
            .unwrap();
        assert_eq!(
            out,
            format!(
                "{} 1x, {} 2x, {}",
                proxied("https://example.com/docs/a.png"),
                proxied("https://example.com/b.png"),
                proxied("https://example.com/docs/c.png"),
            )
        );
    }

    #[test]
    fn test_srcset_with_data_url_is_untouched() {
        assert_eq!(
            rewrite_srcset("data:image/png;base64,AA 1x, b.png 2x", &base(), &gateway()).unwrap(),
            None
        );
    }

    #[test]
    fn test_table_covers_every_rewritten_element() {
        let selectors: Vec<_> = REWRITE_RULES.iter().map(|r| r.selector).collect();
        for tag in ["a[", "area[", "img[", "video[", "audio[", "source[", "track[", "iframe[", "embed[", "link[", "script["] {
            assert!(selectors.iter().any(|s| s.contains(tag)), "{tag}");
        }
    }
}
