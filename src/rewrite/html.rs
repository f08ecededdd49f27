//! Incremental page rewriter built on lol_html.
//!
//! `PageRewriter` is fed arbitrary byte chunks and pushes rewritten bytes into
//! its output sink as soon as each token is complete. It keeps per-document
//! state (base URL, whether the bootstrap script was injected) and nothing
//! else.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lol_html::errors::RewritingError;
use lol_html::html_content::{ContentType, Element};
use lol_html::{element, end, HtmlRewriter, OutputSink, Settings};
use url::Url;

use crate::observability::metrics;
use crate::rewrite::bootstrap::bootstrap_script;
use crate::rewrite::rules::{RewriteRule, REWRITE_RULES};
use crate::rewrite::{RewriteContext, TransformFault};
use crate::target::GatewayOrigin;

/// What happened to one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Attributes replaced with proxy URLs.
    pub rewritten: usize,
    /// Attributes left alone because they could not be resolved.
    pub faults: usize,
    pub script_injected: bool,
}

struct PageState {
    gateway: GatewayOrigin,
    base: RefCell<Url>,
    base_locked: Cell<bool>,
    script: String,
    script_injected: Cell<bool>,
    rewritten: Cell<usize>,
    faults: Cell<usize>,
}

impl PageState {
    fn new(ctx: &RewriteContext) -> Self {
        Self {
            gateway: ctx.gateway.clone(),
            base: RefCell::new(ctx.page_url.clone()),
            base_locked: Cell::new(false),
            script: bootstrap_script(ctx.page_url.as_str()),
            script_injected: Cell::new(false),
            rewritten: Cell::new(0),
            faults: Cell::new(0),
        }
    }

    /// Returns true exactly once per document.
    fn claim_injection(&self) -> bool {
        !self.script_injected.replace(true)
    }

    fn apply(&self, rule: &RewriteRule, el: &mut Element<'_, '_>) {
        let Some(raw) = el.get_attribute(rule.attribute) else {
            return;
        };

        let outcome = rule.rewrite(&raw, &self.base.borrow(), &self.gateway);
        match outcome {
            Ok(Some(value)) => match el.set_attribute(rule.attribute, &value) {
                Ok(()) => self.rewritten.set(self.rewritten.get() + 1),
                Err(e) => tracing::debug!(attribute = rule.attribute, error = %e, "Attribute not set"),
            },
            Ok(None) => {}
            Err(fault) => self.record_fault(&el.tag_name(), rule.attribute, &raw, &fault),
        }
    }

    /// The first `<base href>` wins, as in browsers.
    fn adopt_base(&self, el: &mut Element<'_, '_>) {
        if self.base_locked.replace(true) {
            return;
        }
        let Some(href) = el.get_attribute("href") else {
            return;
        };
        let joined = self.base.borrow().join(href.trim());
        match joined {
            Ok(base) => *self.base.borrow_mut() = base,
            Err(e) => self.record_fault("base", "href", &href, &TransformFault::Unresolvable(e)),
        }
    }

    fn record_fault(&self, tag: &str, attribute: &str, raw: &str, fault: &TransformFault) {
        self.faults.set(self.faults.get() + 1);
        metrics::record_rewrite_fault(fault.kind());
        tracing::debug!(
            tag,
            attribute,
            value = raw,
            error = %fault,
            "Leaving attribute unmodified"
        );
    }

    fn summary(&self) -> RewriteSummary {
        RewriteSummary {
            rewritten: self.rewritten.get(),
            faults: self.faults.get(),
            script_injected: self.script_injected.get(),
        }
    }
}

/// Streaming HTML rewriter for one document.
pub struct PageRewriter<O: OutputSink> {
    inner: HtmlRewriter<'static, O>,
    state: Rc<PageState>,
}

impl<O: OutputSink> PageRewriter<O> {
    pub fn new(ctx: &RewriteContext, sink: O) -> Self {
        let state = Rc::new(PageState::new(ctx));

        let head = Rc::clone(&state);
        let body = Rc::clone(&state);
        let base = Rc::clone(&state);
        let doc_end = Rc::clone(&state);

        let mut element_content_handlers = vec![
            // Prepending keeps the script inside <head> even when the
            // closing tag is omitted; the script waits for the DOM itself.
            element!("head", move |el| {
                if head.claim_injection() {
                    el.prepend(&head.script, ContentType::Html);
                }
                Ok(())
            }),
            element!("body", move |el| {
                if body.claim_injection() {
                    el.before(&format!("<head>{}</head>", body.script), ContentType::Html);
                }
                Ok(())
            }),
            element!("base[href]", move |el| {
                base.adopt_base(el);
                Ok(())
            }),
            element!("meta[http-equiv]", |el| {
                let is_csp = el
                    .get_attribute("http-equiv")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-security-policy"));
                if is_csp {
                    el.remove();
                }
                Ok(())
            }),
        ];

        for rule in REWRITE_RULES {
            let state = Rc::clone(&state);
            element_content_handlers.push(element!(rule.selector, move |el| {
                state.apply(rule, el);
                Ok(())
            }));
        }

        let document_content_handlers = vec![end!(move |end| {
            if doc_end.claim_injection() {
                end.append(&doc_end.script, ContentType::Html);
            }
            Ok(())
        })];

        let inner = HtmlRewriter::new(
            Settings {
                element_content_handlers,
                document_content_handlers,
                ..Settings::default()
            },
            sink,
        );

        Self { inner, state }
    }

    /// Feed the next chunk of the document.
    pub fn write(&mut self, chunk: &[u8]) -> Result<(), RewritingError> {
        self.inner.write(chunk)
    }

    /// Flush what remains and report what was done.
    pub fn end(self) -> Result<RewriteSummary, RewritingError> {
        let Self { inner, state } = self;
        inner.end()?;
        Ok(state.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::bootstrap::BOOTSTRAP_MARKER;

    fn ctx() -> RewriteContext {
        RewriteContext::new(
            Url::parse("https://example.com/docs/index.html").unwrap(),
            GatewayOrigin::parse("http://gw.local:8080").unwrap(),
        )
    }

    fn proxied(absolute: &str) -> String {
        ctx().gateway.proxy_url(absolute).into_string()
    }

    fn rewrite_chunks(chunks: &[&str]) -> (String, RewriteSummary) {
        let mut out = Vec::new();
        let mut rewriter = PageRewriter::new(&ctx(), |c: &[u8]| out.extend_from_slice(c));
        for chunk in chunks {
            rewriter.write(chunk.as_bytes()).unwrap();
        }
        let summary = rewriter.end().unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    fn rewrite(html: &str) -> (String, RewriteSummary) {
        rewrite_chunks(&[html])
    }

    #[test]
    fn test_script_injected_into_head() {
        let (out, summary) = rewrite("<html><head><title>T</title></head><body></body></html>");
        assert!(summary.script_injected);
        assert!(out.starts_with(&format!("<html><head><script {BOOTSTRAP_MARKER}>")));
        assert!(out.contains("</script><title>T</title></head>"));
        assert_eq!(out.matches(BOOTSTRAP_MARKER).count(), 1);
    }

    #[test]
    fn test_script_injected_once_with_many_heads() {
        let (out, _) = rewrite(
            "<html><head><title>A</title></head><head><meta charset=utf-8></head>\
             <body><head></head></body></html>",
        );
        assert_eq!(out.matches(BOOTSTRAP_MARKER).count(), 1);
    }

    #[test]
    fn test_missing_head_gets_one_before_body() {
        let (out, _) = rewrite("<html><body><p>x</p></body></html>");
        assert!(out.contains(&format!("<html><head><script {BOOTSTRAP_MARKER}>")));
        assert!(out.contains("</script></head><body>"));
        assert_eq!(out.matches(BOOTSTRAP_MARKER).count(), 1);
    }

    #[test]
    fn test_fragment_gets_script_at_end() {
        let (out, summary) = rewrite("<p>just a fragment</p>");
        assert!(summary.script_injected);
        assert!(out.starts_with("<p>just a fragment</p><script"));
    }

    #[test]
    fn test_anchor_hrefs() {
        let (out, summary) = rewrite(
            r##"<a href="next.html">n</a><a href="/abs">a</a><area href="https://other.example/">
<a href="#top">t</a><a href="javascript:void(0)">j</a><a href="mailto:x@example.com">m</a>"##,
        );
        assert!(out.contains(&format!(r#"href="{}""#, proxied("https://example.com/docs/next.html"))));
        assert!(out.contains(&format!(r#"href="{}""#, proxied("https://example.com/abs"))));
        assert!(out.contains(&format!(r#"href="{}""#, proxied("https://other.example/"))));
        assert!(out.contains(r##"href="#top""##));
        assert!(out.contains(r#"href="javascript:void(0)""#));
        assert!(out.contains(r#"href="mailto:x@example.com""#));
        assert_eq!(summary.rewritten, 3);
        assert_eq!(summary.faults, 0);
    }

    #[test]
    fn test_media_and_subresources() {
        let (out, _) = rewrite(
            r#"<head><link rel="stylesheet" href="style.css"><script src="/app.js"></script></head>
<body><img src="a.png" srcset="a.png 1x, b.png 2x"><video src="v.mp4" poster="p.jpg">
<source src="v.webm"><track src="subs.vtt"></video><audio src="s.mp3"></audio>
<iframe src="https://frame.example/"></iframe><embed src="e.swf"><script>inline()</script></body>"#,
        );
        for absolute in [
            "https://example.com/docs/style.css",
            "https://example.com/app.js",
            "https://example.com/docs/a.png",
            "https://example.com/docs/v.mp4",
            "https://example.com/docs/p.jpg",
            "https://example.com/docs/v.webm",
            "https://example.com/docs/subs.vtt",
            "https://example.com/docs/s.mp3",
            "https://frame.example/",
            "https://example.com/docs/e.swf",
        ] {
            assert!(out.contains(&proxied(absolute)), "{absolute} not rewritten:\n{out}");
        }
        assert!(out.contains(&format!(
            r#"srcset="{} 1x, {} 2x""#,
            proxied("https://example.com/docs/a.png"),
            proxied("https://example.com/docs/b.png")
        )));
        assert!(out.contains("<script>inline()</script>"));
    }

    #[test]
    fn test_malformed_href_left_as_is() {
        let (out, summary) =
            rewrite(r#"<body><a href="ht!tp://??">bad</a><a href="/ok">ok</a></body>"#);
        assert!(out.contains(r#"<a href="ht!tp://??">bad</a>"#));
        assert!(out.contains(&proxied("https://example.com/ok")));
        assert!(out.ends_with("</body>"));
        assert_eq!(summary.faults, 1);
        assert_eq!(summary.rewritten, 1);
    }

    #[test]
    fn test_base_href_changes_resolution() {
        let (out, _) = rewrite(
            r#"<head><base href="https://cdn.example.net/assets/"></head><body>
<img src="x.png"><base href="https://ignored.example/"><img src="y.png"></body>"#,
        );
        assert!(out.contains(r#"<base href="https://cdn.example.net/assets/">"#));
        assert!(out.contains(&proxied("https://cdn.example.net/assets/x.png")));
        assert!(out.contains(&proxied("https://cdn.example.net/assets/y.png")));
    }

    #[test]
    fn test_meta_csp_removed() {
        let (out, _) = rewrite(
            r#"<head><meta http-equiv="Content-Security-Policy" content="frame-ancestors 'none'"><meta http-equiv="refresh" content="5"></head>"#,
        );
        assert!(!out.contains("frame-ancestors"));
        assert!(out.contains(r#"http-equiv="refresh""#));
    }

    #[test]
    fn test_chunk_boundaries_do_not_matter() {
        let html = r#"<html><head><title>x</title></head><body><a href="/split">s</a><img src="i.png"></body></html>"#;
        let (whole, _) = rewrite(html);
        let (split, _) = rewrite_chunks(&["<html><he", "ad><title>x</title></head><body><a hr", "ef=\"/spl", "it\">s</a><img src=\"i.p", "ng\"></body></html>"]);
        assert_eq!(whole, split);
    }

    #[test]
    fn test_untouched_markup_is_byte_identical() {
        let html = "<!DOCTYPE html>\n<html lang=en><head><title>Ü</title></head><body class='x'>\n<p data-a=1>text &amp; more</p>\n</body></html>";
        let (out, _) = rewrite(html);
        let script_end = out.find("</script>").unwrap() + "</script>".len();
        let without_script = format!("{}{}", &out[..out.find("<script").unwrap()], &out[script_end..]);
        assert_eq!(without_script, html);
    }
}
