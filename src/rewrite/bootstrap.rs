//! Navigation-sync bootstrap script injected into every rewritten page.
//!
//! When the page runs inside a frame it posts
//! `{ type: "NAV_SYNC", url, title }` to the parent once the DOM is parsed,
//! so the host UI can follow navigation that happened inside the frame.

/// `type` field of the posted message.
pub const NAV_SYNC_MESSAGE_TYPE: &str = "NAV_SYNC";

/// Marker attribute identifying the injected element.
pub const BOOTSTRAP_MARKER: &str = "data-prism-nav-sync";

/// Render the `<script>` element for a page at `page_url`.
pub fn bootstrap_script(page_url: &str) -> String {
    let url = script_string(page_url);
    format!(
        "<script {BOOTSTRAP_MARKER}>(function(){{\
var target={url};\
function sync(){{\
if(window.parent===window)return;\
window.parent.postMessage({{type:\"{NAV_SYNC_MESSAGE_TYPE}\",url:target,title:document.title}},\"*\");\
}}\
if(document.readyState===\"loading\"){{document.addEventListener(\"DOMContentLoaded\",sync);}}else{{sync();}}\
}})();</script>"
    )
}

/// A JavaScript string literal that cannot close the surrounding script
/// element.
fn script_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned())
        .to_string()
        .replace("</", "<\\/")
        .replace("<!--", "<\\!--")
}
