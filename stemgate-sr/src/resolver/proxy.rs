//! Proxy URL conversion
//!
//! Direct upload-host URLs are not playable from the storefront origin
//! (the media host does not send permissive CORS headers), so candidates
//! are rewritten onto the same-origin media proxy before probing.

use tracing::debug;

/// Rewrite a direct storage URL into its same-origin proxy form.
///
/// - already proxy-shaped: returned unchanged
/// - contains the uploads segment: suffix after the segment is rebuilt
///   under the proxy prefix
/// - anything else: returned unchanged with a diagnostic (best effort,
///   never an error)
pub fn to_proxy_url(url: &str, uploads_segment: &str, proxy_prefix: &str) -> String {
    if url.starts_with(proxy_prefix) {
        return url.to_string();
    }

    if let Some(pos) = url.find(uploads_segment) {
        let suffix = &url[pos + uploads_segment.len()..];
        return format!("{proxy_prefix}{suffix}");
    }

    debug!(url = %url, "URL has no recognized uploads segment, leaving unchanged");
    url.to_string()
}
