//! Site-name extraction from article URLs.

use url::Url;

/// Sentinel returned for URLs no host can be read from.
pub const UNKNOWN_SITE: &str = "unknown";

/// Extract a site label from an article URL.
///
/// Strips a leading `www.` and takes the second-to-last dot-separated host
/// segment, so `https://news.example.com/x` yields `example`. Known
/// limitation: multi-part TLDs are not special-cased, so
/// `https://sub.example.co.jp/x` yields `co` rather than `example`. A
/// malformed URL yields [`UNKNOWN_SITE`].
pub fn site_name(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return UNKNOWN_SITE.to_string(),
    };
    let host = match parsed.host_str() {
        Some(h) => h,
        None => return UNKNOWN_SITE.to_string(),
    };

    let host = host.strip_prefix("www.").unwrap_or(host);
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2].to_string()
    } else {
        host.to_string()
    }
}
