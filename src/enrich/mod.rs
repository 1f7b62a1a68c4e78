//! Per-article metadata enrichment.
//!
//! Three independent signals per article URL, each with its own fallback
//! chain: bookmark count from the aggregator's count endpoint, a thumbnail
//! scraped from the target page, and a site name derived from the URL.
//! Failures degrade to a default (0, `None`, `"unknown"`) instead of
//! aborting the article; no signal blocks another.

mod bookmarks;
mod site;
mod thumbnail;

pub use bookmarks::bookmark_count;
pub use site::site_name;
pub use thumbnail::resolve_thumbnail;
