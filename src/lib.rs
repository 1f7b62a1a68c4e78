//! Harvests trending articles from a social-bookmarking aggregator's
//! hot-entry feeds and persists them into SQLite with category links.
//!
//! The pipeline has two stages:
//!
//! 1. **Feed acquisition and parsing** ([`feed`]) — fetch one feed document
//!    per category and normalize four source shapes (strict XML RSS,
//!    RSS-as-HTML, Atom, anchor-list fallback) into a uniform item sequence.
//! 2. **Enrichment and persistence** ([`enrich`], [`storage`]) — per item,
//!    resolve a thumbnail, bookmark count, and site name, then insert or
//!    refresh the article row.
//!
//! [`harvest::Harvester`] drives both stages strictly sequentially; the only
//! throttling is fixed sleeps between articles and between categories.

pub mod config;
pub mod enrich;
pub mod feed;
pub mod harvest;
pub mod storage;

pub use config::{CategorySource, Config};
pub use harvest::Harvester;
pub use storage::Database;
