//! Feed acquisition and parsing.
//!
//! [`fetcher`] retrieves one feed document per category over HTTP;
//! [`parser`] normalizes the four source shapes (strict XML RSS, RSS that
//! only survives a lenient HTML parse, Atom, and a raw anchor list) into a
//! uniform [`ItemNode`] sequence.

mod fetcher;
mod parser;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{now_stamp, parse_items, parse_timestamp, FeedShape, ItemNode, TIMESTAMP_FORMAT};
