//! HTTP retrieval of feed documents.
//!
//! One GET per category, no retries: a failed category is skipped by the
//! orchestrator and picked up again on the next run.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a feed document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
}

/// Fetch a feed document, returning its raw bytes.
///
/// The shared client supplies the identifying User-Agent header; `timeout`
/// is the configured per-request bound. A non-2xx status is an error; the
/// caller decides whether that skips the category.
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let response = tokio::time::timeout(timeout, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    Ok(response.bytes().await?.to_vec())
}
