//! Bookmark-count lookup against the aggregator's count endpoint.

use serde_json::Value;

/// Fetch the bookmark count for an article URL.
///
/// The endpoint expects the target URL appended with only `:` and `/`
/// percent-encoded, not full percent-encoding. A non-200 response, empty
/// body, or the literal text `null` all mean "no bookmarks yet". Any failure
/// degrades to 0 and is logged; this never aborts article processing.
pub async fn bookmark_count(client: &reqwest::Client, api_base: &str, url: &str) -> i64 {
    match fetch_count(client, api_base, url).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(url = url, error = %e, "Error getting bookmark count");
            0
        }
    }
}

async fn fetch_count(
    client: &reqwest::Client,
    api_base: &str,
    url: &str,
) -> anyhow::Result<i64> {
    let encoded = url.replace(':', "%3A").replace('/', "%2F");
    let endpoint = format!("{}{}", api_base, encoded);

    let response = client.get(&endpoint).send().await?;
    if !response.status().is_success() {
        return Ok(0);
    }

    let body = response.text().await?;
    if body.is_empty() || body == "null" {
        return Ok(0);
    }

    let data: Value = serde_json::from_str(&body)?;
    Ok(data.get("count").and_then(Value::as_i64).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn count_server(template: ResponseTemplate) -> (MockServer, String) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/entry/json/"))
            .respond_with(template)
            .mount(&server)
            .await;
        let api_base = format!("{}/entry/json/", server.uri());
        (server, api_base)
    }

    #[tokio::test]
    async fn test_count_from_json_body() {
        let (_server, api_base) =
            count_server(ResponseTemplate::new(200).set_body_string(r#"{"count": 42}"#)).await;
        let client = reqwest::Client::new();
        let count = bookmark_count(&client, &api_base, "https://example.com/a").await;
        assert_eq!(count, 42);
    }

    #[tokio::test]
    async fn test_literal_null_body_is_zero() {
        // The endpoint answers "null" for unknown URLs; that is not a parse
        // failure.
        let (_server, api_base) =
            count_server(ResponseTemplate::new(200).set_body_string("null")).await;
        let client = reqwest::Client::new();
        assert_eq!(
            bookmark_count(&client, &api_base, "https://example.com/a").await,
            0
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_zero() {
        let (_server, api_base) = count_server(ResponseTemplate::new(200)).await;
        let client = reqwest::Client::new();
        assert_eq!(
            bookmark_count(&client, &api_base, "https://example.com/a").await,
            0
        );
    }

    #[tokio::test]
    async fn test_non_200_is_zero() {
        let (_server, api_base) = count_server(ResponseTemplate::new(503)).await;
        let client = reqwest::Client::new();
        assert_eq!(
            bookmark_count(&client, &api_base, "https://example.com/a").await,
            0
        );
    }

    #[tokio::test]
    async fn test_malformed_json_degrades_to_zero() {
        let (_server, api_base) =
            count_server(ResponseTemplate::new(200).set_body_string("{not json")).await;
        let client = reqwest::Client::new();
        assert_eq!(
            bookmark_count(&client, &api_base, "https://example.com/a").await,
            0
        );
    }

    #[tokio::test]
    async fn test_json_without_count_field_is_zero() {
        let (_server, api_base) =
            count_server(ResponseTemplate::new(200).set_body_string(r#"{"title": "x"}"#)).await;
        let client = reqwest::Client::new();
        assert_eq!(
            bookmark_count(&client, &api_base, "https://example.com/a").await,
            0
        );
    }

    #[tokio::test]
    async fn test_target_url_is_encoded_in_path() {
        let server = MockServer::start().await;
        // Slashes in the target URL are escaped, so the whole URL stays a
        // single path segment.
        Mock::given(method("GET"))
            .and(path_regex("^/entry/json/.+%2Fa$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"count": 7}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let api_base = format!("{}/entry/json/", server.uri());
        let count = bookmark_count(&client, &api_base, "https://example.com/a").await;
        assert_eq!(count, 7);
    }
}
