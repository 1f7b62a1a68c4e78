//! Thumbnail discovery by scraping the article page.

use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Minimum width and height for an inline `<img>` to count as a thumbnail.
const MIN_IMAGE_DIMENSION: u32 = 200;

/// Resolve a thumbnail image URL for an article page.
///
/// Search order: Open Graph image meta tag, Twitter Card image meta tag,
/// first `<img>` whose declared width and height are both at least 200px,
/// then the first `<img>` with a source at all. Protocol-relative and
/// root-relative results are rewritten against the page's scheme and host.
/// `timeout` is the configured per-request bound. Any fetch or parse failure
/// yields `None`; articles are stored without a thumbnail rather than
/// dropped.
pub async fn resolve_thumbnail(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Option<String> {
    match fetch_page(client, url, timeout).await {
        Ok(body) => scan_page(&body, url),
        Err(e) => {
            tracing::warn!(url = url, error = %e, "Error getting thumbnail");
            None
        }
    }
}

async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> anyhow::Result<String> {
    let response = tokio::time::timeout(timeout, client.get(url).send()).await??;
    anyhow::ensure!(
        response.status().is_success(),
        "status {}",
        response.status()
    );
    Ok(response.text().await?)
}

fn scan_page(body: &str, page_url: &str) -> Option<String> {
    let page = Url::parse(page_url).ok()?;
    let document = Html::parse_document(body);

    let og_sel = Selector::parse(r#"meta[property="og:image"]"#).unwrap();
    if let Some(content) = document
        .select(&og_sel)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        return Some(absolutize(content, &page));
    }

    let twitter_sel = Selector::parse(r#"meta[name="twitter:image"]"#).unwrap();
    if let Some(content) = document
        .select(&twitter_sel)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        return Some(absolutize(content, &page));
    }

    let img_sel = Selector::parse("img").unwrap();

    // First image with declared dimensions large enough, in document order.
    for img in document.select(&img_sel) {
        let (Some(width), Some(height)) = (img.value().attr("width"), img.value().attr("height"))
        else {
            continue;
        };
        let (Ok(width), Ok(height)) = (width.trim().parse::<u32>(), height.trim().parse::<u32>())
        else {
            continue;
        };
        if width >= MIN_IMAGE_DIMENSION && height >= MIN_IMAGE_DIMENSION {
            if let Some(src) = img
                .value()
                .attr("src")
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                return Some(absolutize(src, &page));
            }
        }
    }

    // No sized candidate: settle for the first image with a source.
    document
        .select(&img_sel)
        .find_map(|img| {
            img.value()
                .attr("src")
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(|src| absolutize(src, &page))
}

/// Rewrite protocol-relative (`//…`) and root-relative (`/…`) image URLs to
/// absolute ones using the page's scheme, host, and port. Anything else is
/// returned unchanged.
fn absolutize(src: &str, page: &Url) -> String {
    if let Some(rest) = src.strip_prefix("//") {
        return format!("{}://{}", page.scheme(), rest);
    }
    if src.starts_with('/') {
        if let Some(host) = page.host_str() {
            return match page.port() {
                Some(port) => format!("{}://{}:{}{}", page.scheme(), host, port, src),
                None => format!("{}://{}{}", page.scheme(), host, src),
            };
        }
    }
    src.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page() -> Url {
        Url::parse("https://site.com/p").unwrap()
    }

    #[test]
    fn test_absolutize_protocol_relative() {
        assert_eq!(
            absolutize("//cdn.example.com/a.png", &page()),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_absolutize_root_relative() {
        assert_eq!(absolutize("/img/a.png", &page()), "https://site.com/img/a.png");
    }

    #[test]
    fn test_absolutize_keeps_port() {
        let page = Url::parse("http://127.0.0.1:8080/p").unwrap();
        assert_eq!(
            absolutize("/img/a.png", &page),
            "http://127.0.0.1:8080/img/a.png"
        );
    }

    #[test]
    fn test_absolutize_leaves_absolute_urls_alone() {
        assert_eq!(
            absolutize("https://other.com/b.png", &page()),
            "https://other.com/b.png"
        );
    }

    #[test]
    fn test_scan_prefers_og_image() {
        let body = r#"<html><head>
            <meta property="og:image" content="https://cdn.site.com/og.png"/>
            <meta name="twitter:image" content="https://cdn.site.com/tw.png"/>
        </head><body><img src="/inline.png" width="500" height="500"></body></html>"#;
        assert_eq!(
            scan_page(body, "https://site.com/p").as_deref(),
            Some("https://cdn.site.com/og.png")
        );
    }

    #[test]
    fn test_scan_falls_back_to_twitter_card() {
        let body = r#"<html><head>
            <meta name="twitter:image" content="//cdn.site.com/tw.png"/>
        </head><body></body></html>"#;
        assert_eq!(
            scan_page(body, "https://site.com/p").as_deref(),
            Some("https://cdn.site.com/tw.png")
        );
    }

    #[test]
    fn test_scan_picks_first_large_image() {
        let body = r#"<html><body>
            <img src="/tiny.png" width="50" height="50">
            <img src="/unsized.png">
            <img src="/big.png" width="200" height="300">
            <img src="/bigger.png" width="800" height="600">
        </body></html>"#;
        assert_eq!(
            scan_page(body, "https://site.com/p").as_deref(),
            Some("https://site.com/big.png")
        );
    }

    #[test]
    fn test_scan_settles_for_first_image_without_dimensions() {
        let body = r#"<html><body>
            <img src="/only.png">
            <img src="/second.png" width="50" height="50">
        </body></html>"#;
        assert_eq!(
            scan_page(body, "https://site.com/p").as_deref(),
            Some("https://site.com/only.png")
        );
    }

    #[test]
    fn test_scan_no_candidates_is_none() {
        let body = "<html><body><p>words only</p></body></html>";
        assert_eq!(scan_page(body, "https://site.com/p"), None);
    }

    #[tokio::test]
    async fn test_resolve_thumbnail_from_live_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head><meta property="og:image" content="/hero.jpg"/></head></html>"#,
            ))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/article", server.uri());
        let thumbnail = resolve_thumbnail(&client, &url, Duration::from_secs(10)).await;
        assert_eq!(thumbnail, Some(format!("{}/hero.jpg", server.uri())));
    }

    #[tokio::test]
    async fn test_resolve_thumbnail_non_200_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/article", server.uri());
        assert_eq!(
            resolve_thumbnail(&client, &url, Duration::from_secs(10)).await,
            None
        );
    }

    #[tokio::test]
    async fn test_resolve_thumbnail_unreachable_is_none() {
        let client = reqwest::Client::new();
        // Port 1 on localhost: connection refused, degrades to None.
        assert_eq!(
            resolve_thumbnail(&client, "http://127.0.0.1:1/x", Duration::from_secs(10)).await,
            None
        );
    }

    #[tokio::test]
    async fn test_resolve_thumbnail_respects_configured_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html></html>")
                    .set_delay(Duration::from_secs(1)),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/article", server.uri());
        assert_eq!(
            resolve_thumbnail(&client, &url, Duration::from_millis(200)).await,
            None
        );
    }
}
