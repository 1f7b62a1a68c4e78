//! Harvest orchestration.
//!
//! One [`Harvester::run`] call walks the configured categories in order,
//! strictly sequentially: fetch the feed, parse it into items, enrich and
//! persist each item, sleeping the configured delay after each stored
//! article and after each completed category. Error handling is three-tier:
//! a dead database connection at startup is fatal, a failed feed or a
//! database error mid-category abandons that category, and enrichment
//! failures degrade to defaults without aborting the article. The run always
//! moves on to the next category after a failure.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::{CategorySource, Config};
use crate::enrich::{bookmark_count, resolve_thumbnail, site_name};
use crate::feed::{fetch_feed, now_stamp, parse_items, parse_timestamp, ItemNode};
use crate::storage::{Database, NewArticle};

// ============================================================================
// Harvester
// ============================================================================

pub struct Harvester {
    db: Database,
    client: reqwest::Client,
    config: Config,
}

/// Per-run tallies, logged at the end of [`Harvester::run`].
#[derive(Debug, Default)]
struct RunStats {
    inserted: u64,
    updated: u64,
    skipped: u64,
}

impl Harvester {
    /// Build a harvester over an open database. The HTTP client carries the
    /// configured User-Agent and timeout and is shared by every outbound
    /// request of the run.
    pub fn new(db: Database, config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { db, client, config })
    }

    /// Run one full harvest pass over all configured categories.
    ///
    /// A category that fails, whether at the feed fetch or on a database
    /// error mid-item, is logged and abandoned; the run continues with the
    /// next one and skips the pacing sleep for the failed category.
    /// Categories whose name has no seeded row still get their articles
    /// stored; only the category link is dropped.
    pub async fn run(&self) -> Result<()> {
        let category_map = self.db.category_map().await?;
        let mut stats = RunStats::default();

        info!(categories = self.config.categories.len(), "Starting harvest");

        for source in &self.config.categories {
            match self
                .harvest_category(source, &category_map, &mut stats)
                .await
            {
                Ok(()) => tokio::time::sleep(self.config.category_delay()).await,
                Err(e) => {
                    warn!(category = %source.name, error = %e, "Category failed, moving on");
                }
            }
        }

        info!(
            inserted = stats.inserted,
            updated = stats.updated,
            skipped = stats.skipped,
            "Harvest complete"
        );
        Ok(())
    }

    /// Fetch and process one category's feed. A fetch failure or a database
    /// error on any item propagates, abandoning the rest of the category.
    async fn harvest_category(
        &self,
        source: &CategorySource,
        category_map: &HashMap<String, i64>,
        stats: &mut RunStats,
    ) -> Result<()> {
        info!(category = %source.name, url = %source.url, "Fetching feed");

        let body = fetch_feed(&self.client, &source.url, self.config.request_timeout())
            .await
            .context("Feed fetch failed")?;

        let items = parse_items(&body, &source.name);
        info!(category = %source.name, items = items.len(), "Parsed feed");

        for item in &items {
            if self.process_item(item, source, category_map, stats).await? {
                tokio::time::sleep(self.config.article_delay()).await;
            }
        }

        Ok(())
    }

    /// Persist a single feed item: refresh the bookmark count if the URL is
    /// already stored, otherwise enrich and insert. Returns whether the item
    /// was actually processed; items without a title or link are skipped
    /// without pacing. Database errors propagate; enrichment failures have
    /// already degraded to defaults by the time values arrive here.
    async fn process_item(
        &self,
        item: &ItemNode,
        source: &CategorySource,
        category_map: &HashMap<String, i64>,
        stats: &mut RunStats,
    ) -> Result<bool> {
        let Some(title) = item.title() else {
            debug!(category = %source.name, "Item without title, skipping");
            stats.skipped += 1;
            return Ok(false);
        };
        let Some(url) = item.link() else {
            debug!(category = %source.name, title, "Item without link, skipping");
            stats.skipped += 1;
            return Ok(false);
        };

        if let Some(existing) = self.db.find_article_by_url(url).await? {
            let count = bookmark_count(&self.client, &self.config.bookmark_api, url).await;
            self.db.update_bookmark_count(existing.id, count).await?;
            info!(title, count, "Updated article");
            stats.updated += 1;
            return Ok(true);
        }

        let published_at = item
            .timestamp()
            .and_then(parse_timestamp)
            .unwrap_or_else(now_stamp);
        let thumbnail_url =
            resolve_thumbnail(&self.client, url, self.config.request_timeout()).await;
        let count = bookmark_count(&self.client, &self.config.bookmark_api, url).await;

        let article = NewArticle {
            title: title.to_string(),
            url: url.to_string(),
            description: item.description().unwrap_or_default().to_string(),
            thumbnail_url,
            source_site: site_name(url),
            bookmark_count: count,
            published_at,
        };

        let article_id = self.db.insert_article(&article).await?;

        if let Some(&category_id) = category_map.get(&source.name) {
            self.db
                .link_article_category(article_id, category_id)
                .await?;
        } else {
            debug!(category = %source.name, "No seeded category row, link skipped");
        }

        info!(title, count, "Inserted new article");
        stats.inserted += 1;
        Ok(true)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(feed_url: &str) -> Config {
        Config {
            bookmark_api: "http://127.0.0.1:1/entry/json/".to_string(),
            article_delay_ms: 0,
            category_delay_ms: 0,
            categories: vec![CategorySource {
                name: "Tech".to_string(),
                url: feed_url.to_string(),
            }],
            ..Config::default()
        }
    }

    async fn mount_feed(server: &MockServer, body: String) {
        Mock::given(method("GET"))
            .and(path("/feed.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/rss+xml"))
            .mount(server)
            .await;
    }

    fn two_item_feed(server_uri: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item><title>One</title><link>{server_uri}/article/one</link></item>
  <item><title>Two</title><link>{server_uri}/article/two</link></item>
</channel></rss>"#
        )
    }

    #[tokio::test]
    async fn test_database_error_abandons_category() {
        let server = MockServer::start().await;
        mount_feed(&server, two_item_feed(&server.uri())).await;

        let db = Database::open(":memory:").await.unwrap();
        db.seed_categories(&["Tech"]).await.unwrap();

        // Break the link step out from under the run. The first item's
        // insert succeeds, its category link errors, and the second item
        // must never be processed.
        sqlx::query("DROP TABLE article_categories")
            .execute(&db.pool)
            .await
            .unwrap();

        let config = test_config(&format!("{}/feed.rss", server.uri()));
        let harvester = Harvester::new(db.clone(), config).unwrap();
        harvester.run().await.unwrap();

        assert_eq!(db.article_count().await.unwrap(), 1);
        let stored = db
            .find_article_by_url(&format!("{}/article/one", server.uri()))
            .await
            .unwrap();
        assert!(stored.is_some());
        let second = db
            .find_article_by_url(&format!("{}/article/two", server.uri()))
            .await
            .unwrap();
        assert!(second.is_none(), "category must be abandoned on first error");
    }

    #[tokio::test]
    async fn test_failed_category_does_not_stop_later_ones() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            format!(
                r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item><title>Kept</title><link>{}/article/kept</link></item>
</channel></rss>"#,
                server.uri()
            ),
        )
        .await;

        let db = Database::open(":memory:").await.unwrap();
        db.seed_categories(&["Broken", "Tech"]).await.unwrap();

        let mut config = test_config(&format!("{}/feed.rss", server.uri()));
        config.categories.insert(
            0,
            CategorySource {
                name: "Broken".to_string(),
                url: format!("{}/missing.rss", server.uri()),
            },
        );

        let harvester = Harvester::new(db.clone(), config).unwrap();
        harvester.run().await.unwrap();

        assert_eq!(db.article_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_skipped_item_skips_article_pacing() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            format!(
                r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item><title>No link</title></item>
  <item><title>Stored</title><link>{}/article/stored</link></item>
</channel></rss>"#,
                server.uri()
            ),
        )
        .await;

        let db = Database::open(":memory:").await.unwrap();
        db.seed_categories(&["Tech"]).await.unwrap();

        let mut config = test_config(&format!("{}/feed.rss", server.uri()));
        config.article_delay_ms = 300;

        let harvester = Harvester::new(db.clone(), config).unwrap();
        let start = Instant::now();
        harvester.run().await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(db.article_count().await.unwrap(), 1);
        // One stored article pays one delay; the link-less item pays none.
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(600), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_failed_category_skips_category_pacing() {
        let server = MockServer::start().await;
        // No feed mounted: the fetch 404s and the category fails.

        let db = Database::open(":memory:").await.unwrap();
        db.seed_categories(&["Tech"]).await.unwrap();

        let mut config = test_config(&format!("{}/feed.rss", server.uri()));
        config.category_delay_ms = 300;

        let harvester = Harvester::new(db.clone(), config).unwrap();
        let start = Instant::now();
        harvester.run().await.unwrap();

        assert_eq!(db.article_count().await.unwrap(), 0);
        assert!(start.elapsed() < Duration::from_millis(300));
    }
}
