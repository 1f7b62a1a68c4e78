use anyhow::Result;

use super::schema::Database;
use super::types::{Article, NewArticle};

impl Database {
    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Look up an article by its URL, the natural key.
    pub async fn find_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, url, description, thumbnail_url, source_site,
                   bookmark_count, published_at
            FROM articles
            WHERE url = ?
        "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    /// Insert a new article, returning its id.
    ///
    /// The UNIQUE constraint on `url` makes a duplicate insert an error;
    /// callers are expected to have checked [`find_article_by_url`] first.
    pub async fn insert_article(&self, article: &NewArticle) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO articles
                (title, url, description, thumbnail_url, source_site, bookmark_count, published_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
        "#,
        )
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.description)
        .bind(&article.thumbnail_url)
        .bind(&article.source_site)
        .bind(article.bookmark_count)
        .bind(&article.published_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Refresh the bookmark count of an existing article. Title, description,
    /// and thumbnail are immutable after creation.
    pub async fn update_bookmark_count(&self, article_id: i64, count: i64) -> Result<()> {
        sqlx::query("UPDATE articles SET bookmark_count = ? WHERE id = ?")
            .bind(count)
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Associate an article with a category. Created once at insertion time;
    /// repeats are ignored.
    pub async fn link_article_category(&self, article_id: i64, category_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO article_categories (article_id, category_id) VALUES (?, ?)",
        )
        .bind(article_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Category ids linked to an article, in insertion order.
    pub async fn categories_for_article(&self, article_id: i64) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT category_id FROM article_categories WHERE article_id = ? ORDER BY category_id",
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Total number of stored articles.
    pub async fn article_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
