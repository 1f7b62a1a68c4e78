use anyhow::Result;
use std::collections::HashMap;

use super::schema::Database;
use super::types::Category;

impl Database {
    // ========================================================================
    // Category Operations
    // ========================================================================

    /// Ensure a row exists for every configured category name.
    ///
    /// Idempotent: names already present are left untouched, so repeated
    /// runs against the same database never duplicate or renumber
    /// categories.
    pub async fn seed_categories(&self, names: &[&str]) -> Result<()> {
        for name in names {
            sqlx::query("INSERT OR IGNORE INTO categories (name) VALUES (?)")
                .bind(name)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Get all categories.
    pub async fn all_categories(&self) -> Result<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    /// Get the name→id mapping, loaded once per run by the orchestrator.
    pub async fn category_map(&self) -> Result<HashMap<String, i64>> {
        let categories = self.all_categories().await?;
        Ok(categories.into_iter().map(|c| (c.name, c.id)).collect())
    }
}
