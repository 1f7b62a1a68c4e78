use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors surfaced to the entry point.
///
/// A connection failure here is the one fatal error class of a run: per-feed
/// and per-article problems degrade or skip, but without a database there is
/// nothing to do.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

// ============================================================================
// Row Types
// ============================================================================

/// A pre-seeded category row. The set is fixed for the duration of a run.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A persisted article row. `url` is the natural key: at most one row exists
/// per URL, and after creation only `bookmark_count` is ever refreshed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub source_site: String,
    pub bookmark_count: i64,
    /// Normalized `YYYY-MM-DD HH:MM:SS` wall-clock timestamp.
    pub published_at: String,
}

/// Field set for inserting a new article; the id is assigned by the database.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub source_site: String,
    pub bookmark_count: i64,
    pub published_at: String,
}
