//! SQLite persistence for articles, categories, and their links.
//!
//! The schema is three tables: `categories` (pre-seeded, immutable during a
//! run), `articles` (`url` unique), and the `article_categories` join table.
//! Each operation commits immediately; a mid-run crash keeps everything
//! already committed and loses only the in-flight article.

mod articles;
mod categories;
mod schema;
mod types;

pub use schema::Database;
pub use types::{Article, Category, DatabaseError, NewArticle};
