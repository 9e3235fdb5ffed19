use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the popularity table, as shown in the trending strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrendingEntry {
    pub id: i64,
    pub search_term: String,
    pub count: i64,
    pub movie_id: i64,
    pub poster_url: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Search terms are counted case-insensitively and without surrounding
/// whitespace.
pub fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}
