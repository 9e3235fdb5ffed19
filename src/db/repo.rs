use async_trait::async_trait;

use super::model::*;
use crate::tmdb::MovieSummary;

#[async_trait]
pub trait TrendingRepo: Send + Sync {
    /// Most searched terms first, at most `limit` entries.
    async fn get_trending_movies(&self, limit: u32) -> DbResult<Vec<TrendingEntry>>;
    /// Bump the counter for `term`. The movie is only stored on first insert.
    async fn update_search_count(&self, term: &str, movie: &MovieSummary) -> DbResult<()>;
    async fn get_search_metric(&self, term: &str) -> DbResult<TrendingEntry>;
}
