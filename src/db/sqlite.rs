use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::model::*;
use super::repo::*;
use crate::tmdb::MovieSummary;

const SELECT_METRIC: &str =
    "SELECT id, search_term, count, movie_id, poster_url, created, updated FROM search_metrics";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TrendingRepo for SqliteRepository {
    async fn get_trending_movies(&self, limit: u32) -> DbResult<Vec<TrendingEntry>> {
        let query = format!("{} ORDER BY count DESC, updated DESC, id ASC LIMIT ?", SELECT_METRIC);
        let entries = sqlx::query_as::<_, TrendingEntry>(&query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    async fn update_search_count(&self, term: &str, movie: &MovieSummary) -> DbResult<()> {
        let term = normalize_term(term);
        let now = Utc::now();
        let poster_url = movie.poster_url().unwrap_or_default();

        sqlx::query(
            "INSERT INTO search_metrics (search_term, count, movie_id, poster_url, created, updated)
             VALUES (?, 1, ?, ?, ?, ?)
             ON CONFLICT(search_term) DO UPDATE SET
                count = count + 1,
                updated = excluded.updated",
        )
        .bind(&term)
        .bind(movie.id as i64)
        .bind(&poster_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(term = %term, movie_id = movie.id, "Search count updated");
        Ok(())
    }

    async fn get_search_metric(&self, term: &str) -> DbResult<TrendingEntry> {
        let term = normalize_term(term);
        let query = format!("{} WHERE search_term = ?", SELECT_METRIC);
        sqlx::query_as::<_, TrendingEntry>(&query)
            .bind(&term)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => DbError::NotFound(format!("Search term not found: {}", term)),
                _ => DbError::Sqlx(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: u64, poster: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("Movie {}", id),
            poster_path: Some(poster.to_string()),
            vote_average: None,
            original_language: None,
            release_date: None,
        }
    }

    async fn open_repo(dir: &tempfile::TempDir) -> SqliteRepository {
        let path = dir.path().join("metrics.db");
        SqliteRepository::new(&format!("sqlite://{}", path.display()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_search_inserts() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;

        repo.update_search_count("Batman", &movie(268, "/batman.jpg"))
            .await
            .unwrap();

        let entry = repo.get_search_metric("batman").await.unwrap();
        assert_eq!(entry.search_term, "batman");
        assert_eq!(entry.count, 1);
        assert_eq!(entry.movie_id, 268);
        assert_eq!(entry.poster_url, "https://image.tmdb.org/t/p/w500/batman.jpg");
    }

    #[tokio::test]
    async fn test_repeat_search_increments_and_keeps_first_movie() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;

        repo.update_search_count("batman", &movie(268, "/first.jpg")).await.unwrap();
        repo.update_search_count(" BATMAN ", &movie(999, "/second.jpg")).await.unwrap();
        repo.update_search_count("Batman", &movie(999, "/second.jpg")).await.unwrap();

        let entry = repo.get_search_metric("batman").await.unwrap();
        assert_eq!(entry.count, 3);
        assert_eq!(entry.movie_id, 268);
        assert!(entry.poster_url.ends_with("/first.jpg"));
        assert!(entry.updated >= entry.created);
    }

    #[tokio::test]
    async fn test_trending_ordered_by_count_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;

        for _ in 0..3 {
            repo.update_search_count("matrix", &movie(603, "/matrix.jpg")).await.unwrap();
        }
        repo.update_search_count("alien", &movie(348, "/alien.jpg")).await.unwrap();
        for _ in 0..2 {
            repo.update_search_count("heat", &movie(949, "/heat.jpg")).await.unwrap();
        }

        let trending = repo.get_trending_movies(2).await.unwrap();
        let terms: Vec<&str> = trending.iter().map(|e| e.search_term.as_str()).collect();
        assert_eq!(terms, vec!["matrix", "heat"]);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;

        assert!(repo.get_trending_movies(5).await.unwrap().is_empty());
        let err = repo.get_search_metric("nothing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}
