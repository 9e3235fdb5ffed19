use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use tracing::{debug, warn};

use super::types::{MovieListResponse, MovieSummary};

// Fixed filters for the landing page listing.
const DISCOVER_QUERY: &str =
    "include_adult=false&include_video=false&language=en-US&page=1&sort_by=popularity.desc";

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {0} from {1}")]
    Status(u16, String),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type TmdbResult<T> = Result<T, TmdbError>;

/// Read-only access to the movie metadata catalog.
#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn search_movies(&self, query: &str) -> TmdbResult<Vec<MovieSummary>>;
    async fn discover_movies(&self) -> TmdbResult<Vec<MovieSummary>>;
}

pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
}

impl TmdbClient {
    /// A missing key still builds a client; the API answers 401 and every
    /// fetch takes the error path.
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> TmdbResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", api_key.unwrap_or_default());
        match HeaderValue::from_str(bearer.trim_end()) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => warn!("TMDB API key is not a valid header value, sending no Authorization: {}", e),
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    async fn get_movies(&self, url: String) -> TmdbResult<Vec<MovieSummary>> {
        debug!(url = %url, "TMDB request");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TmdbError::Status(status.as_u16(), url));
        }

        let body = response.bytes().await?;
        let list: MovieListResponse = serde_json::from_slice(&body)?;
        Ok(list.into_movies())
    }
}

#[async_trait]
impl MovieApi for TmdbClient {
    async fn search_movies(&self, query: &str) -> TmdbResult<Vec<MovieSummary>> {
        self.get_movies(search_url(&self.base_url, query)).await
    }

    async fn discover_movies(&self) -> TmdbResult<Vec<MovieSummary>> {
        self.get_movies(discover_url(&self.base_url)).await
    }
}

fn join_base(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

pub fn search_url(base: &str, query: &str) -> String {
    format!(
        "{}?query={}",
        join_base(base, "search/movie"),
        urlencoding::encode(query)
    )
}

pub fn discover_url(base: &str) -> String {
    format!("{}?{}", join_base(base, "discover/movie"), DISCOVER_QUERY)
}
