use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::db::{TrendingEntry, TrendingRepo};
use crate::tmdb::{MovieApi, MovieSummary};

pub const FETCH_ERROR_MESSAGE: &str = "Error fetching movies. Please try again later";

/// Everything the page renders from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchState {
    pub search_term: String,
    /// Sequence number of the keystroke that produced `search_term`.
    pub term_seq: u64,
    pub movies: Vec<MovieSummary>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub trending: Vec<TrendingEntry>,
}

/// Owns the search state and talks to both collaborators.
///
/// `fetch_movies` calls are not serialized. When two overlap, whichever
/// completes last overwrites the result list, even if it was issued first.
pub struct MovieSearch {
    api: Arc<dyn MovieApi>,
    trending_repo: Arc<dyn TrendingRepo>,
    trending_limit: u32,
    state: RwLock<SearchState>,
}

impl MovieSearch {
    pub fn new(api: Arc<dyn MovieApi>, trending_repo: Arc<dyn TrendingRepo>, trending_limit: u32) -> Self {
        Self {
            api,
            trending_repo,
            trending_limit,
            state: RwLock::new(SearchState::default()),
        }
    }

    pub async fn snapshot(&self) -> SearchState {
        self.state.read().await.clone()
    }

    pub async fn set_search_term(&self, term: &str) {
        self.state.write().await.search_term = term.to_string();
    }

    /// Applies `term` only if `seq` is newer than the last applied keystroke.
    pub async fn set_search_term_if_newer(&self, term: &str, seq: u64) -> bool {
        let mut state = self.state.write().await;
        if seq <= state.term_seq {
            return false;
        }
        state.term_seq = seq;
        state.search_term = term.to_string();
        true
    }

    /// Loads the result list for `term`, or the discover listing when the
    /// term is blank. A failed fetch keeps the previous list and sets the
    /// error message instead.
    pub async fn fetch_movies(&self, term: &str) {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.error_message = None;
        }

        let query = term.trim();
        let result = if query.is_empty() {
            self.api.discover_movies().await
        } else {
            self.api.search_movies(query).await
        };

        match result {
            Ok(movies) => {
                debug!(query = %query, count = movies.len(), "Fetched movies");
                let top = movies.first().cloned();
                self.state.write().await.movies = movies;

                // The discover listing is not a search and is never counted.
                if !query.is_empty() {
                    if let Some(top) = top {
                        self.report_search(query, &top).await;
                    }
                }
            }
            Err(e) => {
                error!("Error fetching movies: {}", e);
                self.state.write().await.error_message = Some(FETCH_ERROR_MESSAGE.to_string());
            }
        }

        self.state.write().await.is_loading = false;
    }

    async fn report_search(&self, query: &str, top: &MovieSummary) {
        if let Err(e) = self.trending_repo.update_search_count(query, top).await {
            warn!(query = %query, "Failed to update search count: {}", e);
        }
    }

    pub async fn load_trending_movies(&self) {
        match self.trending_repo.get_trending_movies(self.trending_limit).await {
            Ok(entries) => {
                info!("Loaded {} trending movies", entries.len());
                self.state.write().await.trending = entries;
            }
            Err(e) => {
                warn!("Error fetching trending movies: {}", e);
                self.state.write().await.trending = Vec::new();
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{DbError, DbResult};
    use crate::tmdb::{TmdbError, TmdbResult};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    pub enum ApiCall {
        Search(String),
        Discover,
    }

    #[derive(Default)]
    pub struct FakeApi {
        pub calls: Mutex<Vec<ApiCall>>,
        pub movies: Vec<MovieSummary>,
        pub fail: bool,
    }

    impl FakeApi {
        pub fn with_movies(movies: Vec<MovieSummary>) -> Self {
            Self {
                movies,
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<ApiCall> {
            self.calls.lock().unwrap().clone()
        }

        fn respond(&self) -> TmdbResult<Vec<MovieSummary>> {
            if self.fail {
                return Err(TmdbError::Status(503, "fake".to_string()));
            }
            Ok(self.movies.clone())
        }
    }

    #[async_trait]
    impl MovieApi for FakeApi {
        async fn search_movies(&self, query: &str) -> TmdbResult<Vec<MovieSummary>> {
            self.calls.lock().unwrap().push(ApiCall::Search(query.to_string()));
            self.respond()
        }

        async fn discover_movies(&self) -> TmdbResult<Vec<MovieSummary>> {
            self.calls.lock().unwrap().push(ApiCall::Discover);
            self.respond()
        }
    }

    #[derive(Default)]
    pub struct FakeTrending {
        pub reports: Mutex<Vec<(String, u64)>>,
        pub entries: Vec<TrendingEntry>,
        pub fail: bool,
    }

    impl FakeTrending {
        pub fn reports(&self) -> Vec<(String, u64)> {
            self.reports.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TrendingRepo for FakeTrending {
        async fn get_trending_movies(&self, limit: u32) -> DbResult<Vec<TrendingEntry>> {
            if self.fail {
                return Err(DbError::NotFound("trending".to_string()));
            }
            Ok(self.entries.iter().take(limit as usize).cloned().collect())
        }

        async fn update_search_count(&self, term: &str, movie: &MovieSummary) -> DbResult<()> {
            self.reports.lock().unwrap().push((term.to_string(), movie.id));
            if self.fail {
                return Err(DbError::NotFound(term.to_string()));
            }
            Ok(())
        }

        async fn get_search_metric(&self, term: &str) -> DbResult<TrendingEntry> {
            Err(DbError::NotFound(term.to_string()))
        }
    }

    /// Parks every call until the test releases it.
    #[derive(Default)]
    struct GatedApi {
        entered: Notify,
        release: Notify,
        fail: bool,
    }

    #[async_trait]
    impl MovieApi for GatedApi {
        async fn search_movies(&self, _query: &str) -> TmdbResult<Vec<MovieSummary>> {
            self.discover_movies().await
        }

        async fn discover_movies(&self) -> TmdbResult<Vec<MovieSummary>> {
            self.entered.notify_one();
            self.release.notified().await;
            if self.fail {
                return Err(TmdbError::Status(500, "gated".to_string()));
            }
            Ok(vec![movie(1, "Gated")])
        }
    }

    pub fn movie(id: u64, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            poster_path: Some(format!("/{}.jpg", id)),
            vote_average: Some(7.8),
            original_language: Some("en".to_string()),
            release_date: Some("1999-03-31".to_string()),
        }
    }

    pub fn trending_entry(id: i64, term: &str, count: i64) -> TrendingEntry {
        TrendingEntry {
            id,
            search_term: term.to_string(),
            count,
            movie_id: id * 10,
            poster_url: format!("https://image.tmdb.org/t/p/w500/{}.jpg", id),
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    fn coordinator(api: &Arc<FakeApi>, repo: &Arc<FakeTrending>) -> MovieSearch {
        MovieSearch::new(api.clone(), repo.clone(), 5)
    }

    #[tokio::test]
    async fn test_empty_term_uses_discover_and_never_reports() {
        let api = Arc::new(FakeApi::with_movies(vec![movie(1, "Popular")]));
        let repo = Arc::new(FakeTrending::default());
        let search = coordinator(&api, &repo);

        search.fetch_movies("").await;
        search.fetch_movies("   ").await;

        assert_eq!(api.calls(), vec![ApiCall::Discover, ApiCall::Discover]);
        assert!(repo.reports().is_empty());
        let state = search.snapshot().await;
        assert_eq!(state.movies.len(), 1);
        assert!(!state.is_loading);
        assert!(state.error_message.is_none());
    }

    #[tokio::test]
    async fn test_search_reports_top_result_once() {
        let api = Arc::new(FakeApi::with_movies(vec![movie(268, "Batman"), movie(414, "Batman Forever")]));
        let repo = Arc::new(FakeTrending::default());
        let search = coordinator(&api, &repo);

        search.fetch_movies("batman").await;

        assert_eq!(api.calls(), vec![ApiCall::Search("batman".to_string())]);
        assert_eq!(repo.reports(), vec![("batman".to_string(), 268)]);
        let state = search.snapshot().await;
        assert_eq!(state.movies.len(), 2);
        assert_eq!(state.movies[0].title, "Batman");
    }

    #[tokio::test]
    async fn test_search_without_results_does_not_report() {
        let api = Arc::new(FakeApi::with_movies(Vec::new()));
        let repo = Arc::new(FakeTrending::default());
        let search = coordinator(&api, &repo);

        search.fetch_movies("zzzzqqq").await;

        assert!(repo.reports().is_empty());
        assert!(search.snapshot().await.movies.is_empty());
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_keeps_previous_list() {
        let good = Arc::new(FakeApi::with_movies(vec![movie(1, "Alien")]));
        let repo = Arc::new(FakeTrending::default());
        let search = coordinator(&good, &repo);
        search.fetch_movies("alien").await;
        assert_eq!(repo.reports().len(), 1);

        let failing = Arc::new(FakeApi::failing());
        let search = MovieSearch {
            api: failing.clone(),
            ..search
        };
        search.fetch_movies("aliens").await;

        let state = search.snapshot().await;
        assert!(!state.is_loading);
        assert_eq!(state.error_message.as_deref(), Some(FETCH_ERROR_MESSAGE));
        assert_eq!(state.movies, vec![movie(1, "Alien")]);
        assert_eq!(repo.reports().len(), 1);
    }

    #[tokio::test]
    async fn test_next_fetch_clears_error() {
        let failing = Arc::new(FakeApi::failing());
        let repo = Arc::new(FakeTrending::default());
        let search = coordinator(&failing, &repo);
        search.fetch_movies("").await;
        assert!(search.snapshot().await.error_message.is_some());

        let good = Arc::new(FakeApi::with_movies(vec![movie(2, "Heat")]));
        let search = MovieSearch { api: good, ..search };
        search.fetch_movies("").await;
        assert!(search.snapshot().await.error_message.is_none());
    }

    #[tokio::test]
    async fn test_report_failure_is_swallowed() {
        let api = Arc::new(FakeApi::with_movies(vec![movie(603, "The Matrix")]));
        let repo = Arc::new(FakeTrending {
            fail: true,
            ..Default::default()
        });
        let search = coordinator(&api, &repo);

        search.fetch_movies("matrix").await;

        let state = search.snapshot().await;
        assert!(state.error_message.is_none());
        assert_eq!(state.movies.len(), 1);
        assert_eq!(repo.reports().len(), 1);
    }

    #[tokio::test]
    async fn test_search_term_is_trimmed() {
        let api = Arc::new(FakeApi::with_movies(vec![movie(949, "Heat")]));
        let repo = Arc::new(FakeTrending::default());
        let search = coordinator(&api, &repo);

        search.fetch_movies("  heat ").await;

        assert_eq!(api.calls(), vec![ApiCall::Search("heat".to_string())]);
        assert_eq!(repo.reports(), vec![("heat".to_string(), 949)]);
    }

    async fn assert_loading_while_in_flight(fail: bool, term: &str) -> SearchState {
        let api = Arc::new(GatedApi {
            fail,
            ..Default::default()
        });
        let repo = Arc::new(FakeTrending::default());
        let search = Arc::new(MovieSearch::new(api.clone(), repo, 5));

        let task = {
            let search = Arc::clone(&search);
            let term = term.to_string();
            tokio::spawn(async move { search.fetch_movies(&term).await })
        };

        api.entered.notified().await;
        let state = search.snapshot().await;
        assert!(state.is_loading);
        assert!(state.error_message.is_none());

        api.release.notify_one();
        task.await.unwrap();
        let state = search.snapshot().await;
        assert!(!state.is_loading);
        state
    }

    #[tokio::test]
    async fn test_loading_flag_during_successful_fetch() {
        let state = assert_loading_while_in_flight(false, "gated").await;
        assert_eq!(state.movies.len(), 1);
        assert!(state.error_message.is_none());
    }

    #[tokio::test]
    async fn test_loading_flag_during_failed_fetch() {
        let state = assert_loading_while_in_flight(true, "").await;
        assert!(state.movies.is_empty());
        assert_eq!(state.error_message.as_deref(), Some(FETCH_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_stale_term_update_is_dropped() {
        let search = coordinator(&Arc::new(FakeApi::default()), &Arc::new(FakeTrending::default()));

        assert!(search.set_search_term_if_newer("batman", 2).await);
        assert!(!search.set_search_term_if_newer("batma", 1).await);
        assert!(!search.set_search_term_if_newer("batmen", 2).await);

        let state = search.snapshot().await;
        assert_eq!(state.search_term, "batman");
        assert_eq!(state.term_seq, 2);
    }

    #[tokio::test]
    async fn test_load_trending() {
        let api = Arc::new(FakeApi::default());
        let repo = Arc::new(FakeTrending {
            entries: (1..=7).map(|i| trending_entry(i, &format!("term{}", i), 10 - i)).collect(),
            ..Default::default()
        });
        let search = coordinator(&api, &repo);

        search.load_trending_movies().await;

        let trending = search.snapshot().await.trending;
        assert_eq!(trending.len(), 5);
        assert_eq!(trending[0].search_term, "term1");
    }

    #[tokio::test]
    async fn test_load_trending_failure_leaves_empty() {
        let api = Arc::new(FakeApi::default());
        let repo = Arc::new(FakeTrending {
            fail: true,
            ..Default::default()
        });
        let search = coordinator(&api, &repo);

        search.load_trending_movies().await;

        let state = search.snapshot().await;
        assert!(state.trending.is_empty());
        assert!(state.error_message.is_none());
    }
}
