use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::debug;

use super::coordinator::{MovieSearch, SearchState};
use super::debounce::Debouncer;
use crate::db::TrendingRepo;
use crate::tmdb::MovieApi;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub debounce: Duration,
    pub trending_limit: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            trending_limit: 5,
        }
    }
}

/// The page controller: keystrokes go in through `set_search_term`, settled
/// terms trigger fetches, and the trending strip is loaded once at start.
pub struct SearchApp {
    search: Arc<MovieSearch>,
    debouncer: Debouncer<String>,
    // Keeps the displayed term and the debouncer input updated in one order.
    input_lock: Mutex<()>,
}

impl SearchApp {
    pub fn start(
        api: Arc<dyn MovieApi>,
        trending_repo: Arc<dyn TrendingRepo>,
        settings: AppSettings,
    ) -> Arc<Self> {
        let search = Arc::new(MovieSearch::new(api, trending_repo, settings.trending_limit));
        let debouncer = Debouncer::new(String::new(), settings.debounce);

        let trending = Arc::clone(&search);
        tokio::spawn(async move {
            trending.load_trending_movies().await;
        });

        tokio::spawn(follow_settled_term(debouncer.subscribe(), Arc::clone(&search)));

        Arc::new(Self {
            search,
            debouncer,
            input_lock: Mutex::new(()),
        })
    }

    pub async fn set_search_term(&self, term: &str) {
        let _guard = self.input_lock.lock().await;
        self.search.set_search_term(term).await;
        self.debouncer.set(term.to_string());
    }

    /// Keystrokes can reach the server out of order. Only an update whose
    /// `seq` is above the last applied one changes the term; the rest are
    /// dropped and `false` is returned.
    pub async fn apply_term_update(&self, term: &str, seq: u64) -> bool {
        let _guard = self.input_lock.lock().await;
        if !self.search.set_search_term_if_newer(term, seq).await {
            debug!(term = %term, seq, "Dropping stale search term");
            return false;
        }
        self.debouncer.set(term.to_string());
        true
    }

    pub fn debounced_term(&self) -> String {
        self.debouncer.settled()
    }

    pub async fn snapshot(&self) -> SearchState {
        self.search.snapshot().await
    }
}

/// Runs one fetch for the initial settled term, then one per settled change.
/// Each fetch is its own task so a slow request never holds back a newer one.
async fn follow_settled_term(mut settled: watch::Receiver<String>, search: Arc<MovieSearch>) {
    let initial = settled.borrow_and_update().clone();
    spawn_fetch(&search, initial);

    while settled.changed().await.is_ok() {
        let term = settled.borrow_and_update().clone();
        debug!(term = %term, "Search term settled");
        spawn_fetch(&search, term);
    }
}

fn spawn_fetch(search: &Arc<MovieSearch>, term: String) {
    let search = Arc::clone(search);
    tokio::spawn(async move {
        search.fetch_movies(&term).await;
    });
}
