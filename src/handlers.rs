use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;

use crate::search::SearchState;
use crate::server::AppState;
use crate::view;

#[derive(Debug, Deserialize)]
pub struct TermUpdate {
    pub term: String,
    /// Increases with every keystroke. Updates without one always apply.
    #[serde(default)]
    pub seq: Option<u64>,
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.app.snapshot().await;
    (
        [(header::CACHE_CONTROL, "no-cache, no-store")],
        Html(view::render_page(&snapshot)),
    )
}

pub async fn results_fragment(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.app.snapshot().await;
    (
        [(header::CACHE_CONTROL, "no-cache, no-store")],
        Html(view::render_results(&snapshot)),
    )
}

pub async fn put_search_term(
    State(state): State<AppState>,
    Json(update): Json<TermUpdate>,
) -> StatusCode {
    match update.seq {
        Some(seq) => {
            state.app.apply_term_update(&update.term, seq).await;
        }
        None => state.app.set_search_term(&update.term).await,
    }
    StatusCode::NO_CONTENT
}

pub async fn get_state(State(state): State<AppState>) -> Json<SearchState> {
    Json(state.app.snapshot().await)
}

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-cache, no-store")],
        "Healthy",
    )
}
