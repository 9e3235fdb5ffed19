use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower::Layer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::handlers;
use crate::search::SearchApp;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub app: Arc<SearchApp>,
}

impl AppState {
    pub fn new(config: Config, app: Arc<SearchApp>) -> Self {
        Self {
            config: Arc::new(config),
            app,
        }
    }
}

/// The full service. Path normalization has to run before routing, so the
/// routed app sits behind it as the fallback of an outer router.
pub fn build_app(state: AppState) -> Router {
    let routed = build_router(state);
    let normalized = axum::middleware::from_fn(crate::middleware::normalize_path).layer(routed);
    Router::new().fallback_service(normalized)
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/term", put(handlers::put_search_term))
        .route("/api/state", get(handlers::get_state));

    let mut router = Router::new()
        .route("/", get(handlers::index))
        .route("/results", get(handlers::results_fragment))
        .route("/health", get(handlers::health_handler))
        .route("/robots.txt", get(robots_txt_handler))
        .merge(api_routes)
        .fallback(fallback_handler);

    // Posters, icons and the hero banner.
    if let Some(ref appdir) = state.config.appdir {
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
