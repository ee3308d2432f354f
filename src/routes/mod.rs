//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one game session per connection)
/// - REST-ish API under `/api/v1/...`
/// - UI assets from `static_dir` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir)));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route(
            "/api/v1/session",
            post(http::http_create_session).delete(http::http_delete_session),
        )
        .route("/api/v1/session/level", get(http::http_get_level))
        .route("/api/v1/session/answer", post(http::http_post_answer))
        .route("/api/v1/session/restart", post(http::http_post_restart))
        .route("/api/v1/session/expected", get(http::http_get_expected))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
