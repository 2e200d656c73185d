//! HTTP surface: health probe and the generate endpoint.

pub mod error;
pub mod generate;
pub mod health;

use crate::app::App;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the service router.
pub fn router(app: Arc<App>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/generate-game", generate_route())
        .route("/generate_game", generate_route())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

fn generate_route() -> MethodRouter<Arc<App>> {
    post(generate::generate_game).fallback(generate::method_not_allowed)
}
