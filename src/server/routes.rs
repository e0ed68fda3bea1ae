//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Taxonomy catalog
        .route("/leaf-nodes", get(handlers::list_leaf_nodes))
        .route("/leaf-nodes/max-depth", get(handlers::max_depth))
        .route("/leaf-nodes/refresh", post(handlers::refresh_catalog))
        // Entries
        .route("/entries", get(handlers::list_entries))
        // Annotation rounds and export
        .route("/annotate", post(handlers::annotate_articles))
        .route("/export", post(handlers::export_document))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
