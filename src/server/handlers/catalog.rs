//! Taxonomy catalog endpoints.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::super::AppState;
use super::helpers::store_error;
use crate::models::LeafNode;

#[derive(Debug, Deserialize)]
pub struct LeafNodeParams {
    /// Only list this depth
    pub depth: Option<i32>,
}

/// Leaf node as listed to clients; the percentage has two decimals.
#[derive(Debug, Serialize)]
pub struct LeafNodeResponse {
    pub name: String,
    pub percentage: String,
    pub depth: i32,
}

impl From<&LeafNode> for LeafNodeResponse {
    fn from(node: &LeafNode) -> Self {
        Self {
            name: node.name.clone(),
            percentage: node.formatted_percentage(),
            depth: node.depth,
        }
    }
}

/// List leaf nodes, highest percentage first.
pub async fn list_leaf_nodes(
    State(state): State<AppState>,
    Query(params): Query<LeafNodeParams>,
) -> impl IntoResponse {
    let nodes = match state.catalog_cache.get_leaf_nodes(params.depth) {
        Some(nodes) => nodes,
        None => match state.ctx.leaf_nodes().list(params.depth).await {
            Ok(nodes) => {
                state
                    .catalog_cache
                    .set_leaf_nodes(params.depth, nodes.clone());
                nodes
            }
            Err(e) => return store_error(e),
        },
    };

    let body: Vec<LeafNodeResponse> = nodes.iter().map(LeafNodeResponse::from).collect();
    Json(body).into_response()
}

pub async fn max_depth(State(state): State<AppState>) -> impl IntoResponse {
    let depth = match state.catalog_cache.get_max_depth() {
        Some(depth) => depth,
        None => match state.ctx.leaf_nodes().max_depth().await {
            Ok(depth) => {
                state.catalog_cache.set_max_depth(depth);
                depth
            }
            Err(e) => return store_error(e),
        },
    };

    Json(serde_json::json!({ "maxDepth": depth })).into_response()
}

/// Drop cached catalog data so the next read hits the store.
pub async fn refresh_catalog(State(state): State<AppState>) -> impl IntoResponse {
    state.catalog_cache.invalidate();
    tracing::info!("Catalog cache invalidated");
    Json(serde_json::json!({ "refreshed": true }))
}
