//! Entry listing endpoint.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use super::helpers::store_error;
use crate::repository::MatchMode;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesQuery {
    pub leaf_node: Option<String>,
    #[serde(default)]
    pub exact_match: bool,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Page through entries labeled with a leaf node.
pub async fn list_entries(
    State(state): State<AppState>,
    Query(params): Query<EntriesQuery>,
) -> impl IntoResponse {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let mode = MatchMode::from_exact_flag(params.exact_match);
    let leaf_node = params.leaf_node.as_deref().unwrap_or_default();

    match state
        .ctx
        .entries()
        .get_entries(leaf_node, mode, page, page_size)
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(e) => store_error(e),
    }
}
