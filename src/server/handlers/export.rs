//! Server-side export for clients that do not build the document themselves.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use super::super::AppState;
use crate::models::{Provider, QueryField};
use crate::services::{build_query, export, ExportEntry};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub leaf_node: String,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub fields: Vec<QueryField>,
    #[serde(default)]
    pub entries: Vec<ExportEntry>,
}

pub async fn export_document(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> impl IntoResponse {
    let schema = build_query(&request.fields).schema;
    Json(export(
        &state.database_name,
        &request.leaf_node,
        request.provider,
        &schema,
        &request.entries,
    ))
}
