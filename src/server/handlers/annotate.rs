//! Annotation round endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::super::AppState;
use crate::models::Provider;

/// Validated `/annotate` request.
#[derive(Debug, PartialEq)]
struct AnnotateRequest {
    articles: Vec<String>,
    prompt: String,
    provider: Provider,
}

fn invalid_body() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "Invalid request body" })),
    )
        .into_response()
}

/// `articles` must be an array of strings and `prompt` a string.
/// `provider` defaults to A.
fn parse_request(body: &[u8]) -> Option<AnnotateRequest> {
    let value: Value = serde_json::from_slice(body).ok()?;

    let articles = value
        .get("articles")?
        .as_array()?
        .iter()
        .map(|a| a.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    let prompt = value.get("prompt")?.as_str()?.to_string();
    let provider = match value.get("provider") {
        None | Some(Value::Null) => Provider::Anthropic,
        Some(v) => Provider::from_code(v.as_str()?)?,
    };

    Some(AnnotateRequest {
        articles,
        prompt,
        provider,
    })
}

/// Run one round over the posted articles.
pub async fn annotate_articles(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(request) = parse_request(&body) else {
        tracing::debug!("Rejected annotate request body");
        return invalid_body();
    };

    match state
        .dispatcher
        .dispatch(&request.articles, &request.prompt, request.provider)
        .await
    {
        Ok(results) => Json(json!({ "results": results })).into_response(),
        Err(e) => {
            tracing::error!("Annotation round failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error processing articles",
                    "error": e.to_string()
                })),
            )
                .into_response()
        }
    }
}
