//! HTTP API over the entry store and annotation rounds.
//!
//! Exposes:
//! - Leaf node listings and maximum depth (cached, see [`CatalogCache`])
//! - Paginated entry lookup by leaf node
//! - Annotation rounds and server-side export

mod cache;
mod handlers;
mod routes;

pub use cache::CatalogCache;
pub use routes::create_router;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Settings;
use crate::repository::DbContext;
use crate::services::AnnotationDispatcher;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub ctx: DbContext,
    pub catalog_cache: Arc<CatalogCache>,
    pub dispatcher: AnnotationDispatcher,
    /// Label written to exported documents.
    pub database_name: String,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ctx: settings.create_db_context(),
            catalog_cache: Arc::new(CatalogCache::with_ttl(settings.catalog_cache_ttl)),
            dispatcher: AnnotationDispatcher::from_config(&settings.llm),
            database_name: settings.database_name.clone(),
        }
    }
}

/// Bind a listener on `host`, which may be a hostname or an IP address.
pub async fn bind(host: &str, port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((host, port)).await
}

/// Start the web server. The database schema must already exist.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings);

    let configured = state.dispatcher.providers().configured();
    if configured.is_empty() {
        tracing::warn!("No provider API keys configured; /annotate will fail");
    }

    let app = create_router(state);

    let listener = bind(host, port).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::llm::testing::ScriptedClient;
    use crate::llm::ProviderRegistry;
    use crate::models::{Entry, LeafNode, Provider};

    async fn setup_test_app() -> (AppState, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();

        let providers =
            ProviderRegistry::new().with_client(ScriptedClient::new(Provider::Anthropic));
        let state = AppState {
            ctx,
            catalog_cache: Arc::new(CatalogCache::new()),
            dispatcher: AnnotationDispatcher::new(providers, 4),
            database_name: "Bayesian".to_string(),
        };
        (state, dir)
    }

    async fn setup_test_app_with_data() -> (AppState, tempfile::TempDir) {
        let (state, dir) = setup_test_app().await;

        state
            .ctx
            .leaf_nodes()
            .save_all(&[
                LeafNode::new("Layoffs", 1, 60.0),
                LeafNode::new("Restructuring/Layoffs", 2, 40.0),
                LeafNode::new("Mergers", 1, 12.346),
            ])
            .await
            .unwrap();

        let mut entries = Vec::new();
        for i in 0..3 {
            entries.push(Entry::new(["Layoffs"], format!("s{}", i), format!("b{}", i)));
        }
        for i in 3..5 {
            entries.push(Entry::new(
                ["Restructuring/Layoffs", "Layoffs"],
                format!("s{}", i),
                format!("b{}", i),
            ));
        }
        state.ctx.entries().insert_all(&entries).await.unwrap();

        (state, dir)
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_leaf_nodes_sorted_with_two_decimals() {
        let (state, _dir) = setup_test_app_with_data().await;

        let (status, json) = send(&state, get("/leaf-nodes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!([
                {"name": "Layoffs", "percentage": "60.00", "depth": 1},
                {"name": "Restructuring/Layoffs", "percentage": "40.00", "depth": 2},
                {"name": "Mergers", "percentage": "12.35", "depth": 1}
            ])
        );

        let (_, json) = send(&state, get("/leaf-nodes?depth=2")).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["name"], "Restructuring/Layoffs");
    }

    #[tokio::test]
    async fn test_leaf_nodes_cached_until_refresh() {
        let (state, _dir) = setup_test_app_with_data().await;

        let (_, before) = send(&state, get("/leaf-nodes")).await;
        assert_eq!(before.as_array().unwrap().len(), 3);

        state.ctx.leaf_nodes().clear().await.unwrap();
        let (_, cached) = send(&state, get("/leaf-nodes")).await;
        assert_eq!(cached.as_array().unwrap().len(), 3);

        let (status, _) = send(&state, post_json("/leaf-nodes/refresh", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, after) = send(&state, get("/leaf-nodes")).await;
        assert!(after.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_max_depth() {
        let (state, _dir) = setup_test_app().await;
        let (_, json) = send(&state, get("/leaf-nodes/max-depth")).await;
        assert_eq!(json, json!({"maxDepth": 1}));

        let (state, _dir) = setup_test_app_with_data().await;
        let (_, json) = send(&state, get("/leaf-nodes/max-depth")).await;
        assert_eq!(json, json!({"maxDepth": 2}));
    }

    #[tokio::test]
    async fn test_entries_exact_and_substring() {
        let (state, _dir) = setup_test_app_with_data().await;

        let (status, json) = send(
            &state,
            get("/entries?leafNode=Layoffs&exactMatch=true&page=1&pageSize=10"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalCount"], 3);

        let (_, json) = send(&state, get("/entries?leafNode=layoffs&pageSize=2&page=3")).await;
        assert_eq!(json["totalCount"], 5);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["currentPage"], 3);
        assert_eq!(json["pageSize"], 2);
        assert_eq!(json["entries"].as_array().unwrap().len(), 1);
        assert_eq!(
            json["entries"][0]["leafNodes"],
            json!(["Restructuring/Layoffs", "Layoffs"])
        );
    }

    #[tokio::test]
    async fn test_entries_requires_leaf_node() {
        let (state, _dir) = setup_test_app().await;
        let (status, json) = send(&state, get("/entries?page=1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "Leaf node parameter is required"}));
    }

    #[tokio::test]
    async fn test_store_unavailable_is_503() {
        let (mut state, dir) = setup_test_app().await;
        state.ctx = DbContext::new(&dir.path().join("missing").join("nested").join("x.db"));

        let (status, json) = send(&state, get("/leaf-nodes")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("entry store unavailable"));
    }

    #[tokio::test]
    async fn test_annotate_round() {
        let (state, _dir) = setup_test_app().await;

        let (status, json) = send(
            &state,
            post_json(
                "/annotate",
                json!({
                    "articles": ["REPLY:12", "FAIL", "REPLY:7"],
                    "prompt": "How many jobs were cut?",
                    "provider": "A"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], "12");
        assert!(results[1]
            .as_str()
            .unwrap()
            .starts_with("Error processing article 2: "));
        assert_eq!(results[2], "7");
    }

    #[tokio::test]
    async fn test_annotate_rejects_invalid_body() {
        let (state, _dir) = setup_test_app().await;
        let (status, json) = send(
            &state,
            post_json("/annotate", json!({"articles": "x", "prompt": "p"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"message": "Invalid request body"}));
    }

    #[tokio::test]
    async fn test_annotate_unconfigured_provider_is_500() {
        let (state, _dir) = setup_test_app().await;
        let (status, json) = send(
            &state,
            post_json(
                "/annotate",
                json!({"articles": ["a"], "prompt": "p", "provider": "B"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Error processing articles");
        assert_eq!(json["error"], "OpenAI API key is not configured");
    }

    #[tokio::test]
    async fn test_export_endpoint() {
        let (state, _dir) = setup_test_app().await;
        let (status, json) = send(
            &state,
            post_json(
                "/export",
                json!({
                    "leafNode": "Layoffs",
                    "provider": "A",
                    "fields": [{"itemName": "jobs", "question": "How many?", "dataType": "int"}],
                    "entries": [
                        {"leafNodes": ["Layoffs"], "annotation": {"provider": "A", "rawText": "{\"jobs\": \"40\"}"}},
                        {"leafNodes": ["Layoffs"]}
                    ]
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["Information"]["Database Name"], "Bayesian");
        assert_eq!(json["Information"]["Selected Note"], "Layoffs");
        assert_eq!(json["Queries"]["jobs"]["Data Type"], "int");
        assert_eq!(
            json["Queries"]["Examples"],
            json!([
                {"Leaf_Nodes": "Layoffs", "Extracted_Values": {"jobs": 40}},
                {"Leaf_Nodes": "Layoffs", "Extracted_Values": null}
            ])
        );
    }

    #[tokio::test]
    async fn test_bind_accepts_hostname() {
        let listener = bind("localhost", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }
}
