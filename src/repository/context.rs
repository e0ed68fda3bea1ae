//! Database context for repository access.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;
use tracing::info;

use super::entry::EntryRepository;
use super::leaf_node::LeafNodeRepository;
use super::pool::SqlitePool;
use super::StoreError;

/// Entry point for database operations.
///
/// Create one context per command or server, then use it to hand out
/// repositories. Repositories share the connection source, not connections.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::new(&db_path);
/// let nodes = ctx.leaf_nodes().list(Some(1)).await?;
/// ```
#[derive(Clone, Debug)]
pub struct DbContext {
    pool: SqlitePool,
}

impl DbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: SqlitePool::from_path(db_path),
        }
    }

    /// Create a new database context from a URL like `sqlite:path/to/db` or a plain path.
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: SqlitePool::new(database_url),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn leaf_nodes(&self) -> LeafNodeRepository {
        LeafNodeRepository::new(self.pool.clone())
    }

    pub fn entries(&self) -> EntryRepository {
        EntryRepository::new(self.pool.clone())
    }

    /// Create the tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS leaf_nodes (
                name TEXT PRIMARY KEY NOT NULL,
                depth INTEGER NOT NULL DEFAULT 1,
                percentage DOUBLE NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_leaf_nodes_depth ON leaf_nodes(depth);

            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                labels TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL DEFAULT '',
                annotation_provider TEXT,
                annotation_text TEXT,
                annotated_at TEXT,
                labels_folded TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_entries_labels ON entries(labels);
            "#,
        )
        .await?;

        info!("Schema ready at {}", self.pool.database_url());
        Ok(())
    }
}
