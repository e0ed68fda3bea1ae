//! Taxonomy catalog repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use super::models::{LeafNodeRecord, NewLeafNode};
use super::{SqlitePool, StoreError};
use crate::models::LeafNode;
use crate::schema::leaf_nodes;

/// Read access to the taxonomy catalog, plus the bulk writes used by ingestion.
#[derive(Clone)]
pub struct LeafNodeRepository {
    pool: SqlitePool,
}

impl LeafNodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List leaf nodes sorted by percentage descending, optionally for one depth only.
    ///
    /// Ties are broken by name so the listing is stable.
    pub async fn list(&self, depth: Option<i32>) -> Result<Vec<LeafNode>, StoreError> {
        let mut conn = self.pool.get().await?;

        let mut query = leaf_nodes::table.into_boxed();
        if let Some(depth) = depth {
            query = query.filter(leaf_nodes::depth.eq(depth));
        }

        let records = query
            .order((leaf_nodes::percentage.desc(), leaf_nodes::name.asc()))
            .load::<LeafNodeRecord>(&mut conn)
            .await?;

        debug!("Loaded {} leaf nodes (depth={:?})", records.len(), depth);
        Ok(records.into_iter().map(LeafNode::from).collect())
    }

    /// Maximum depth present in the catalog; 1 when the catalog is empty.
    pub async fn max_depth(&self) -> Result<i32, StoreError> {
        use diesel::dsl::max;

        let mut conn = self.pool.get().await?;
        let deepest: Option<i32> = leaf_nodes::table
            .select(max(leaf_nodes::depth))
            .first(&mut conn)
            .await?;

        Ok(deepest.unwrap_or(1))
    }

    /// Insert or replace leaf nodes by name.
    pub async fn save_all(&self, nodes: &[LeafNode]) -> Result<usize, StoreError> {
        let mut conn = self.pool.get().await?;

        let mut written = 0;
        for node in nodes {
            written += diesel::replace_into(leaf_nodes::table)
                .values(NewLeafNode {
                    name: &node.name,
                    depth: node.depth,
                    percentage: node.percentage,
                })
                .execute(&mut conn)
                .await?;
        }
        Ok(written)
    }

    /// Remove every leaf node.
    pub async fn clear(&self) -> Result<usize, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(diesel::delete(leaf_nodes::table).execute(&mut conn).await?)
    }
}
