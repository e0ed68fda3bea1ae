//! Entry store gateway: category-driven retrieval with pagination.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::models::{EntryRecord, NewEntry};
use super::util::{contains_pattern, LIKE_ESCAPE};
use super::{SqlitePool, StoreError};
use crate::models::{AiResult, Entry};
use crate::schema::entries;

/// How a leaf node name is matched against an entry's joined label field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The whole joined field equals the name.
    Exact,
    /// The joined field contains the name, ignoring case (Unicode lowercase).
    #[default]
    Substring,
}

impl MatchMode {
    pub fn from_exact_flag(exact: bool) -> Self {
        if exact {
            Self::Exact
        } else {
            Self::Substring
        }
    }
}

/// One page of entries for a leaf node query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPage {
    pub entries: Vec<Entry>,
    pub total_count: u64,
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

/// Number of pages needed for `total` items.
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    total.div_ceil(u64::from(page_size.max(1)))
}

#[derive(Clone)]
pub struct EntryRepository {
    pool: SqlitePool,
}

impl EntryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn matching(leaf_node: &str, mode: MatchMode) -> entries::BoxedQuery<'_, Sqlite> {
        match mode {
            MatchMode::Exact => entries::table
                .filter(entries::labels.eq(leaf_node))
                .into_boxed(),
            MatchMode::Substring => entries::table
                .filter(
                    entries::labels_folded
                        .like(contains_pattern(&leaf_node.to_lowercase()))
                        .escape(LIKE_ESCAPE),
                )
                .into_boxed(),
        }
    }

    fn validate(leaf_node: &str) -> Result<(), StoreError> {
        if leaf_node.trim().is_empty() {
            return Err(StoreError::BadRequest(
                "Leaf node parameter is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Fetch one page of entries labeled with `leaf_node`.
    ///
    /// Results are ordered by insertion so consecutive pages never overlap.
    pub async fn get_entries(
        &self,
        leaf_node: &str,
        mode: MatchMode,
        page: u32,
        page_size: u32,
    ) -> Result<EntryPage, StoreError> {
        Self::validate(leaf_node)?;
        if page == 0 || page_size == 0 {
            return Err(StoreError::BadRequest(
                "page and pageSize must be at least 1".to_string(),
            ));
        }

        let mut conn = self.pool.get().await?;

        let total: i64 = Self::matching(leaf_node, mode)
            .count()
            .get_result(&mut conn)
            .await?;

        let skip = u64::from(page - 1) * u64::from(page_size);
        let records = Self::matching(leaf_node, mode)
            .order(entries::id.asc())
            .limit(i64::from(page_size))
            .offset(skip as i64)
            .load::<EntryRecord>(&mut conn)
            .await?;

        let total_count = total as u64;
        debug!(
            "Entries for {:?} ({:?}): page {} of {} ({} total)",
            leaf_node,
            mode,
            page,
            total_pages(total_count, page_size),
            total_count
        );

        Ok(EntryPage {
            entries: records.into_iter().map(Entry::from).collect(),
            total_count,
            current_page: page,
            page_size,
            total_pages: total_pages(total_count, page_size),
        })
    }

    /// Fetch every entry labeled with `leaf_node`, unpaginated.
    pub async fn get_all_entries(
        &self,
        leaf_node: &str,
        mode: MatchMode,
    ) -> Result<Vec<Entry>, StoreError> {
        Self::validate(leaf_node)?;
        let mut conn = self.pool.get().await?;

        let records = Self::matching(leaf_node, mode)
            .order(entries::id.asc())
            .load::<EntryRecord>(&mut conn)
            .await?;

        Ok(records.into_iter().map(Entry::from).collect())
    }

    /// Every stored entry, in insertion order.
    pub async fn list_all(&self) -> Result<Vec<Entry>, StoreError> {
        let mut conn = self.pool.get().await?;
        let records = entries::table
            .order(entries::id.asc())
            .load::<EntryRecord>(&mut conn)
            .await?;
        Ok(records.into_iter().map(Entry::from).collect())
    }

    /// Insert entries, returning them with their assigned ids.
    pub async fn insert_all(&self, new_entries: &[Entry]) -> Result<Vec<Entry>, StoreError> {
        let mut conn = self.pool.get().await?;

        let mut saved = Vec::with_capacity(new_entries.len());
        for entry in new_entries {
            let labels = entry.joined_leaf_nodes();
            let labels_folded = labels.to_lowercase();
            diesel::insert_into(entries::table)
                .values(NewEntry {
                    labels: &labels,
                    summary: &entry.summary,
                    body: &entry.body,
                    labels_folded: &labels_folded,
                })
                .execute(&mut conn)
                .await?;

            let id: i32 = entries::table
                .select(entries::id)
                .order(entries::id.desc())
                .first(&mut conn)
                .await?;

            let mut entry = entry.clone();
            entry.id = id;
            entry.annotation = None;
            saved.push(entry);
        }

        info!("Inserted {} entries", saved.len());
        Ok(saved)
    }

    /// Attach round results, replacing any earlier annotation on each entry.
    pub async fn attach_annotations(
        &self,
        annotations: &[(i32, AiResult)],
    ) -> Result<usize, StoreError> {
        let mut conn = self.pool.get().await?;

        let mut updated = 0;
        for (id, result) in annotations {
            let provider = Some(result.provider.code().to_string());
            let raw_text = Some(result.raw_text.clone());
            let annotated_at = result.annotated_at.map(|dt| dt.to_rfc3339());
            updated += diesel::update(entries::table.find(*id))
                .set((
                    entries::annotation_provider.eq(&provider),
                    entries::annotation_text.eq(&raw_text),
                    entries::annotated_at.eq(&annotated_at),
                ))
                .execute(&mut conn)
                .await?;
        }
        Ok(updated)
    }

    /// Total number of entries in the store.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = entries::table.count().get_result(&mut conn).await?;
        Ok(count as u64)
    }

    /// Remove every entry.
    pub async fn clear(&self) -> Result<usize, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(diesel::delete(entries::table).execute(&mut conn).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup() -> (EntryRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx.entries(), dir)
    }

    async fn seed_layoffs(repo: &EntryRepository) {
        let mut batch = Vec::new();
        for i in 0..3 {
            batch.push(Entry::new(["Layoffs"], format!("exact {i}"), format!("body {i}")));
        }
        for i in 0..2 {
            batch.push(Entry::new(
                ["Restructuring/Layoffs", "Layoffs"],
                format!("multi {i}"),
                format!("multi body {i}"),
            ));
        }
        batch.push(Entry::new(["Hiring"], "other", "other body"));
        repo.insert_all(&batch).await.unwrap();
    }

    #[tokio::test]
    async fn test_exact_versus_substring_counts() {
        let (repo, _dir) = setup().await;
        seed_layoffs(&repo).await;

        let exact = repo
            .get_entries("Layoffs", MatchMode::Exact, 1, 10)
            .await
            .unwrap();
        assert_eq!(exact.total_count, 3);

        let substring = repo
            .get_entries("Layoffs", MatchMode::Substring, 1, 2)
            .await
            .unwrap();
        assert_eq!(substring.total_count, 5);
        assert_eq!(substring.total_pages, 3);
        assert_eq!(substring.entries.len(), 2);
        assert_eq!(substring.current_page, 1);
        assert_eq!(substring.page_size, 2);
    }

    #[tokio::test]
    async fn test_substring_is_case_insensitive_and_literal() {
        let (repo, _dir) = setup().await;
        seed_layoffs(&repo).await;
        repo.insert_all(&[Entry::new(["50% Off"], "s", "b")])
            .await
            .unwrap();

        let lower = repo
            .get_entries("layoffs", MatchMode::Substring, 1, 50)
            .await
            .unwrap();
        assert_eq!(lower.total_count, 5);

        // `_` and `%` are matched literally
        let wildcard = repo
            .get_entries("_", MatchMode::Substring, 1, 50)
            .await
            .unwrap();
        assert_eq!(wildcard.total_count, 0);
        let percent = repo
            .get_entries("50%", MatchMode::Substring, 1, 50)
            .await
            .unwrap();
        assert_eq!(percent.total_count, 1);
    }

    #[tokio::test]
    async fn test_substring_folds_non_ascii_case() {
        let (repo, _dir) = setup().await;
        repo.insert_all(&[
            Entry::new(["Übernahme"], "s", "b"),
            Entry::new(["ÉTATS"], "s", "b"),
        ])
        .await
        .unwrap();

        let umlaut = repo
            .get_entries("übernahme", MatchMode::Substring, 1, 10)
            .await
            .unwrap();
        assert_eq!(umlaut.total_count, 1);
        assert_eq!(umlaut.entries[0].leaf_nodes, vec!["Übernahme".to_string()]);

        let accent = repo
            .get_entries("états", MatchMode::Substring, 1, 10)
            .await
            .unwrap();
        assert_eq!(accent.total_count, 1);

        // exact mode stays case-sensitive
        let exact = repo
            .get_entries("übernahme", MatchMode::Exact, 1, 10)
            .await
            .unwrap();
        assert_eq!(exact.total_count, 0);
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty() {
        let (repo, _dir) = setup().await;
        seed_layoffs(&repo).await;

        let page = repo
            .get_entries("Layoffs", MatchMode::Substring, 9, 2)
            .await
            .unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.total_count, 5);
    }

    #[tokio::test]
    async fn test_missing_leaf_node_is_bad_request() {
        let (repo, _dir) = setup().await;
        assert!(matches!(
            repo.get_entries("  ", MatchMode::Exact, 1, 10).await,
            Err(StoreError::BadRequest(_))
        ));
        assert!(matches!(
            repo.get_entries("Layoffs", MatchMode::Exact, 0, 10).await,
            Err(StoreError::BadRequest(_))
        ));
        assert!(matches!(
            repo.get_all_entries("", MatchMode::Substring).await,
            Err(StoreError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_attach_annotations_replaces_previous() {
        let (repo, _dir) = setup().await;
        let saved = repo
            .insert_all(&[Entry::new(["Layoffs"], "s", "b")])
            .await
            .unwrap();
        let id = saved[0].id;

        repo.attach_annotations(&[(id, AiResult::new(Provider::Anthropic, "first"))])
            .await
            .unwrap();
        repo.attach_annotations(&[(id, AiResult::new(Provider::OpenAi, "second"))])
            .await
            .unwrap();

        let entries = repo
            .get_all_entries("Layoffs", MatchMode::Exact)
            .await
            .unwrap();
        let annotation = entries[0].annotation.as_ref().unwrap();
        assert_eq!(annotation.provider, Provider::OpenAi);
        assert_eq!(annotation.raw_text, "second");
        assert!(annotation.annotated_at.is_some());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(5, 2), 3);
        assert_eq!(total_pages(4, 2), 2);
        assert_eq!(total_pages(1, 100), 1);
    }
}
