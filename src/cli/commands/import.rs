//! Import command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::services::ingest;

/// Load entries and the leaf node catalog into the database.
pub async fn cmd_import(
    settings: &Settings,
    entries_path: &Path,
    leaf_nodes_path: Option<&Path>,
    replace: bool,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let entries = ingest::read_entries(entries_path)?;
    let catalog = leaf_nodes_path.map(ingest::read_leaf_nodes).transpose()?;

    let summary = ingest::store(&ctx, &entries, catalog.as_deref(), replace).await?;

    if replace {
        println!(
            "{} Removed {} existing entries",
            style("→").cyan(),
            summary.removed
        );
    }
    println!(
        "{} Imported {} entries and {} leaf nodes{}",
        style("✓").green(),
        summary.entries,
        summary.leaf_nodes,
        if catalog.is_none() {
            " (catalog derived from all stored entries)"
        } else {
            ""
        }
    );
    Ok(())
}
