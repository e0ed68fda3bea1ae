//! Catalog browsing commands.

use console::style;

use crate::config::Settings;
use crate::repository::MatchMode;

/// List leaf nodes.
pub async fn cmd_leaf_nodes(settings: &Settings, depth: Option<i32>) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    let nodes = ctx.leaf_nodes().list(depth).await?;

    if nodes.is_empty() {
        println!("{} No leaf nodes found", style("!").yellow());
        println!("  Run 'leafmark import <entries.json>' to load data");
        return Ok(());
    }

    let max_depth = ctx.leaf_nodes().max_depth().await?;
    println!(
        "{} {} leaf nodes (max depth {})",
        style("→").cyan(),
        nodes.len(),
        max_depth
    );
    for node in &nodes {
        println!(
            "  {:>7}%  {}  {}",
            node.formatted_percentage(),
            style(format!("d{}", node.depth)).dim(),
            node.name
        );
    }
    Ok(())
}

/// List one page of entries for a leaf node.
pub async fn cmd_entries(
    settings: &Settings,
    leaf_node: &str,
    exact: bool,
    page: u32,
    page_size: u32,
) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    let result = ctx
        .entries()
        .get_entries(leaf_node, MatchMode::from_exact_flag(exact), page, page_size)
        .await?;

    println!(
        "{} {} entries for '{}' (page {} of {})",
        style("→").cyan(),
        result.total_count,
        leaf_node,
        result.current_page,
        result.total_pages
    );
    for entry in &result.entries {
        println!();
        println!("  {}", style(entry.joined_leaf_nodes()).bold());
        println!("  {}", entry.summary);
        if let Some(ref annotation) = entry.annotation {
            println!(
                "  {} {}",
                style(format!("[{}]", annotation.provider)).dim(),
                annotation.raw_text
            );
        }
    }
    Ok(())
}
