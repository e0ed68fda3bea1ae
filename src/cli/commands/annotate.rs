//! Annotation round command.

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::models::{AiResult, Provider};
use crate::repository::MatchMode;
use crate::services::{
    build_query, export, ingest, is_item_error, AnnotationDispatcher, DispatchEvent, ExportEntry,
};

/// Which matching entries take part in the round.
#[derive(Debug, Clone, Copy)]
pub enum Selection {
    All,
    Page { page: u32, page_size: u32 },
}

/// Annotate entries for a leaf node and write the export document.
pub async fn cmd_annotate(
    settings: &Settings,
    leaf_node: &str,
    fields_path: &Path,
    provider: Provider,
    exact: bool,
    selection: Selection,
    output: &Path,
) -> anyhow::Result<()> {
    let fields = ingest::read_fields(fields_path)?;
    let query = build_query(&fields);
    if query.instruction.is_empty() {
        println!(
            "{} No complete query fields in {}",
            style("!").yellow(),
            fields_path.display()
        );
        println!("  Each field needs an itemName and a question");
        return Ok(());
    }

    let ctx = settings.create_db_context();
    let entry_repo = ctx.entries();
    let mode = MatchMode::from_exact_flag(exact);
    let mut entries = match selection {
        Selection::All => entry_repo.get_all_entries(leaf_node, mode).await?,
        Selection::Page { page, page_size } => {
            entry_repo
                .get_entries(leaf_node, mode, page, page_size)
                .await?
                .entries
        }
    };

    if entries.is_empty() {
        println!("{} No entries match '{}'", style("!").yellow(), leaf_node);
        return Ok(());
    }

    let dispatcher = AnnotationDispatcher::from_config(&settings.llm);
    println!(
        "{} Annotating {} entries with {} ({} concurrent)",
        style("→").cyan(),
        entries.len(),
        provider,
        dispatcher.max_concurrency()
    );

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<DispatchEvent>();
    let event_handler = tokio::spawn(async move {
        let mut progress: Option<ProgressBar> = None;
        while let Some(event) = event_rx.recv().await {
            match event {
                DispatchEvent::Started { total, .. } => {
                    let pb = ProgressBar::new(total as u64);
                    if let Ok(bar_style) = ProgressStyle::default_bar()
                        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                    {
                        pb.set_style(bar_style.progress_chars("█▓░"));
                    }
                    pb.set_message("Waiting for provider...");
                    progress = Some(pb);
                }
                DispatchEvent::ItemCompleted { .. } => {
                    if let Some(ref pb) = progress {
                        pb.inc(1);
                    }
                }
                DispatchEvent::ItemFailed { index, error } => {
                    if let Some(ref pb) = progress {
                        pb.println(format!(
                            "{} Article {}: {}",
                            style("✗").red(),
                            index + 1,
                            error
                        ));
                        pb.inc(1);
                    }
                }
                DispatchEvent::Complete { succeeded, failed } => {
                    if let Some(pb) = progress.take() {
                        pb.finish_and_clear();
                    }
                    println!(
                        "{} Round complete: {} succeeded, {} failed",
                        style("✓").green(),
                        succeeded,
                        failed
                    );
                }
            }
        }
    });

    let bodies: Vec<String> = entries.iter().map(|e| e.body.clone()).collect();
    let results = dispatcher
        .dispatch_with_events(&bodies, &query.instruction, provider, Some(event_tx))
        .await;
    let _ = event_handler.await;
    let results = results?;

    let annotations: Vec<(i32, AiResult)> = entries
        .iter()
        .zip(&results)
        .map(|(entry, text)| (entry.id, AiResult::new(provider, text.as_str())))
        .collect();
    ctx.entries().attach_annotations(&annotations).await?;

    for (entry, (_, annotation)) in entries.iter_mut().zip(annotations) {
        entry.annotation = Some(annotation);
    }

    let export_entries: Vec<ExportEntry> = entries.iter().map(ExportEntry::from).collect();
    let document = export(
        &settings.database_name,
        leaf_node,
        Some(provider),
        &query.schema,
        &export_entries,
    );
    std::fs::write(output, document.to_pretty_json()?)?;

    let failed = results.iter().filter(|r| is_item_error(r)).count();
    if failed > 0 {
        println!(
            "  {} {} entries carry an error; re-run to retry them",
            style("!").yellow(),
            failed
        );
    }
    println!(
        "{} Wrote {}",
        style("✓").green(),
        output.display()
    );
    Ok(())
}
