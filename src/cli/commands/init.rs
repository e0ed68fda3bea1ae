//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    println!(
        "{} Initialized leafmark database at {}",
        style("✓").green(),
        settings.database_url()
    );

    let configured = crate::llm::ProviderRegistry::from_config(&settings.llm).configured();
    if configured.is_empty() {
        println!(
            "{} No provider API keys found",
            style("!").yellow()
        );
        println!("  Set ANTHROPIC_API_KEY or OPENAI_API_KEY to run annotation rounds");
    }

    Ok(())
}
