//! Initialize command.

use console::style;

use gdreviews::config::{Settings, CONFIG_FILENAME};

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    if !settings.data_dir.join(CONFIG_FILENAME).exists() {
        println!(
            "{} No {} in the data directory, using defaults",
            style("!").yellow(),
            CONFIG_FILENAME
        );
    }

    println!(
        "{} Initialized gdreviews in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
