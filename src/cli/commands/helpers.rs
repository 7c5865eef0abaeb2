//! Shared helper functions for CLI commands.

use anyhow::Context;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

use gdreviews::config::Settings;
use gdreviews::repository::DbContext;
use gdreviews::scrapers::{HttpClient, RateLimitGuard};

/// Open the configured database, creating the schema if needed.
pub async fn open_database(settings: &Settings) -> anyhow::Result<DbContext> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema()
        .await
        .with_context(|| format!("Failed to open database {}", settings.database_url()))?;
    Ok(ctx)
}

/// Build the proxied client every command fetches through.
pub fn build_client(settings: &Settings) -> anyhow::Result<HttpClient> {
    let guard = RateLimitGuard::from_config(settings.rate_limit_max_hits);
    HttpClient::from_settings(settings, guard).context("Failed to build HTTP client")
}

/// Progress bar over `len` items, hidden when stderr is not a terminal.
pub fn progress_bar(len: u64) -> anyhow::Result<ProgressBar> {
    if !Term::stderr().is_term() {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
