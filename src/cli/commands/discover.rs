//! Company discovery commands.

use console::style;
use tokio::sync::mpsc;

use super::helpers::{build_client, open_database, progress_bar};
use gdreviews::config::Settings;
use gdreviews::scrapers::CompanySearch;
use gdreviews::services::{create_review_urls, discover_companies, DiscoveryEvent};

/// Resolve tracked company names to employer ids.
pub async fn cmd_discover(settings: &Settings, workers: usize, all: bool) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let search = CompanySearch::new(build_client(settings)?);

    let pending = ctx
        .companies()
        .list()
        .await?
        .iter()
        .filter(|c| !c.id_not_found && (all || c.employer_id.is_none()))
        .count();
    if pending == 0 {
        println!("{} Nothing to look up", style("!").yellow());
        return Ok(());
    }

    let (event_tx, mut event_rx) = mpsc::channel::<DiscoveryEvent>(100);
    let pb = progress_bar(pending as u64)?;

    let pb_clone = pb.clone();
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                DiscoveryEvent::Found { name, employer_id } => {
                    pb_clone.set_message(format!("{} -> {}", name, employer_id));
                }
                DiscoveryEvent::NotFound { name } => {
                    pb_clone.println(format!("{} No match for {}", style("?").yellow(), name));
                }
                DiscoveryEvent::Failed { name, error } => {
                    pb_clone.println(format!(
                        "{} Lookup failed for {}: {}",
                        style("✗").red(),
                        name,
                        error
                    ));
                }
            }
            pb_clone.inc(1);
        }
    });

    let stats = discover_companies(&ctx, &search, workers, all, event_tx).await?;

    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }
    pb.finish_and_clear();

    println!(
        "{} Discovery complete: {} found, {} not found, {} failed",
        style("✓").green(),
        stats.found,
        stats.not_found,
        stats.failed
    );
    Ok(())
}

/// Write review listing URLs for every company with an employer id.
pub async fn cmd_urls(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let updated = create_review_urls(&ctx, &settings.scrape.region_filter).await?;
    println!("{} Created {} review URLs", style("✓").green(), updated);
    Ok(())
}
