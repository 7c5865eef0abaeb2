//! Scrape commands.

use anyhow::Context;
use console::style;
use tokio::sync::mpsc;

use super::helpers::{build_client, open_database, progress_bar};
use gdreviews::config::Settings;
use gdreviews::scrapers::urls::transform_url;
use gdreviews::scrapers::ReviewScraper;
use gdreviews::services::{scrape_companies, RunOptions, ScrapeEvent};

/// Scrape every tracked company (or the given employer ids) into the database.
pub async fn cmd_scrape(
    settings: &Settings,
    employer_ids: &[i64],
    workers: usize,
    max_pages: Option<u32>,
) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let targets = ctx.companies().scrape_targets(employer_ids).await?;
    if targets.is_empty() {
        println!(
            "{} No companies with review URLs. Run 'gdreviews discover' and 'gdreviews urls' first",
            style("!").yellow()
        );
        return Ok(());
    }

    let scraper = ReviewScraper::new(build_client(settings)?, settings.scrape.clone());
    let options = RunOptions {
        workers,
        max_pages,
        batch_size: settings.batch_size,
    };

    let (event_tx, mut event_rx) = mpsc::channel::<ScrapeEvent>(100);
    let pb = progress_bar(targets.len() as u64)?;

    let pb_clone = pb.clone();
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ScrapeEvent::Started { name, .. } => {
                    pb_clone.set_message(name);
                }
                ScrapeEvent::Finished { name, stats } => {
                    pb_clone.println(format!(
                        "{} {}: {} new reviews, {} already stored ({} pages)",
                        style("✓").green(),
                        name,
                        stats.reviews_inserted,
                        stats.reviews_duplicate,
                        stats.pages_scraped
                    ));
                    pb_clone.inc(1);
                }
                ScrapeEvent::Failed { name, error } => {
                    pb_clone.println(format!("{} {}: {}", style("✗").red(), name, error));
                    pb_clone.inc(1);
                }
            }
        }
    });

    let summary = scrape_companies(&scraper, &ctx, targets, &options, event_tx).await;

    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }
    pb.finish_and_clear();

    println!(
        "{} Scraped {} companies: {} reviews stored, {} duplicates, {} invalid, {} not written",
        style("✓").green(),
        summary.sessions - summary.failed,
        summary.reviews_inserted,
        summary.reviews_duplicate,
        summary.reviews_invalid,
        summary.reviews_failed
    );
    if summary.failed > 0 || summary.skipped > 0 {
        println!(
            "{} {} sessions failed, {} companies skipped",
            style("!").yellow(),
            summary.failed,
            summary.skipped
        );
    }
    Ok(())
}

/// Scrape a single listing and print the session as JSON.
pub async fn cmd_fetch(settings: &Settings, url: &str, max_pages: Option<u32>) -> anyhow::Result<()> {
    let parsed = url::Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    let url = transform_url(parsed.as_str())
        .with_context(|| format!("Not a review listing URL: {}", url))?;
    let scraper = ReviewScraper::new(build_client(settings)?, settings.scrape.clone());

    let session = scraper.scrape(&url, max_pages).await;
    if session.is_empty() {
        eprintln!("{} No reviews found at {}", style("!").yellow(), url);
    }

    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}
