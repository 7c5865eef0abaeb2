//! Fan scrape sessions for many companies across a fixed number of workers.
//!
//! Each session is independent: a failed session is reported and counted,
//! and never cancels its siblings.

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info};

use super::store::{scrape_and_store, ReviewStore, StoreStats};
use crate::models::Company;
use crate::scrapers::urls::transform_url;
use crate::scrapers::{PageFetcher, ReviewScraper};

/// Events emitted while scraping.
#[derive(Debug, Clone)]
pub enum ScrapeEvent {
    Started { name: String, url: String },
    Finished { name: String, stats: StoreStats },
    Failed { name: String, error: String },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub workers: usize,
    pub max_pages: Option<u32>,
    pub batch_size: usize,
}

/// Totals over all sessions of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub sessions: usize,
    pub failed: usize,
    pub skipped: usize,
    pub reviews_inserted: usize,
    pub reviews_duplicate: usize,
    pub reviews_invalid: usize,
    pub reviews_failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &SessionOutcome) {
        match outcome {
            SessionOutcome::Stored(stats) => {
                self.sessions += 1;
                self.reviews_inserted += stats.reviews_inserted;
                self.reviews_duplicate += stats.reviews_duplicate;
                self.reviews_invalid += stats.reviews_invalid;
                self.reviews_failed += stats.reviews_failed;
            }
            SessionOutcome::Failed => {
                self.sessions += 1;
                self.failed += 1;
            }
            SessionOutcome::NoUrl => self.skipped += 1,
        }
    }
}

enum SessionOutcome {
    Stored(StoreStats),
    Failed,
    NoUrl,
}

/// Scrape every target, `options.workers` sessions at a time.
pub async fn scrape_companies<F, S>(
    scraper: &ReviewScraper<F>,
    store: &S,
    targets: Vec<Company>,
    options: &RunOptions,
    event_tx: mpsc::Sender<ScrapeEvent>,
) -> RunSummary
where
    F: PageFetcher,
    S: ReviewStore + ?Sized,
{
    info!(targets = targets.len(), workers = options.workers, "starting scrape run");

    let outcomes: Vec<SessionOutcome> = stream::iter(targets)
        .map(|company| {
            let event_tx = event_tx.clone();
            async move { run_session(scraper, store, company, options, &event_tx).await }
        })
        .buffer_unordered(options.workers.max(1))
        .collect()
        .await;

    let mut summary = RunSummary::default();
    for outcome in &outcomes {
        summary.record(outcome);
    }

    info!(
        sessions = summary.sessions,
        failed = summary.failed,
        inserted = summary.reviews_inserted,
        duplicates = summary.reviews_duplicate,
        failed_reviews = summary.reviews_failed,
        "scrape run complete"
    );
    summary
}

async fn run_session<F, S>(
    scraper: &ReviewScraper<F>,
    store: &S,
    company: Company,
    options: &RunOptions,
    event_tx: &mpsc::Sender<ScrapeEvent>,
) -> SessionOutcome
where
    F: PageFetcher,
    S: ReviewStore + ?Sized,
{
    let name = company.employer_name.clone();
    let Some(url) = company.review_url().and_then(transform_url) else {
        error!(company = %name, "company has no usable review URL");
        return SessionOutcome::NoUrl;
    };

    let _ = event_tx
        .send(ScrapeEvent::Started {
            name: name.clone(),
            url: url.clone(),
        })
        .await;

    match scrape_and_store(scraper, store, &url, options.max_pages, options.batch_size).await {
        Ok(stats) => {
            let _ = event_tx
                .send(ScrapeEvent::Finished {
                    name,
                    stats: stats.clone(),
                })
                .await;
            SessionOutcome::Stored(stats)
        }
        Err(e) => {
            error!(company = %name, %url, error = %e, "scrape session failed");
            let _ = event_tx
                .send(ScrapeEvent::Failed {
                    name,
                    error: e.to_string(),
                })
                .await;
            SessionOutcome::Failed
        }
    }
}
