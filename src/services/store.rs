//! Scrape one listing and persist what it yields.
//!
//! Reviews are written in batches of `batch_size`, each batch in its own
//! transaction. A batch that trips a unique constraint is rolled back and
//! replayed row by row so only the conflicting rows are lost. Any other
//! failed commit loses that batch only; the session carries on.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::models::{Company, OverviewRecord, ReviewRecord};
use crate::repository::{DbContext, PersistError};
use crate::scrapers::urls::extract_employer_id;
use crate::scrapers::{PageFetcher, ReviewScraper};

/// Persistence seam consumed by the store pipeline.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn find_company(&self, employer_id: i64) -> Result<Option<Company>, PersistError>;

    /// Insert or update the company row described by `overview`.
    async fn upsert_company(&self, overview: &OverviewRecord) -> Result<(), PersistError>;

    /// Make sure reviews of `employer_id` have a company row to point at.
    /// Returns true when the row had to be created.
    async fn ensure_company(&self, employer_id: i64) -> Result<bool, PersistError>;

    /// Insert and commit all of `batch`, or roll back and insert none.
    async fn insert_reviews(&self, batch: &[ReviewRecord]) -> Result<usize, PersistError>;

    async fn insert_review(&self, review: &ReviewRecord) -> Result<(), PersistError>;
}

#[async_trait]
impl ReviewStore for DbContext {
    async fn find_company(&self, employer_id: i64) -> Result<Option<Company>, PersistError> {
        Ok(self.companies().get_by_employer_id(employer_id).await?)
    }

    async fn upsert_company(&self, overview: &OverviewRecord) -> Result<(), PersistError> {
        self.companies().apply_overview(overview).await
    }

    async fn ensure_company(&self, employer_id: i64) -> Result<bool, PersistError> {
        Ok(self.companies().ensure_employer(employer_id).await?)
    }

    async fn insert_reviews(&self, batch: &[ReviewRecord]) -> Result<usize, PersistError> {
        self.reviews().insert_batch(batch).await
    }

    async fn insert_review(&self, review: &ReviewRecord) -> Result<(), PersistError> {
        self.reviews().insert_one(review).await
    }
}

/// Counters for one scrape-and-store run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub pages_scraped: u32,
    pub pages_failed: u32,
    pub reviews_scraped: usize,
    pub reviews_invalid: usize,
    pub reviews_inserted: usize,
    pub reviews_duplicate: usize,
    pub reviews_failed: usize,
    pub overview_stored: bool,
    pub company_created: bool,
}

/// Rows written by a [`ReviewBatcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTotals {
    pub inserted: usize,
    pub duplicates: usize,
    /// Rows lost to commits that failed for reasons other than a conflict.
    pub failed: usize,
}

/// Buffers reviews and writes them in fixed-size transactions.
pub struct ReviewBatcher<'s, S: ReviewStore + ?Sized> {
    store: &'s S,
    batch_size: usize,
    buffer: Vec<ReviewRecord>,
    totals: BatchTotals,
}

impl<'s, S: ReviewStore + ?Sized> ReviewBatcher<'s, S> {
    pub fn new(store: &'s S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            totals: BatchTotals::default(),
        }
    }

    pub async fn push(&mut self, review: ReviewRecord) {
        self.buffer.push(review);
        if self.buffer.len() >= self.batch_size {
            self.flush().await;
        }
    }

    pub async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.buffer);

        match self.store.insert_reviews(&batch).await {
            Ok(count) => {
                debug!(count, "review batch committed");
                self.totals.inserted += count;
            }
            Err(PersistError::Conflict(reason)) => {
                warn!(size = batch.len(), %reason, "batch rolled back, inserting row by row");
                for review in &batch {
                    self.insert_row(review).await;
                }
            }
            Err(e) => {
                let first = batch.first().map(|r| r.review_id);
                error!(size = batch.len(), ?first, error = %e, "review batch rolled back, skipping it");
                self.totals.failed += batch.len();
            }
        }
    }

    async fn insert_row(&mut self, review: &ReviewRecord) {
        match self.store.insert_review(review).await {
            Ok(()) => self.totals.inserted += 1,
            Err(PersistError::Conflict(_)) => {
                debug!(review_id = review.review_id, "skipping stored review");
                self.totals.duplicates += 1;
            }
            Err(e) => {
                error!(review_id = review.review_id, error = %e, "review insert failed, skipping it");
                self.totals.failed += 1;
            }
        }
    }

    /// Flush the partial batch and report what was written.
    pub async fn finish(mut self) -> BatchTotals {
        self.flush().await;
        self.totals
    }
}

/// Scrape `url` and store the overview and every valid review.
pub async fn scrape_and_store<F, S>(
    scraper: &ReviewScraper<F>,
    store: &S,
    url: &str,
    max_pages: Option<u32>,
    batch_size: usize,
) -> Result<StoreStats, PersistError>
where
    F: PageFetcher,
    S: ReviewStore + ?Sized,
{
    let session = scraper.scrape(url, max_pages).await;
    let mut stats = StoreStats {
        pages_scraped: session.pages_scraped,
        pages_failed: session.pages_failed,
        reviews_scraped: session.reviews.len(),
        ..Default::default()
    };
    if session.is_empty() {
        return Ok(stats);
    }

    let employer_id = session
        .overview
        .as_ref()
        .map(|o| o.employer_id)
        .or_else(|| extract_employer_id(url));
    if let Some(ref overview) = session.overview {
        match overview.validate() {
            Ok(()) => {
                stats.company_created = store.find_company(overview.employer_id).await?.is_none();
                store.upsert_company(overview).await?;
                stats.overview_stored = true;
            }
            Err(e) => warn!(url, employer_id = overview.employer_id, error = %e, "discarding invalid overview"),
        }
    }
    if !stats.overview_stored {
        if let Some(id) = employer_id {
            stats.company_created = store.ensure_company(id).await?;
        }
    }

    let mut batcher = ReviewBatcher::new(store, batch_size);
    for (_, mut review) in session.reviews {
        if review.employer_id.is_none() {
            review.employer_id = employer_id;
        }
        if let Err(e) = review.validate() {
            warn!(url, review_id = review.review_id, error = %e, "discarding invalid review");
            stats.reviews_invalid += 1;
            continue;
        }
        batcher.push(review).await;
    }
    let totals = batcher.finish().await;
    stats.reviews_inserted = totals.inserted;
    stats.reviews_duplicate = totals.duplicates;
    stats.reviews_failed = totals.failed;

    info!(
        url,
        ?employer_id,
        inserted = totals.inserted,
        duplicates = totals.duplicates,
        failed = totals.failed,
        invalid = stats.reviews_invalid,
        "reviews stored"
    );
    Ok(stats)
}
