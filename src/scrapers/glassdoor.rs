//! Pagination driver for one employer's review listing.
//!
//! A session walks `_P<n>` pages in order. Each page goes through fetch,
//! locate, normalize, load, and extract; a page that fails anywhere is
//! logged and skipped. The first overview seen fixes the page ceiling.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::apollo::{parse_page, StateError};
use super::extract::{extract_overview, extract_reviews, ExtractError};
use super::http_client::{FetchError, PageFetcher};
use super::urls::{change_page, with_default_regions, Region, UrlError};
use crate::models::{OverviewRecord, ReviewRecord};

/// Why a single page contributed nothing.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("no usable embedded state: {0}")]
    State(#[from] StateError),
    #[error("review extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Url(#[from] UrlError),
}

/// Tunables for a scrape session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeOptions {
    /// Page budget used until an upstream page count is known.
    pub default_max_pages: u32,
    /// Pause after each successful page.
    #[serde(with = "super::http_client::duration_secs")]
    pub page_delay: Duration,
    /// Region filter added to URLs that carry none.
    pub region_filter: Vec<Region>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            default_max_pages: 20,
            page_delay: Duration::from_secs(1),
            region_filter: Region::defaults(),
        }
    }
}

/// Everything one session collected.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeSession {
    pub url: String,
    pub overview: Option<OverviewRecord>,
    pub reviews: BTreeMap<i64, ReviewRecord>,
    pub pages_scraped: u32,
    pub pages_failed: u32,
}

impl ScrapeSession {
    /// True when no review was collected, whatever else happened.
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

struct PageOutcome {
    overview: Option<OverviewRecord>,
    reviews: Result<BTreeMap<i64, ReviewRecord>, ExtractError>,
}

/// Page ceiling once an overview is known.
fn effective_ceiling(cap: Option<u32>, declared: Option<u32>, default: u32) -> u32 {
    match (cap, declared) {
        (Some(cap), Some(declared)) => cap.min(declared),
        (Some(cap), None) => cap,
        (None, Some(declared)) => declared,
        (None, None) => default,
    }
}

/// Scrapes review listings through any [`PageFetcher`].
pub struct ReviewScraper<F> {
    fetcher: F,
    options: ScrapeOptions,
}

impl<F: PageFetcher> ReviewScraper<F> {
    pub fn new(fetcher: F, options: ScrapeOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &ScrapeOptions {
        &self.options
    }

    /// Scrape every page of a listing, up to `max_pages` when given.
    pub async fn scrape(&self, base_url: &str, max_pages: Option<u32>) -> ScrapeSession {
        let base_url = with_default_regions(base_url, &self.options.region_filter);
        info!(url = %base_url, ?max_pages, "scraping reviews");

        let mut session = ScrapeSession {
            url: base_url.clone(),
            ..Default::default()
        };
        let mut ceiling = max_pages.unwrap_or(self.options.default_max_pages);
        let mut page = 1u32;

        while page <= ceiling {
            let page_url = if page == 1 {
                base_url.clone()
            } else {
                match change_page(&base_url, page) {
                    Ok(url) => url,
                    Err(e) => {
                        error!(url = %base_url, page, error = %e, "cannot paginate listing");
                        break;
                    }
                }
            };

            match self.scrape_page(&page_url).await {
                Ok(outcome) => {
                    if let Some(overview) = outcome.overview {
                        match session.overview.as_mut() {
                            Some(known) => known.merge_missing(overview),
                            None => {
                                ceiling = effective_ceiling(
                                    max_pages,
                                    overview.declared_pages(),
                                    self.options.default_max_pages,
                                );
                                debug!(url = %base_url, ceiling, "page ceiling set from overview");
                                session.overview = Some(overview);
                            }
                        }
                    }

                    match outcome.reviews {
                        Ok(reviews) => {
                            debug!(url = %page_url, page, count = reviews.len(), "page scraped");
                            session.reviews.extend(reviews);
                            session.pages_scraped += 1;
                            if page < ceiling {
                                tokio::time::sleep(self.options.page_delay).await;
                            }
                        }
                        Err(e) => {
                            error!(url = %page_url, page, error = %e, "dropping page reviews");
                            session.pages_failed += 1;
                        }
                    }
                }
                Err(e) => {
                    error!(url = %page_url, page, error = %e, "skipping page");
                    session.pages_failed += 1;
                }
            }

            page += 1;
        }

        if session.reviews.is_empty() {
            warn!(url = %base_url, pages_failed = session.pages_failed, "no reviews scraped");
            session.overview = None;
            return session;
        }

        info!(
            url = %base_url,
            total_reviews = session.reviews.len(),
            total_pages = ceiling,
            pages_failed = session.pages_failed,
            "scrape pass complete"
        );
        session
    }

    async fn scrape_page(&self, url: &str) -> Result<PageOutcome, PageError> {
        let html = self.fetcher.fetch(url).await?;
        let cache = parse_page(&html)?;
        Ok(PageOutcome {
            overview: extract_overview(&cache),
            reviews: extract_reviews(&cache),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_is_the_smaller_bound() {
        assert_eq!(effective_ceiling(Some(5), Some(3), 20), 3);
        assert_eq!(effective_ceiling(Some(2), Some(30), 20), 2);
        assert_eq!(effective_ceiling(None, Some(30), 20), 30);
        assert_eq!(effective_ceiling(Some(4), None, 20), 4);
        assert_eq!(effective_ceiling(None, None, 20), 20);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ScrapeOptions = toml::from_str("page_delay = 0.25\nregion_filter = [2]").unwrap();
        assert_eq!(options.page_delay, Duration::from_millis(250));
        assert_eq!(options.region_filter, vec![Region::UnitedKingdom]);
        assert_eq!(options.default_max_pages, 20);
    }
}
