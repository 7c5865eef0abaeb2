//! Scrape-and-store against a SQLite database in a temp directory.

mod common;

use std::sync::Arc;

use tempfile::{tempdir, TempDir};
use tokio::sync::mpsc;

use common::{employer_name, fast_options, ids, page_without_overview, ScriptedSite, META, NVIDIA};
use gdreviews::models::CompanyMatch;
use gdreviews::repository::DbContext;
use gdreviews::scrapers::urls::Region;
use gdreviews::scrapers::ReviewScraper;
use gdreviews::services::{
    create_review_urls, scrape_and_store, scrape_companies, RunOptions, ScrapeEvent,
};

const LISTING: &str = "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633.htm";

async fn database() -> (DbContext, TempDir) {
    let dir = tempdir().unwrap();
    let ctx = DbContext::new(&dir.path().join("gdreviews.db"));
    ctx.init_schema().await.unwrap();
    (ctx, dir)
}

#[tokio::test]
async fn stores_overview_and_reviews() {
    let (ctx, _dir) = database().await;
    let scraper = ReviewScraper::new(ScriptedSite::new().listing(NVIDIA, 3, 6), fast_options());

    let stats = scrape_and_store(&scraper, &ctx, LISTING, None, 5).await.unwrap();

    assert_eq!(stats.pages_scraped, 3);
    assert_eq!(stats.reviews_scraped, 18);
    assert_eq!(stats.reviews_inserted, 18);
    assert_eq!(stats.reviews_duplicate, 0);
    assert!(stats.overview_stored);
    assert!(stats.company_created);

    let company = ctx.companies().get_by_employer_id(NVIDIA).await.unwrap().unwrap();
    assert_eq!(company.employer_name, "NVIDIA");
    assert!(company.last_scraped.is_some());
    let overview = company.overview.unwrap();
    assert_eq!(overview.overall_rating, Some(4.6));
    assert_eq!(overview.ceo_name.as_deref(), Some("Jensen Huang"));

    assert_eq!(ctx.reviews().count_for_employer(NVIDIA).await.unwrap(), 18);
}

#[tokio::test]
async fn rescrape_skips_stored_reviews() {
    let (ctx, _dir) = database().await;
    let first = ReviewScraper::new(ScriptedSite::new().listing(NVIDIA, 2, 4), fast_options());
    scrape_and_store(&first, &ctx, LISTING, None, 3).await.unwrap();

    // the second listing overlaps the first on its first two pages
    let second = ReviewScraper::new(ScriptedSite::new().listing(NVIDIA, 3, 4), fast_options());
    let stats = scrape_and_store(&second, &ctx, LISTING, None, 3).await.unwrap();

    assert!(!stats.company_created);
    assert_eq!(stats.reviews_inserted, 4);
    assert_eq!(stats.reviews_duplicate, 8);
    assert_eq!(ctx.reviews().count_for_employer(NVIDIA).await.unwrap(), 12);
}

#[tokio::test]
async fn reviews_without_overview_get_a_placeholder_company() {
    let (ctx, _dir) = database().await;
    let site = ScriptedSite::new().page(NVIDIA, 1, page_without_overview(NVIDIA, &ids(1, 3)));
    let scraper = ReviewScraper::new(site, fast_options());

    let stats = scrape_and_store(&scraper, &ctx, LISTING, Some(1), 10).await.unwrap();

    assert!(!stats.overview_stored);
    assert!(stats.company_created);
    assert_eq!(stats.reviews_inserted, 3);
    assert_eq!(stats.reviews_failed, 0);
    assert_eq!(ctx.reviews().count_for_employer(NVIDIA).await.unwrap(), 3);

    let company = ctx.companies().get_by_employer_id(NVIDIA).await.unwrap().unwrap();
    assert_eq!(company.employer_name, NVIDIA.to_string());

    // a later run with an overview fills the placeholder in
    let scraper = ReviewScraper::new(ScriptedSite::new().listing(NVIDIA, 1, 2), fast_options());
    let stats = scrape_and_store(&scraper, &ctx, LISTING, None, 10).await.unwrap();
    assert!(stats.overview_stored);
    assert!(!stats.company_created);
    let company = ctx.companies().get_by_employer_id(NVIDIA).await.unwrap().unwrap();
    assert_eq!(company.employer_name, "NVIDIA");
}

#[tokio::test]
async fn empty_session_writes_nothing() {
    let (ctx, _dir) = database().await;
    let scraper = ReviewScraper::new(ScriptedSite::new(), fast_options());

    let stats = scrape_and_store(&scraper, &ctx, LISTING, Some(2), 10).await.unwrap();

    assert_eq!(stats.pages_failed, 2);
    assert!(!stats.overview_stored);
    assert!(ctx.companies().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn run_scrapes_every_resolved_company() {
    let (ctx, _dir) = database().await;
    let companies = ctx.companies();
    for employer_id in [NVIDIA, META] {
        let name = employer_name(employer_id);
        companies.add_name(name).await.unwrap();
        companies
            .apply_search_result(
                name,
                &CompanyMatch {
                    employer_id,
                    suggestion: name.to_string(),
                },
            )
            .await
            .unwrap();
    }
    companies.add_name("Unresolved Inc").await.unwrap();
    assert_eq!(create_review_urls(&ctx, &Region::defaults()).await.unwrap(), 2);

    let site = Arc::new(ScriptedSite::new().listing(NVIDIA, 2, 4).listing(META, 3, 2));
    let scraper = ReviewScraper::new(site.clone(), fast_options());
    let options = RunOptions {
        workers: 2,
        max_pages: None,
        batch_size: 4,
    };

    let targets = companies.scrape_targets(&[]).await.unwrap();
    assert_eq!(targets.len(), 2);

    let (tx, mut rx) = mpsc::channel(16);
    let summary = scrape_companies(&scraper, &ctx, targets, &options, tx).await;

    assert_eq!(summary.sessions, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.reviews_inserted, 14);
    assert_eq!(summary.reviews_failed, 0);

    let mut finished = 0;
    while let Some(event) = rx.recv().await {
        if matches!(event, ScrapeEvent::Finished { .. }) {
            finished += 1;
        }
    }
    assert_eq!(finished, 2);
    assert_eq!(site.requests().len(), 5);

    assert_eq!(ctx.reviews().count_for_employer(NVIDIA).await.unwrap(), 8);
    assert_eq!(ctx.reviews().count_for_employer(META).await.unwrap(), 6);

    // a filtered rerun touches only the named employer
    let targets = companies.scrape_targets(&[META]).await.unwrap();
    assert_eq!(targets.len(), 1);
    let (tx, _rx) = mpsc::channel(16);
    let summary = scrape_companies(&scraper, &ctx, targets, &options, tx).await;
    assert_eq!(summary.reviews_inserted, 0);
    assert_eq!(summary.reviews_duplicate, 6);
}
