//! End-to-end pagination over fixture listing pages.

mod common;

use std::sync::Arc;

use common::{fast_options, ids, listing_page, next_data_page, ScriptedSite, NVIDIA};
use gdreviews::scrapers::ReviewScraper;

const LISTING: &str = "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633.htm";

#[tokio::test]
async fn follows_declared_page_count() {
    let scraper = ReviewScraper::new(ScriptedSite::new().listing(NVIDIA, 3, 6), fast_options());

    let session = scraper.scrape(LISTING, None).await;

    assert_eq!(session.reviews.len(), 18);
    assert_eq!(session.pages_scraped, 3);
    assert_eq!(session.pages_failed, 0);

    let overview = session.overview.expect("overview from first page");
    assert_eq!(overview.employer_id, NVIDIA);
    assert_eq!(overview.employer_name.as_deref(), Some("NVIDIA"));
    assert_eq!(overview.ceo_name.as_deref(), Some("Jensen Huang"));
    assert_eq!(overview.number_of_pages, Some(3));
    assert_eq!(overview.overall_rating, Some(4.6));
}

#[tokio::test]
async fn reads_next_data_pages() {
    let site = ScriptedSite::new()
        .page(NVIDIA, 1, next_data_page(NVIDIA, 1, 2, &ids(1, 3)))
        .page(NVIDIA, 2, next_data_page(NVIDIA, 2, 2, &ids(4, 2)));
    let scraper = ReviewScraper::new(site, fast_options());

    let session = scraper.scrape(LISTING, None).await;

    assert_eq!(session.pages_scraped, 2);
    assert_eq!(session.pages_failed, 0);
    assert_eq!(session.reviews.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

    let overview = session.overview.expect("overview from first page");
    assert_eq!(overview.employer_id, NVIDIA);
    assert_eq!(overview.number_of_pages, Some(2));
    assert_eq!(overview.ceo_name.as_deref(), Some("Jensen Huang"));

    let review = &session.reviews[&4];
    assert_eq!(review.employer_id, Some(NVIDIA));
    assert_eq!(review.job_title.as_deref(), Some("Software Engineer"));
    assert_eq!(review.location.as_deref(), Some("Santa Clara, CA"));
}

#[tokio::test]
async fn requests_region_filtered_page_urls() {
    let site = Arc::new(ScriptedSite::new().listing(NVIDIA, 3, 2));
    let scraper = ReviewScraper::new(site.clone(), fast_options());

    let session = scraper.scrape(LISTING, None).await;
    assert_eq!(session.url, format!("{}?filter.countryId=1&filter.countryId=3", LISTING));

    assert_eq!(
        site.requests(),
        vec![
            "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633.htm?filter.countryId=1&filter.countryId=3",
            "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633_P2.htm?filter.countryId=1&filter.countryId=3",
            "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633_P3.htm?filter.countryId=1&filter.countryId=3",
        ]
    );
}

#[tokio::test]
async fn caller_cap_bounds_declared_pages() {
    let site = Arc::new(ScriptedSite::new().listing(NVIDIA, 5, 4));
    let scraper = ReviewScraper::new(site.clone(), fast_options());

    let session = scraper.scrape(LISTING, Some(2)).await;

    assert_eq!(session.pages_scraped, 2);
    assert_eq!(session.reviews.len(), 8);
    assert_eq!(site.requests().len(), 2);
}

#[tokio::test]
async fn failed_page_does_not_stop_the_session() {
    let site = ScriptedSite::new().listing(NVIDIA, 3, 6).without_page(NVIDIA, 2);
    let scraper = ReviewScraper::new(site, fast_options());

    let session = scraper.scrape(LISTING, None).await;

    assert_eq!(session.pages_scraped, 2);
    assert_eq!(session.pages_failed, 1);
    assert_eq!(session.reviews.len(), 12);
    assert!(session.overview.is_some());
}

#[tokio::test]
async fn page_without_state_counts_as_failed() {
    let site = ScriptedSite::new()
        .listing(NVIDIA, 2, 3)
        .page(NVIDIA, 2, "<html><body><p>Access denied</p></body></html>".to_string());
    let scraper = ReviewScraper::new(site, fast_options());

    let session = scraper.scrape(LISTING, None).await;

    assert_eq!(session.pages_failed, 1);
    assert_eq!(session.reviews.len(), 3);
}

#[tokio::test]
async fn repeated_reviews_are_merged_by_id() {
    let site = ScriptedSite::new()
        .page(NVIDIA, 1, listing_page(NVIDIA, 1, 2, &ids(1, 5)))
        .page(NVIDIA, 2, listing_page(NVIDIA, 2, 2, &ids(4, 5)));
    let scraper = ReviewScraper::new(site, fast_options());

    let session = scraper.scrape(LISTING, None).await;

    assert_eq!(session.reviews.len(), 8);
    assert_eq!(session.reviews.keys().copied().collect::<Vec<_>>(), ids(1, 8));
}

#[tokio::test]
async fn extracted_reviews_resolve_references() {
    let site = ScriptedSite::new().page(NVIDIA, 1, listing_page(NVIDIA, 1, 1, &[501]));
    let scraper = ReviewScraper::new(site, fast_options());

    let session = scraper.scrape(LISTING, None).await;
    let review = &session.reviews[&501];

    assert_eq!(review.employer_id, Some(NVIDIA));
    assert_eq!(review.job_title.as_deref(), Some("Software Engineer"));
    assert_eq!(review.location.as_deref(), Some("Santa Clara, CA"));
    assert_eq!(review.rating_overall, Some(4.0));
    assert_eq!(review.rating_ceo.as_deref(), Some("APPROVE"));
    assert_eq!(review.is_covid19, Some(false));
    assert!(review.review_text().contains("review number 501"));
    assert_eq!(
        review.date_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        "2024-03-01 10:15:30.250"
    );
}

#[tokio::test]
async fn nothing_scraped_means_no_overview() {
    let scraper = ReviewScraper::new(ScriptedSite::new(), fast_options());

    let session = scraper.scrape(LISTING, Some(3)).await;

    assert!(session.is_empty());
    assert!(session.overview.is_none());
    assert_eq!(session.pages_failed, 3);
}

#[tokio::test]
async fn two_uneven_pages_merge() {
    let site = ScriptedSite::new()
        .page(NVIDIA, 1, listing_page(NVIDIA, 1, 2, &ids(100, 10)))
        .page(NVIDIA, 2, listing_page(NVIDIA, 2, 2, &ids(200, 8)));
    let scraper = ReviewScraper::new(site, fast_options());

    let session = scraper.scrape(LISTING, None).await;

    assert_eq!(session.reviews.len(), 18);
    assert_eq!(session.overview.map(|o| o.employer_id), Some(NVIDIA));
}
