//! Listing-page fixtures and a scripted fetcher shared by integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use gdreviews::scrapers::urls::{extract_employer_id, Region};
use gdreviews::scrapers::{FetchError, PageFetcher, ScrapeOptions};

static PAGE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_P(\d+)\.htm").unwrap());

pub const NVIDIA: i64 = 7633;
pub const META: i64 = 40772;

pub fn employer_name(employer_id: i64) -> &'static str {
    match employer_id {
        NVIDIA => "NVIDIA",
        META => "Meta",
        _ => "Acme",
    }
}

/// Options with no pause between pages.
pub fn fast_options() -> ScrapeOptions {
    ScrapeOptions {
        page_delay: Duration::ZERO,
        region_filter: Region::defaults(),
        ..Default::default()
    }
}

pub fn review(review_id: i64) -> Value {
    json!({
        "__typename": "EmployerReviewRG",
        "reviewId": review_id,
        "reviewDateTime": "2024-03-01T10:15:30.250",
        "pros": "Great pay, smart people",
        "cons": "Long hours",
        "summary": format!("Review number {}", review_id),
        "advice": null,
        "ratingOverall": 4,
        "ratingCeo": "APPROVE",
        "ratingBusinessOutlook": "POSITIVE",
        "ratingWorkLifeBalance": 3.0,
        "ratingCultureAndValues": 4.0,
        "ratingDiversityAndInclusion": 5.0,
        "ratingSeniorLeadership": 3.5,
        "ratingRecommendToFriend": "POSITIVE",
        "ratingCareerOpportunities": 4.0,
        "ratingCompensationAndBenefits": 5.0,
        "isCurrentJob": true,
        "lengthOfEmployment": 3,
        "employmentStatus": "REGULAR",
        "jobEndingYear": null,
        "jobTitle": {"__ref": "JobTitle:42"},
        "location": {"__ref": "City:1147401"},
        "countHelpful": 2,
        "countNotHelpful": 0,
        "isCovid19": false
    })
}

/// Apollo state of one listing page, with the reviews aggregate stored
/// under a GraphQL call key.
pub fn listing_state(employer_id: i64, page: u32, number_of_pages: u32, review_ids: &[i64]) -> String {
    let aggregate = json!({
        "__typename": "EmployerReviewsRG",
        "numberOfPages": number_of_pages,
        "allReviewsCount": number_of_pages * 10,
        "ratedReviewsCount": number_of_pages * 9,
        "ratings": {
            "overallRating": 4.6,
            "ceoRating": 0.97,
            "recommendToFriendRating": 0.93,
            "cultureAndValuesRating": 4.5,
            "diversityAndInclusionRating": 4.4,
            "careerOpportunitiesRating": 4.3,
            "workLifeBalanceRating": 4.0,
            "seniorManagementRating": 4.1,
            "compensationAndBenefitsRating": 4.7,
            "businessOutlookRating": 0.88,
            "ratedCeo": {"__ref": "Ceo:9001"}
        },
        "employer": {"__ref": format!("Employer:{}", employer_id)},
        "reviews": review_ids.iter().map(|id| review(*id)).collect::<Vec<_>>()
    });
    let employer = json!({"__typename": "Employer", "id": employer_id, "shortName": employer_name(employer_id)});
    let ceo = json!({"__typename": "Ceo", "name": "Jensen Huang"});
    let job_title = json!({"__typename": "JobTitle", "text": "Software Engineer"});
    let city = json!({"__typename": "City", "name": "Santa Clara, CA"});

    format!(
        r#"{{"ROOT_QUERY":{{"__typename":"Query","employerReviewsRG({{"employerReviewsInput":{{"employer":{{"id":{id}}},"page":{{"num":{page}}}}}}})":{aggregate}}},"Employer:{id}":{employer},"Ceo:9001":{ceo},"JobTitle:42":{job_title},"City:1147401":{city}}}"#,
        id = employer_id,
    )
}

/// One listing page in the inline `apolloState` embedding.
pub fn listing_page(employer_id: i64, page: u32, number_of_pages: u32, review_ids: &[i64]) -> String {
    format!(
        "<html><head><title>Reviews</title></head><body><div id=\"app\"></div><script>window.appCache={{\"apolloState\":{}}};</script></body></html>",
        listing_state(employer_id, page, number_of_pages, review_ids)
    )
}

/// One listing page with the state under `props.pageProps.apolloCache` of
/// a `__NEXT_DATA__` script.
pub fn next_data_page(employer_id: i64, page: u32, number_of_pages: u32, review_ids: &[i64]) -> String {
    format!(
        "<html><head><title>Reviews</title></head><body><div id=\"__next\"></div><script id=\"__NEXT_DATA__\" type=\"application/json\">{{\"props\":{{\"pageProps\":{{\"apolloCache\":{}}}}},\"page\":\"/Reviews\"}}</script></body></html>",
        listing_state(employer_id, page, number_of_pages, review_ids)
    )
}

/// A listing page whose aggregate lacks `numberOfPages`, so no overview
/// can be read from it. The reviews are intact.
pub fn page_without_overview(employer_id: i64, review_ids: &[i64]) -> String {
    listing_page(employer_id, 1, 1, review_ids).replace("\"numberOfPages\"", "\"pageCount\"")
}

/// Review ids `first..first + count`.
pub fn ids(first: i64, count: i64) -> Vec<i64> {
    (first..first + count).collect()
}

/// Serves canned pages keyed by employer id and page number and records
/// every requested URL. Unknown pages fail.
#[derive(Default)]
pub struct ScriptedSite {
    pages: HashMap<(i64, u32), String>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, employer_id: i64, page: u32, html: String) -> Self {
        self.pages.insert((employer_id, page), html);
        self
    }

    /// A listing of `number_of_pages` pages with `per_page` reviews each.
    pub fn listing(mut self, employer_id: i64, number_of_pages: u32, per_page: i64) -> Self {
        for page in 1..=number_of_pages {
            let first = employer_id * 1000 + (page as i64 - 1) * per_page + 1;
            let html = listing_page(employer_id, page, number_of_pages, &ids(first, per_page));
            self.pages.insert((employer_id, page), html);
        }
        self
    }

    pub fn without_page(mut self, employer_id: i64, page: u32) -> Self {
        self.pages.remove(&(employer_id, page));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedSite {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        let page = PAGE_NUMBER
            .captures(url)
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or(1);
        let employer_id = extract_employer_id(url).unwrap_or_default();
        self.pages
            .get(&(employer_id, page))
            .cloned()
            .ok_or_else(|| FetchError::Fatal(format!("no fixture for {}", url)))
    }
}
