//! Tracked employer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::OverviewRecord;

/// An employer row, as imported and as enriched by scraping.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Company {
    pub id: i32,
    pub employer_id: Option<i64>,
    pub employer_name: String,
    pub gvkey: Option<i64>,
    pub is_gvkey: bool,
    pub id_not_found: bool,
    pub url_old: Option<String>,
    pub url_new: Option<String>,
    pub ticker: Option<String>,
    pub query: Option<String>,
    pub overview: Option<OverviewRecord>,
    pub last_scraped: Option<DateTime<Utc>>,
}

impl Company {
    /// URL a scrape session should start from, preferring the canonical one.
    pub fn review_url(&self) -> Option<&str> {
        self.url_new.as_deref().or(self.url_old.as_deref())
    }
}

/// Result of resolving a company name through the site's typeahead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyMatch {
    pub employer_id: i64,
    pub suggestion: String,
}
