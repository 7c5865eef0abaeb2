//! Review and overview URL construction.
//!
//! The site tolerates any employer slug as long as the numeric id is right,
//! so slugs are derived by replacing spaces with dashes.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BASE_URL: &str = "https://www.glassdoor.com";

/// Query parameter used to scope listings to a region.
pub const REGION_PARAM: &str = "filter.countryId";

static PAGE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:_P\d+)+$").unwrap());
static EMPLOYER_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-E(\d+)").unwrap());
static OVERVIEW_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-EI_IE(\d+)\.").unwrap());
static OVERVIEW_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Working-at-([\w%-]+)-E").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("URL has no .htm page segment: {0}")]
    NoExtension(String),
    #[error("changing the page left the URL unchanged: {0}")]
    PageUnchanged(String),
}

/// Region ids understood by the review listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Region {
    UnitedStates,
    UnitedKingdom,
    CanadaEnglish,
    India,
    Australia,
    France,
    Germany,
    Spain,
    Brazil,
    Netherlands,
    Austria,
    Mexico,
    Argentina,
    BelgiumNederlands,
    BelgiumFrench,
    SwitzerlandGerman,
    SwitzerlandFrench,
    Ireland,
    CanadaFrench,
    HongKong,
    NewZealand,
    Singapore,
    Italy,
}

impl Region {
    const ALL: [Region; 23] = [
        Region::UnitedStates,
        Region::UnitedKingdom,
        Region::CanadaEnglish,
        Region::India,
        Region::Australia,
        Region::France,
        Region::Germany,
        Region::Spain,
        Region::Brazil,
        Region::Netherlands,
        Region::Austria,
        Region::Mexico,
        Region::Argentina,
        Region::BelgiumNederlands,
        Region::BelgiumFrench,
        Region::SwitzerlandGerman,
        Region::SwitzerlandFrench,
        Region::Ireland,
        Region::CanadaFrench,
        Region::HongKong,
        Region::NewZealand,
        Region::Singapore,
        Region::Italy,
    ];

    pub fn id(self) -> u32 {
        Self::ALL
            .iter()
            .position(|r| *r == self)
            .map(|i| i as u32 + 1)
            .unwrap_or(0)
    }

    /// Regions applied when a listing URL carries no region filter.
    pub fn defaults() -> Vec<Region> {
        vec![Region::UnitedStates, Region::CanadaEnglish]
    }
}

impl TryFrom<u32> for Region {
    type Error = String;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        id.checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize).copied())
            .ok_or_else(|| format!("unknown region id {}", id))
    }
}

impl From<Region> for u32 {
    fn from(region: Region) -> u32 {
        region.id()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

fn slug(employer: &str) -> String {
    employer.trim().replace(' ', "-")
}

fn region_query(regions: &[Region]) -> String {
    regions
        .iter()
        .map(|r| format!("{}={}", REGION_PARAM, r.id()))
        .collect::<Vec<_>>()
        .join("&")
}

/// Review listing URL for an employer.
pub fn reviews_url(employer: &str, employer_id: i64, regions: &[Region]) -> String {
    let url = format!(
        "{}/Reviews/{}-Reviews-E{}.htm",
        BASE_URL,
        slug(employer),
        employer_id
    );
    if regions.is_empty() {
        url
    } else {
        format!("{}?{}", url, region_query(regions))
    }
}

/// Overview URL for an employer.
///
/// The `.start,end` suffix is the character slice of the path segment
/// holding the employer slug.
pub fn overview_url(employer: &str, employer_id: i64, region: Option<Region>) -> String {
    const PREFIX: &str = "Working-at-";
    let slug = slug(employer);
    let start = PREFIX.chars().count();
    let end = start + slug.chars().count();
    let url = format!(
        "{}/Overview/{}{}-EI_IE{}.{},{}.htm",
        BASE_URL, PREFIX, slug, employer_id, start, end
    );
    match region {
        Some(region) => format!("{}?{}={}", url, REGION_PARAM, region.id()),
        None => url,
    }
}

/// Add region filters to a listing URL unless it already has some.
pub fn with_default_regions(url: &str, regions: &[Region]) -> String {
    if url.contains(REGION_PARAM) || regions.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, region_query(regions))
}

/// Point a listing URL at page `page`.
///
/// `Foo-Reviews-E1.htm` becomes `Foo-Reviews-E1_P2.htm`; an existing
/// `_P<k>` suffix is replaced. The query string is preserved.
pub fn change_page(url: &str, page: u32) -> Result<String, UrlError> {
    let (path, query) = match url.find('?') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    };
    let stem = path
        .strip_suffix(".htm")
        .ok_or_else(|| UrlError::NoExtension(url.to_string()))?;
    let stem = PAGE_SUFFIX.replace(stem, "");
    let changed = format!("{}_P{}.htm{}", stem, page, query);

    if changed == url {
        return Err(UrlError::PageUnchanged(url.to_string()));
    }
    Ok(changed)
}

/// Turn an old overview URL into a review listing URL.
///
/// Listing URLs pass through untouched; anything unrecognized yields `None`.
pub fn transform_url(url: &str) -> Option<String> {
    if url.contains("/Reviews/") {
        return Some(url.to_string());
    }
    let id = OVERVIEW_ID.captures(url)?.get(1)?.as_str();
    let name = OVERVIEW_NAME.captures(url)?.get(1)?.as_str();
    Some(format!("{}/Reviews/{}-Reviews-E{}.htm", BASE_URL, name, id))
}

/// Employer id embedded in a listing URL (`-E<digits>`).
pub fn extract_employer_id(url: &str) -> Option<i64> {
    EMPLOYER_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NVIDIA: &str = "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633.htm";

    #[test]
    fn reviews_url_with_regions() {
        assert_eq!(
            reviews_url("NVIDIA", 7633, &Region::defaults()),
            "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633.htm?filter.countryId=1&filter.countryId=3"
        );
        assert_eq!(
            reviews_url("Bank of America", 8874, &[]),
            "https://www.glassdoor.com/Reviews/Bank-of-America-Reviews-E8874.htm"
        );
    }

    #[test]
    fn overview_url_slices_employer_name() {
        assert_eq!(
            overview_url("NVIDIA", 7633, None),
            "https://www.glassdoor.com/Overview/Working-at-NVIDIA-EI_IE7633.11,17.htm"
        );
        assert_eq!(
            overview_url("NVIDIA", 7633, Some(Region::Germany)),
            "https://www.glassdoor.com/Overview/Working-at-NVIDIA-EI_IE7633.11,17.htm?filter.countryId=7"
        );
    }

    #[test]
    fn change_page_appends_suffix() {
        assert_eq!(
            change_page(NVIDIA, 2).unwrap(),
            "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633_P2.htm"
        );
    }

    #[test]
    fn change_page_replaces_existing_suffix_and_keeps_query() {
        let url = "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633_P2.htm?filter.countryId=1";
        assert_eq!(
            change_page(url, 5).unwrap(),
            "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633_P5.htm?filter.countryId=1"
        );
    }

    #[test]
    fn change_page_never_returns_input() {
        let url = "https://www.glassdoor.com/Reviews/NVIDIA-Reviews-E7633_P3.htm";
        assert_eq!(
            change_page(url, 3),
            Err(UrlError::PageUnchanged(url.to_string()))
        );
        for page in 1..6 {
            assert_ne!(change_page(NVIDIA, page).unwrap(), NVIDIA);
        }
    }

    #[test]
    fn change_page_requires_htm() {
        assert!(matches!(
            change_page("https://www.glassdoor.com/Reviews/", 2),
            Err(UrlError::NoExtension(_))
        ));
    }

    #[test]
    fn default_regions_only_when_absent() {
        let with = with_default_regions(NVIDIA, &Region::defaults());
        assert!(with.ends_with("?filter.countryId=1&filter.countryId=3"));
        assert_eq!(with_default_regions(&with, &Region::defaults()), with);

        let other = format!("{}?sort.sortType=RD", NVIDIA);
        assert!(with_default_regions(&other, &[Region::Italy]).ends_with("&filter.countryId=23"));
    }

    #[test]
    fn transform_overview_url() {
        assert_eq!(
            transform_url(
                "https://www.glassdoor.com/Overview/Working-at-NVIDIA-EI_IE7633.11,17.htm"
            )
            .as_deref(),
            Some(NVIDIA)
        );
        assert_eq!(transform_url(NVIDIA).as_deref(), Some(NVIDIA));
        assert_eq!(transform_url("https://example.com/nothing"), None);
    }

    #[test]
    fn extract_id_from_listing() {
        assert_eq!(extract_employer_id(NVIDIA), Some(7633));
        assert_eq!(extract_employer_id("https://example.com"), None);
    }

    #[test]
    fn region_ids_round_trip() {
        assert_eq!(Region::UnitedStates.id(), 1);
        assert_eq!(Region::Italy.id(), 23);
        assert_eq!(Region::try_from(3), Ok(Region::CanadaEnglish));
        assert!(Region::try_from(0).is_err());
        assert!(Region::try_from(24).is_err());
    }
}
