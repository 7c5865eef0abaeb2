//! Review list projection.
//!
//! One malformed review fails the whole page: a shape change in one entry
//! means none of the page's entries can be trusted.
// TODO: revisit whole-page abort once there is data on how often a single
// entry is malformed while its siblings are fine.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{coerce_bool, opt_f64, opt_i64, opt_string, required, ExtractError};
use crate::models::{ReviewNarrative, ReviewRecord};
use crate::scrapers::apollo::{
    value_as_i64, ApolloCache, CITY_PREFIX, JOB_TITLE_PREFIX, REF_FIELD, ROOT_QUERY,
};
use crate::scrapers::text::clean_text;

const JOB_TITLE_FIELD: &str = "text";
const LOCATION_FIELD: &str = "name";
const DATE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Display strings for `City:` and `JobTitle:` entities on the page.
struct Catalog<'a> {
    entries: HashMap<&'a str, &'a Map<String, Value>>,
}

impl<'a> Catalog<'a> {
    fn build(cache: &'a ApolloCache) -> Self {
        let entries = cache
            .entities_with_prefix(CITY_PREFIX)
            .chain(cache.entities_with_prefix(JOB_TITLE_PREFIX))
            .collect();
        Self { entries }
    }

    /// Swap a reference key for the entity's `field` when the catalog has it.
    fn display(&self, raw: Option<String>, field: &str) -> Option<String> {
        let raw = raw?;
        match self
            .entries
            .get(raw.as_str())
            .and_then(|node| node.get(field))
            .and_then(Value::as_str)
        {
            Some(text) => Some(text.to_string()),
            None => Some(raw),
        }
    }
}

/// Reviews on the page keyed by review id.
pub fn extract_reviews(cache: &ApolloCache) -> Result<BTreeMap<i64, ReviewRecord>, ExtractError> {
    let aggregate = cache
        .reviews_aggregate()
        .ok_or_else(|| ExtractError::MissingField(format!("{}.employerReviewsRG", ROOT_QUERY)))?;
    let entries = required(aggregate, "reviews")?
        .as_array()
        .ok_or_else(|| ExtractError::invalid("reviews", "expected a list"))?;

    let catalog = Catalog::build(cache);
    let employer_id = cache.employer_id();
    let mut reviews = BTreeMap::new();

    for entry in entries {
        let Some(node) = cache.resolve(entry).and_then(Value::as_object) else {
            warn!(entry = %entry, "skipping unresolvable review reference");
            continue;
        };
        let mut review = project_review(node, &catalog).inspect_err(|e| {
            let shown = Value::Object(node.clone());
            warn!(error = %e, review = %shown, "review has unexpected shape");
        })?;
        review.employer_id = employer_id;
        reviews.insert(review.review_id, review);
    }

    debug!(count = reviews.len(), "extracted reviews");
    Ok(reviews)
}

fn project_review(
    node: &Map<String, Value>,
    catalog: &Catalog<'_>,
) -> Result<ReviewRecord, ExtractError> {
    let review_id = value_as_i64(required(node, "reviewId")?)
        .ok_or_else(|| ExtractError::invalid("reviewId", "expected an integer"))?;
    let date_time = parse_review_date(required(node, "reviewDateTime")?)?;

    let text = |key: &str| -> Result<Option<String>, ExtractError> {
        Ok(clean_text(required(node, key)?.as_str()))
    };
    let narrative = ReviewNarrative {
        pros: text("pros")?,
        cons: text("cons")?,
        summary: text("summary")?,
        advice: text("advice")?,
    };

    let rating = |key: &str| -> Result<Option<f64>, ExtractError> {
        opt_f64(required(node, key)?, key)
    };
    let category = |key: &str| -> Result<Option<String>, ExtractError> {
        opt_string(required(node, key)?, key)
    };
    let count = |key: &str| -> Result<Option<i64>, ExtractError> {
        opt_i64(required(node, key)?, key)
    };

    let mut review = ReviewRecord::new(review_id, date_time, narrative);
    review.rating_overall = rating("ratingOverall")?;
    review.rating_ceo = category("ratingCeo")?;
    review.rating_business_outlook = category("ratingBusinessOutlook")?;
    review.rating_work_life_balance = rating("ratingWorkLifeBalance")?;
    review.rating_culture_and_values = rating("ratingCultureAndValues")?;
    review.rating_diversity_and_inclusion = rating("ratingDiversityAndInclusion")?;
    review.rating_senior_leadership = rating("ratingSeniorLeadership")?;
    review.rating_recommend_to_friend = category("ratingRecommendToFriend")?;
    review.rating_career_opportunities = rating("ratingCareerOpportunities")?;
    review.rating_compensation_and_benefits = rating("ratingCompensationAndBenefits")?;
    review.is_current_job = coerce_bool(required(node, "isCurrentJob")?, "isCurrentJob")?;
    review.length_of_employment = count("lengthOfEmployment")?;
    review.employment_status = category("employmentStatus")?;
    review.job_ending_year = match node.get("jobEndingYear") {
        Some(value) => opt_i64(value, "jobEndingYear")?,
        None => None,
    };
    review.job_title = catalog.display(
        reference_or_text(required(node, "jobTitle")?, "jobTitle", JOB_TITLE_FIELD)?,
        JOB_TITLE_FIELD,
    );
    review.location = catalog.display(
        reference_or_text(required(node, "location")?, "location", LOCATION_FIELD)?,
        LOCATION_FIELD,
    );
    review.count_helpful = count("countHelpful")?;
    review.count_not_helpful = count("countNotHelpful")?;
    review.is_covid19 = match node.get("isCovid19") {
        Some(value) => Some(coerce_bool(value, "isCovid19")?),
        None => None,
    };

    Ok(review)
}

/// `{inline_field: ..}` wins, then `{"__ref": ..}`; `null` is no value.
fn reference_or_text(
    value: &Value,
    key: &str,
    inline_field: &str,
) -> Result<Option<String>, ExtractError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Object(map) => Ok(map
            .get(inline_field)
            .or_else(|| map.get(REF_FIELD))
            .and_then(Value::as_str)
            .map(str::to_string)),
        other => Err(ExtractError::invalid(
            key,
            format!("expected an object, got {}", other),
        )),
    }
}

fn parse_review_date(value: &Value) -> Result<NaiveDateTime, ExtractError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ExtractError::invalid("reviewDateTime", "expected a string"))?
        .trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ExtractError::invalid("reviewDateTime", format!("{:?} is not a date", raw)))
}
