//! Employer overview projection.

use serde_json::{Map, Value};
use tracing::error;

use super::{object, opt_f64, opt_i64, required, ExtractError};
use crate::models::OverviewRecord;
use crate::scrapers::apollo::{objects_with_prefix, ApolloCache, CEO_PREFIX, ROOT_QUERY};

/// Overview for the page, or `None` when any expected key is missing.
pub fn extract_overview(cache: &ApolloCache) -> Option<OverviewRecord> {
    match try_extract_overview(cache) {
        Ok(overview) => Some(overview),
        Err(e) => {
            error!(error = %e, "could not extract employer overview");
            None
        }
    }
}

pub fn try_extract_overview(cache: &ApolloCache) -> Result<OverviewRecord, ExtractError> {
    let aggregate = cache
        .reviews_aggregate()
        .ok_or_else(|| ExtractError::MissingField(format!("{}.employerReviewsRG", ROOT_QUERY)))?;
    let employer_id = cache
        .employer_id()
        .ok_or_else(|| ExtractError::MissingField("employer_id".to_string()))?;

    let ratings = object(aggregate, "ratings")?;
    let rating = |key: &str| -> Result<Option<f64>, ExtractError> {
        opt_f64(required(ratings, key)?, key)
    };

    Ok(OverviewRecord {
        employer_id,
        employer_name: employer_name(cache),
        number_of_pages: opt_i64(required(aggregate, "numberOfPages")?, "numberOfPages")?,
        all_reviews_count: opt_i64(required(aggregate, "allReviewsCount")?, "allReviewsCount")?,
        rated_reviews_count: opt_i64(
            required(aggregate, "ratedReviewsCount")?,
            "ratedReviewsCount",
        )?,
        overall_rating: rating("overallRating")?,
        ceo_name: ceo_name(cache, ratings),
        ceo_rating: rating("ceoRating")?,
        recommend_to_friend_rating: rating("recommendToFriendRating")?,
        culture_and_values_rating: rating("cultureAndValuesRating")?,
        diversity_and_inclusion_rating: rating("diversityAndInclusionRating")?,
        career_opportunities_rating: rating("careerOpportunitiesRating")?,
        work_life_balance_rating: rating("workLifeBalanceRating")?,
        senior_management_rating: rating("seniorManagementRating")?,
        compensation_and_benefits_rating: rating("compensationAndBenefitsRating")?,
        business_outlook_rating: rating("businessOutlookRating")?,
    })
}

fn employer_name(cache: &ApolloCache) -> Option<String> {
    let employer = cache.employer()?;
    ["shortName", "name"]
        .iter()
        .find_map(|key| employer.get(*key).and_then(Value::as_str))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// `Ceo:` entity under the root query, then anywhere in the cache, then the
/// `ratedCeo` attached to the ratings.
fn ceo_name(cache: &ApolloCache, ratings: &Map<String, Value>) -> Option<String> {
    let named = |node: &Map<String, Value>| {
        node.get("name")
            .and_then(Value::as_str)
            .map(|name| name.trim().to_string())
    };

    cache
        .root_query()
        .and_then(|root| objects_with_prefix(root, CEO_PREFIX).find_map(|(_, node)| named(node)))
        .or_else(|| {
            cache
                .entities_with_prefix(CEO_PREFIX)
                .find_map(|(_, node)| named(node))
        })
        .or_else(|| {
            ratings
                .get("ratedCeo")
                .and_then(|value| cache.resolve(value))
                .and_then(Value::as_object)
                .and_then(named)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::apollo::from_value;
    use serde_json::json;

    fn ratings() -> Value {
        json!({
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
            "ratedCeo": {"__ref": "Ceo:1"}
        })
    }

    fn aggregate() -> Value {
        json!({
            "__typename": "EmployerReviewsRG",
            "numberOfPages": 120,
            "allReviewsCount": 1200,
            "ratedReviewsCount": 1100,
            "ratings": ratings()
        })
    }

    #[test]
    fn employer_entity_supplies_id_when_employerid_is_absent() {
        let cache = from_value(json!({
            "Employer:123": {"__typename": "Employer", "id": 123, "shortName": "Acme"},
            "ROOT_QUERY": {"employerReviewsRGid": aggregate()}
        }))
        .unwrap();

        let overview = extract_overview(&cache).unwrap();
        assert_eq!(overview.employer_id, 123);
        assert_eq!(overview.employer_name.as_deref(), Some("Acme"));
        assert_eq!(overview.number_of_pages, Some(120));
        assert_eq!(overview.overall_rating, Some(4.6));
        assert_eq!(overview.business_outlook_rating, Some(0.88));
    }

    #[test]
    fn ceo_prefers_root_query_then_cache_then_ratings() {
        let cache = from_value(json!({
            "Employer:1": {"id": 1},
            "Ceo:1": {"name": " Cache Ceo "},
            "ROOT_QUERY": {
                "Ceo:2": {"name": "  Root Ceo  "},
                "employerReviewsRGid": aggregate()
            }
        }))
        .unwrap();
        assert_eq!(
            extract_overview(&cache).unwrap().ceo_name.as_deref(),
            Some("Root Ceo")
        );

        let cache = from_value(json!({
            "Employer:1": {"id": 1},
            "Ceo:1": {"name": " Cache Ceo "},
            "ROOT_QUERY": {"employerReviewsRGid": aggregate()}
        }))
        .unwrap();
        assert_eq!(
            extract_overview(&cache).unwrap().ceo_name.as_deref(),
            Some("Cache Ceo")
        );

        let mut inline = aggregate();
        inline["ratings"]["ratedCeo"] = json!({"name": "Inline Ceo"});
        let cache = from_value(json!({
            "Employer:1": {"id": 1},
            "ROOT_QUERY": {"employerReviewsRGid": inline}
        }))
        .unwrap();
        assert_eq!(
            extract_overview(&cache).unwrap().ceo_name.as_deref(),
            Some("Inline Ceo")
        );
    }

    #[test]
    fn null_values_are_allowed_but_missing_keys_are_not() {
        let mut partial = aggregate();
        partial["ratings"]["ceoRating"] = Value::Null;
        let cache = from_value(json!({
            "Employer:1": {"id": 1},
            "ROOT_QUERY": {"employerReviewsRGid": partial}
        }))
        .unwrap();
        assert_eq!(extract_overview(&cache).unwrap().ceo_rating, None);

        let mut missing = aggregate();
        missing["ratings"]
            .as_object_mut()
            .unwrap()
            .remove("workLifeBalanceRating");
        let cache = from_value(json!({
            "Employer:1": {"id": 1},
            "ROOT_QUERY": {"employerReviewsRGid": missing}
        }))
        .unwrap();
        assert_eq!(
            try_extract_overview(&cache),
            Err(ExtractError::MissingField(
                "workLifeBalanceRating".to_string()
            ))
        );
        assert!(extract_overview(&cache).is_none());
    }

    #[test]
    fn unresolvable_employer_id_fails() {
        let cache = from_value(json!({
            "ROOT_QUERY": {"employerReviewsRGid": aggregate()}
        }))
        .unwrap();
        assert_eq!(
            try_extract_overview(&cache),
            Err(ExtractError::MissingField("employer_id".to_string()))
        );
    }
}
