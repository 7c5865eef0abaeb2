//! Embedded Apollo state: locate, normalize, load.

mod cache;
mod load;
mod locate;
mod normalize;

pub use cache::{
    objects_with_prefix, ref_id, value_as_i64, ApolloCache, CEO_PREFIX, CITY_PREFIX, EMPLOYER_PREFIX,
    JOB_TITLE_PREFIX, REF_FIELD, REVIEWS_AGGREGATE_PREFIX, REVIEWS_AGGREGATE_TYPE, ROOT_QUERY,
    TYPENAME_FIELD,
};
pub use load::{from_value, load, LoadError};
pub use locate::{locate, EmbeddedState, LocateError};
pub use normalize::{normalize_keys, stable_key};

use tracing::debug;

/// Run locate, normalize, and load over one page of HTML.
pub fn parse_page(html: &str) -> Result<ApolloCache, StateError> {
    let state = locate(html)?.map_text(normalize_keys);
    debug!(shape = state.shape(), bytes = state.text().len(), "located embedded state");
    Ok(load(&state)?)
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_state_with_call_keys_parses() {
        let html = r#"<html><body><script>window.appCache={"apolloState":{"ROOT_QUERY":{"employerReviewsRG({"employerReviewsInput":{"page":{"num":1}}})":{"__typename":"EmployerReviewsRG","employer":{"__ref":"Employer:42"}}}}};</script></body></html>"#;
        let cache = parse_page(html).unwrap();
        assert!(cache.reviews_aggregate().is_some());
        assert_eq!(cache.employer_id(), Some(42));
    }
}
