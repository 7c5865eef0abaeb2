//! Read access to a loaded Apollo cache.
//!
//! The cache is a flat map of entity keys (`Employer:7633`, `City:1139977`,
//! `ROOT_QUERY`, ...) to objects. Objects point at each other with
//! `{"__ref": "<key>"}` markers; a marker whose key is missing resolves to
//! nothing rather than an error.

use serde_json::{Map, Value};

pub const ROOT_QUERY: &str = "ROOT_QUERY";
pub const REF_FIELD: &str = "__ref";
pub const TYPENAME_FIELD: &str = "__typename";
pub const REVIEWS_AGGREGATE_PREFIX: &str = "employerReviewsRG";
pub const REVIEWS_AGGREGATE_TYPE: &str = "EmployerReviewsRG";
pub const EMPLOYER_PREFIX: &str = "Employer:";
pub const CEO_PREFIX: &str = "Ceo:";
pub const CITY_PREFIX: &str = "City";
pub const JOB_TITLE_PREFIX: &str = "JobTitle";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApolloCache {
    entities: Map<String, Value>,
}

impl ApolloCache {
    pub fn new(entities: Map<String, Value>) -> Self {
        Self { entities }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entities.get(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn root_query(&self) -> Option<&Map<String, Value>> {
        self.get(ROOT_QUERY).and_then(Value::as_object)
    }

    /// Top-level object entities whose key starts with `prefix`, in page order.
    pub fn entities_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Map<String, Value>)> + 'a {
        objects_with_prefix(&self.entities, prefix)
    }

    /// Follow a reference marker. Inline objects and scalars resolve to
    /// themselves; `null` and dangling markers resolve to `None`.
    pub fn resolve<'a>(&'a self, value: &'a Value) -> Option<&'a Value> {
        match value {
            Value::Null => None,
            Value::Object(map) => match map.get(REF_FIELD).and_then(Value::as_str) {
                Some(key) => self.get(key),
                None => Some(value),
            },
            other => Some(other),
        }
    }

    /// The reviews aggregate under the root query.
    pub fn reviews_aggregate(&self) -> Option<&Map<String, Value>> {
        let root = self.root_query()?;
        root.iter()
            .filter(|(key, _)| key.starts_with(REVIEWS_AGGREGATE_PREFIX))
            .filter_map(|(_, value)| self.resolve(value)?.as_object())
            .find(|node| {
                node.get(TYPENAME_FIELD).and_then(Value::as_str) == Some(REVIEWS_AGGREGATE_TYPE)
            })
    }

    /// First `Employer:` entity.
    pub fn employer(&self) -> Option<&Map<String, Value>> {
        self.entities_with_prefix(EMPLOYER_PREFIX)
            .map(|(_, node)| node)
            .next()
    }

    /// Employer id, from the first of:
    /// 1. the `id` of a top-level `Employer:` entity,
    /// 2. the `employerid` reference on the root query,
    /// 3. the `employer` reference on the reviews aggregate.
    pub fn employer_id(&self) -> Option<i64> {
        self.employer()
            .and_then(|node| node.get("id"))
            .and_then(value_as_i64)
            .or_else(|| {
                self.root_query()
                    .and_then(|root| root.get("employerid"))
                    .and_then(ref_id)
            })
            .or_else(|| {
                self.reviews_aggregate()
                    .and_then(|aggregate| aggregate.get("employer"))
                    .and_then(ref_id)
            })
    }
}

/// Object entries of `map` whose key starts with `prefix`.
pub fn objects_with_prefix<'a>(
    map: &'a Map<String, Value>,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a str, &'a Map<String, Value>)> + 'a {
    map.iter()
        .filter(move |(key, _)| key.starts_with(prefix))
        .filter_map(|(key, value)| value.as_object().map(|node| (key.as_str(), node)))
}

/// Integer from a JSON number or numeric string.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric suffix after the last colon of a reference marker.
pub fn ref_id(value: &Value) -> Option<i64> {
    value
        .get(REF_FIELD)
        .and_then(Value::as_str)
        .and_then(|key| key.rsplit(':').next())
        .and_then(|id| id.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache(value: Value) -> ApolloCache {
        match value {
            Value::Object(map) => ApolloCache::new(map),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn resolve_follows_refs_and_tolerates_dangling_ones() {
        let cache = cache(json!({
            "City:1": {"name": "Santa Clara"}
        }));
        let live = json!({"__ref": "City:1"});
        let dangling = json!({"__ref": "City:2"});
        let inline = json!({"text": "Engineer"});

        assert_eq!(cache.resolve(&live).unwrap()["name"], "Santa Clara");
        assert!(cache.resolve(&dangling).is_none());
        assert_eq!(cache.resolve(&inline), Some(&inline));
        assert!(cache.resolve(&Value::Null).is_none());
    }

    #[test]
    fn employer_id_prefers_employer_entity() {
        let cache = cache(json!({
            "Employer:123": {"__typename": "Employer", "id": 123},
            "ROOT_QUERY": {"employerid": {"__ref": "Employer:999"}}
        }));
        assert_eq!(cache.employer_id(), Some(123));
    }

    #[test]
    fn employer_id_falls_back_to_root_reference() {
        let cache = cache(json!({
            "ROOT_QUERY": {"employerid": {"__ref": "Employer:456"}}
        }));
        assert_eq!(cache.employer_id(), Some(456));
    }

    #[test]
    fn employer_id_falls_back_to_aggregate_reference() {
        let cache = cache(json!({
            "ROOT_QUERY": {
                "employerReviewsRGid": {
                    "__typename": "EmployerReviewsRG",
                    "employer": {"__ref": "Employer:789"}
                }
            }
        }));
        assert_eq!(cache.employer_id(), Some(789));
    }

    #[test]
    fn employer_id_accepts_string_ids() {
        let cache = cache(json!({"Employer:5": {"id": "5"}}));
        assert_eq!(cache.employer_id(), Some(5));
    }

    #[test]
    fn aggregate_requires_type_tag() {
        let cache = cache(json!({
            "ROOT_QUERY": {
                "employerReviewsRGid": {"__typename": "Something"}
            }
        }));
        assert!(cache.reviews_aggregate().is_none());
        assert_eq!(cache.employer_id(), None);
    }
}
