//! Rewrite GraphQL call-expression keys into stable field keys.
//!
//! Apollo stores root fields under keys such as
//! `"employerReviewsRG({\"employerReviewsInput\":{...}})"`, which embed
//! unescaped quotes and so break JSON parsing. Every such key is replaced,
//! textually and before parsing, by a compact key derived from its field
//! name (`"employerReviewsRGid"`).

use std::collections::HashSet;
use std::sync::LazyLock;

use graphql_parser::query::parse_query;
use regex::Regex;
use tracing::{debug, warn};

static CALL_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*\(\{[^)]*\}\)""#).unwrap());

/// Field name of a raw call key: the text between the opening quote and `(`.
fn field_name(raw_key: &str) -> &str {
    let inner = raw_key.strip_prefix('"').unwrap_or(raw_key);
    inner.split('(').next().unwrap_or(inner).trim()
}

/// Canonical compact key for a field.
///
/// `query { <field> { id } }` is parsed and re-rendered, then the operation
/// keyword, braces, and whitespace are dropped.
pub fn stable_key(field: &str) -> String {
    let query = format!("query {{ {} {{ id }} }}", field);
    match parse_query::<String>(&query) {
        Ok(document) => {
            let rendered = document.to_string();
            let body = rendered.trim_start();
            let body = body.strip_prefix("query").unwrap_or(body);
            body.chars()
                .filter(|c| !c.is_whitespace() && *c != '{' && *c != '}')
                .collect()
        }
        Err(e) => {
            warn!(field, error = %e, "field is not a GraphQL name, compacting it");
            let mut key: String = field.chars().filter(|c| c.is_alphanumeric()).collect();
            key.push_str("id");
            key
        }
    }
}

/// Replace every call-expression key in `text` with its quoted stable key.
pub fn normalize_keys(text: &str) -> String {
    let mut seen = HashSet::new();
    let raw_keys: Vec<&str> = CALL_KEY
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|raw| seen.insert(*raw))
        .collect();

    let mut normalized = text.to_string();
    for raw in raw_keys {
        let key = stable_key(field_name(raw));
        debug!(raw, %key, "normalized GraphQL key");
        normalized = normalized.replace(raw, &format!("\"{}\"", key));
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn stable_key_drops_punctuation_and_whitespace() {
        assert_eq!(stable_key("employerReviewsRG"), "employerReviewsRGid");
        assert_eq!(stable_key("field"), "fieldid");
    }

    #[test]
    fn stable_key_only_strips_the_leading_keyword() {
        assert_eq!(stable_key("queryLimits"), "queryLimitsid");
    }

    #[test]
    fn invalid_graphql_name_falls_back_to_compaction() {
        assert_eq!(stable_key("bad-name.x"), "badnamexid");
    }

    #[test]
    fn call_key_becomes_plain_field_key() {
        let normalized = normalize_keys(r#"{"field({"a":1})": {"id": 7}}"#);
        assert_eq!(normalized, r#"{"fieldid": {"id": 7}}"#);

        let parsed: Value = serde_json::from_str(&normalized).unwrap();
        assert_eq!(parsed["fieldid"]["id"], 7);
    }

    #[test]
    fn repeated_and_distinct_keys_are_all_rewritten() {
        let text = r#"{"ROOT_QUERY":{"employerReviewsRG({"page":1})":{"n":1},"employerReviewsRG({"page":2})":{"n":2},"reviews({"x":true})":[]},"other":"employerReviewsRG({"page":1})"}"#;
        let normalized = normalize_keys(text);
        assert!(!normalized.contains('('));
        assert_eq!(normalized.matches("\"employerReviewsRGid\"").count(), 3);
        assert!(normalized.contains("\"reviewsid\":[]"));
    }

    #[test]
    fn text_without_call_keys_is_untouched() {
        let text = r#"{"Employer:1":{"id":1,"note":"a (b) c"}}"#;
        assert_eq!(normalize_keys(text), text);
    }
}
