//! Parse normalized state text into an [`ApolloCache`].

use serde_json::Value;
use thiserror::Error;

use super::cache::ApolloCache;
use super::locate::EmbeddedState;

/// Path of the cache inside a `__NEXT_DATA__` payload.
const NEXT_DATA_CACHE_PATH: [&str; 3] = ["props", "pageProps", "apolloCache"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload has no {0}")]
    MissingCache(&'static str),
    #[error("state is not a JSON object")]
    NotAnObject,
}

/// Parse the state into a cache.
///
/// Duplicate keys collapse to their last occurrence, the same as a map
/// literal, and the parsed tree is re-serialized and parsed again so no
/// duplicate survives downstream.
pub fn load(state: &EmbeddedState) -> Result<ApolloCache, LoadError> {
    let parsed: Value = serde_json::from_str(state.text())?;

    let cache = match state {
        EmbeddedState::NextData(_) => {
            let mut node = &parsed;
            for segment in NEXT_DATA_CACHE_PATH {
                node = node
                    .get(segment)
                    .ok_or(LoadError::MissingCache("props.pageProps.apolloCache"))?;
            }
            node.clone()
        }
        EmbeddedState::ApolloState(_) => {
            let reserialized = serde_json::to_string(&parsed)?;
            serde_json::from_str(&reserialized)?
        }
    };

    match cache {
        Value::Object(entities) => Ok(ApolloCache::new(entities)),
        _ => Err(LoadError::NotAnObject),
    }
}

/// Build a cache from an already parsed object, mainly for fixtures.
pub fn from_value(value: Value) -> Result<ApolloCache, LoadError> {
    match value {
        Value::Object(entities) => Ok(ApolloCache::new(entities)),
        _ => Err(LoadError::NotAnObject),
    }
}
