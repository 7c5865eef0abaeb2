//! Find the embedded state blob in a listing page.
//!
//! Two embeddings are known. Newer pages ship a Next.js payload:
//! ```html
//! <script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{"apolloCache":{...}}}}</script>
//! ```
//! Older pages assign the Apollo state inline:
//! ```html
//! <script>window.appCache={"apolloState":{...}};</script>
//! ```

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;

pub const NEXT_DATA_ID: &str = "__NEXT_DATA__";
pub const APOLLO_STATE_MARKER: &str = "apolloState";

static NEXT_DATA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[id="__NEXT_DATA__"]"#).unwrap());
static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());
static APOLLO_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)apolloState":(\{.*?\})\};</script>"#).unwrap());

/// Raw state text, tagged with the embedding it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddedState {
    /// Whole `__NEXT_DATA__` payload; the cache sits at `props.pageProps.apolloCache`.
    NextData(String),
    /// The object assigned to `apolloState`; it is the cache itself.
    ApolloState(String),
}

impl EmbeddedState {
    pub fn text(&self) -> &str {
        match self {
            EmbeddedState::NextData(text) | EmbeddedState::ApolloState(text) => text,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            EmbeddedState::NextData(_) => "next-data",
            EmbeddedState::ApolloState(_) => "apollo-state",
        }
    }

    /// Rewrite the text while keeping the shape tag.
    pub fn map_text(self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            EmbeddedState::NextData(text) => EmbeddedState::NextData(f(&text)),
            EmbeddedState::ApolloState(text) => EmbeddedState::ApolloState(f(&text)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("no __NEXT_DATA__ or apolloState script in page")]
    NoStateScript,
    #[error("apolloState script found but no object could be cut out of it")]
    NoStateObject,
}

/// Pull the embedded state out of a page.
pub fn locate(html: &str) -> Result<EmbeddedState, LocateError> {
    let document = Html::parse_document(html);

    if let Some(element) = document.select(&NEXT_DATA).next() {
        return Ok(EmbeddedState::NextData(element.text().collect::<String>()));
    }

    let script = document
        .select(&SCRIPT)
        .find(|element| element.text().any(|chunk| chunk.contains(APOLLO_STATE_MARKER)))
        .ok_or(LocateError::NoStateScript)?;

    let serialized = script.html();
    APOLLO_STATE
        .captures(&serialized)
        .and_then(|caps| caps.get(1))
        .map(|m| EmbeddedState::ApolloState(m.as_str().to_string()))
        .ok_or(LocateError::NoStateObject)
}
