//! Company lookup through the site's typeahead endpoint.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use super::http_client::{FetchError, PageFetcher};
use super::urls::BASE_URL;
use crate::models::CompanyMatch;

const COMPANY_CATEGORIES: [&str; 2] = ["company", "multicat"];

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("malformed suggestion payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result of one lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(CompanyMatch),
    /// The site answered but had no usable company.
    NotFound,
    /// The lookup itself failed; nothing is known about the company.
    Failed(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestion {
    #[serde(default)]
    category: String,
    #[serde(default)]
    direct_hit: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default)]
    employer_id: Option<i64>,
}

pub fn typeahead_url(query: &str) -> String {
    format!(
        "{}/searchsuggest/typeahead?numSuggestions=8&source=GD_V2&version=NEW&rf=full&fallback=token&input={}",
        BASE_URL,
        urlencoding::encode(query)
    )
}

/// Pick the best company out of a typeahead payload.
///
/// Direct hits win over everything else; within the chosen group the highest
/// confidence wins. A winner without a name or employer id is no match.
pub fn best_match(payload: &str) -> Result<Option<CompanyMatch>, SearchError> {
    let suggestions: Vec<Suggestion> = serde_json::from_str(payload)?;
    let companies: Vec<&Suggestion> = suggestions
        .iter()
        .filter(|s| COMPANY_CATEGORIES.contains(&s.category.as_str()))
        .collect();

    let direct: Vec<&Suggestion> = companies.iter().copied().filter(|s| s.direct_hit).collect();
    let pool = if direct.is_empty() { companies } else { direct };

    let best = pool
        .into_iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

    Ok(best.and_then(|s| {
        let name = s.suggestion.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        Some(CompanyMatch {
            employer_id: s.employer_id?,
            suggestion: name.to_string(),
        })
    }))
}

/// Company lookups over any [`PageFetcher`].
pub struct CompanySearch<F> {
    fetcher: F,
}

impl<F: PageFetcher> CompanySearch<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub async fn lookup(&self, name: &str) -> Result<Option<CompanyMatch>, SearchError> {
        let body = self.fetcher.fetch(&typeahead_url(name)).await?;
        best_match(&body)
    }

    pub async fn find_company(&self, name: &str) -> SearchOutcome {
        match self.lookup(name).await {
            Ok(Some(found)) => {
                debug!(query = name, employer_id = found.employer_id, "company found");
                SearchOutcome::Found(found)
            }
            Ok(None) => {
                error!(query = name, "no company search results");
                SearchOutcome::NotFound
            }
            Err(e) => {
                error!(query = name, error = %e, "company search failed");
                SearchOutcome::Failed(e.to_string())
            }
        }
    }
}
