//! Company discovery: resolve stored names to employer ids, then derive
//! review URLs from the ids.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

use crate::repository::{CompanyRepository, DbContext};
use crate::scrapers::urls::{reviews_url, Region};
use crate::scrapers::{CompanySearch, PageFetcher, SearchOutcome};

/// Events emitted while discovering companies.
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    Found { name: String, employer_id: i64 },
    NotFound { name: String },
    Failed { name: String, error: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryStats {
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Look up every company not previously marked not-found.
///
/// Lookups run `workers` at a time. The database update that follows each
/// lookup holds `lock`, so read-check-write sequences never interleave.
/// With `include_resolved` false, rows that already carry an employer id
/// are left alone.
pub async fn discover_companies<F: PageFetcher>(
    ctx: &DbContext,
    search: &CompanySearch<F>,
    workers: usize,
    include_resolved: bool,
    event_tx: mpsc::Sender<DiscoveryEvent>,
) -> anyhow::Result<DiscoveryStats> {
    let repo = ctx.companies();
    let names: Vec<String> = repo
        .list()
        .await?
        .into_iter()
        .filter(|c| !c.id_not_found)
        .filter(|c| include_resolved || c.employer_id.is_none())
        .map(|c| c.employer_name)
        .collect();

    info!(count = names.len(), workers, "discovering companies");

    let lock = Arc::new(Mutex::new(()));
    let events: Vec<DiscoveryEvent> = stream::iter(names)
        .map(|name| {
            let repo = repo.clone();
            let lock = lock.clone();
            let event_tx = event_tx.clone();
            async move {
                let event = resolve_company(&repo, search, &lock, name).await;
                let _ = event_tx.send(event.clone()).await;
                event
            }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    let mut stats = DiscoveryStats::default();
    for event in &events {
        match event {
            DiscoveryEvent::Found { .. } => stats.found += 1,
            DiscoveryEvent::NotFound { .. } => stats.not_found += 1,
            DiscoveryEvent::Failed { .. } => stats.failed += 1,
        }
    }

    info!(
        found = stats.found,
        not_found = stats.not_found,
        failed = stats.failed,
        "company discovery complete"
    );
    Ok(stats)
}

async fn resolve_company<F: PageFetcher>(
    repo: &CompanyRepository,
    search: &CompanySearch<F>,
    lock: &Mutex<()>,
    name: String,
) -> DiscoveryEvent {
    let outcome = search.find_company(&name).await;

    let _guard = lock.lock().await;
    match outcome {
        SearchOutcome::Found(found) => match repo.apply_search_result(&name, &found).await {
            Ok(()) => {
                info!(query = %name, employer_id = found.employer_id, "company added");
                DiscoveryEvent::Found {
                    name,
                    employer_id: found.employer_id,
                }
            }
            Err(e) => {
                error!(query = %name, error = %e, "could not store company");
                DiscoveryEvent::Failed {
                    name,
                    error: e.to_string(),
                }
            }
        },
        SearchOutcome::NotFound => match repo.mark_not_found(&name).await {
            Ok(_) => DiscoveryEvent::NotFound { name },
            Err(e) => {
                error!(query = %name, error = %e, "could not mark company not found");
                DiscoveryEvent::Failed {
                    name,
                    error: e.to_string(),
                }
            }
        },
        // Nothing is learned from a failed lookup, so the row stays eligible.
        SearchOutcome::Failed(error) => DiscoveryEvent::Failed { name, error },
    }
}

/// Write a review URL for every company with an employer id. Returns the
/// number of rows updated.
pub async fn create_review_urls(ctx: &DbContext, regions: &[Region]) -> anyhow::Result<usize> {
    let repo = ctx.companies();
    let mut updated = 0;

    for company in repo.list().await? {
        let Some(employer_id) = company.employer_id else {
            continue;
        };
        let url = reviews_url(&company.employer_name, employer_id, regions);
        repo.set_review_url(company.id, &url).await?;
        updated += 1;
    }

    info!(updated, "review URLs created");
    Ok(updated)
}
