//! Service layer for gdreviews business logic.
//!
//! Services are separated from UI concerns and report progress through
//! event channels.

pub mod discovery;
pub mod orchestrator;
pub mod store;

pub use discovery::{create_review_urls, discover_companies, DiscoveryEvent, DiscoveryStats};
pub use orchestrator::{scrape_companies, RunOptions, RunSummary, ScrapeEvent};
pub use store::{scrape_and_store, BatchTotals, ReviewBatcher, ReviewStore, StoreStats};
