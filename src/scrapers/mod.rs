//! Fetching and parsing employer review pages.

pub mod apollo;
pub mod extract;
pub mod glassdoor;
pub mod http_client;
pub mod rate_limiter;
pub mod search;
pub mod text;
pub mod urls;

pub use glassdoor::{PageError, ReviewScraper, ScrapeOptions, ScrapeSession};
pub use http_client::{FetchError, HttpClient, PageFetcher, RetryPolicy};
pub use rate_limiter::RateLimitGuard;
pub use search::{CompanySearch, SearchError, SearchOutcome};
pub use urls::Region;
