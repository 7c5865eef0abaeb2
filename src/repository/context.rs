//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all database operations.
//! It holds the connection factory and hands out repositories.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::company::CompanyRepository;
use super::pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};
use super::review::ReviewRepository;

/// Schema created by `init_schema`. Mirrors `crate::schema`.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employer_id BIGINT UNIQUE,
    employer_name TEXT NOT NULL,
    gvkey BIGINT UNIQUE,
    is_gvkey INTEGER NOT NULL DEFAULT 0,
    id_not_found INTEGER NOT NULL DEFAULT 0,
    url_old TEXT,
    url_new TEXT,
    ticker TEXT,
    query TEXT,
    number_of_pages BIGINT,
    all_reviews_count BIGINT,
    rated_reviews_count BIGINT,
    overall_rating DOUBLE,
    ceo_name TEXT,
    ceo_rating DOUBLE,
    recommend_to_friend_rating DOUBLE,
    culture_and_values_rating DOUBLE,
    diversity_and_inclusion_rating DOUBLE,
    career_opportunities_rating DOUBLE,
    work_life_balance_rating DOUBLE,
    senior_management_rating DOUBLE,
    compensation_and_benefits_rating DOUBLE,
    business_outlook_rating DOUBLE,
    last_scraped TEXT
);
CREATE INDEX IF NOT EXISTS idx_companies_employer_name ON companies(employer_name);

CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    review_id BIGINT NOT NULL UNIQUE,
    employer_id BIGINT REFERENCES companies(employer_id),
    date_time TEXT NOT NULL,
    review_text TEXT NOT NULL,
    rating_overall DOUBLE,
    rating_ceo TEXT,
    rating_business_outlook TEXT,
    rating_work_life_balance DOUBLE,
    rating_culture_and_values DOUBLE,
    rating_diversity_and_inclusion DOUBLE,
    rating_senior_leadership DOUBLE,
    rating_recommend_to_friend TEXT,
    rating_career_opportunities DOUBLE,
    rating_compensation_and_benefits DOUBLE,
    is_current_job INTEGER NOT NULL DEFAULT 0,
    length_of_employment BIGINT,
    employment_status TEXT,
    job_ending_year BIGINT,
    job_title TEXT,
    location TEXT,
    pros TEXT,
    cons TEXT,
    summary TEXT,
    advice TEXT,
    count_helpful BIGINT,
    count_not_helpful BIGINT,
    is_covid19 INTEGER,
    scraped_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reviews_employer_id ON reviews(employer_id);
CREATE INDEX IF NOT EXISTS idx_reviews_date_time ON reviews(date_time);
"#;

/// Database context that hands out repositories over one connection factory.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:gdreviews.db");
/// ctx.init_schema().await?;
/// let targets = ctx.companies().scrape_targets(&[]).await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: AsyncSqlitePool,
}

impl DbContext {
    /// Create a context from a database file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Create a context from a `sqlite:` URL or plain path.
    pub fn from_url(url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(url),
        }
    }

    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository::new(self.pool.clone())
    }

    pub fn reviews(&self) -> ReviewRepository {
        ReviewRepository::new(self.pool.clone())
    }

    /// Initialize database schema.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        init_sqlite_schema(&mut conn).await
    }
}

async fn init_sqlite_schema(conn: &mut AsyncSqliteConnection) -> Result<(), DieselError> {
    conn.batch_execute("PRAGMA journal_mode = WAL;").await?;
    conn.batch_execute(SCHEMA_SQL).await
}
