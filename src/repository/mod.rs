//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM over SQLite, driven asynchronously
//! through diesel-async.

pub mod company;
pub mod context;
pub mod models;
pub mod pool;
pub mod review;
pub mod util;

pub use company::CompanyRepository;
pub use context::DbContext;
pub use pool::{AsyncSqlitePool, DieselError};
pub use review::ReviewRepository;

use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselResultError};
use thiserror::Error;

/// A write that failed.
///
/// Unique-constraint violations are split out so callers can skip the
/// offending rows instead of giving up.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(DieselResultError),
}

impl From<DieselResultError> for PersistError {
    fn from(e: DieselResultError) -> Self {
        match e {
            DieselResultError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                PersistError::Conflict(info.message().to_string())
            }
            other => PersistError::Database(other),
        }
    }
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
