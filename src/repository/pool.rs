//! Async SQLite connection factory.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! for SQLite. Connections are cheap, so one is opened per operation.

use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};

use tracing::warn;

use super::util::to_diesel_error;

/// Diesel error type alias.
pub type DieselError = diesel::result::Error;

/// Async SQLite connection using SyncConnectionWrapper.
pub type AsyncSqliteConnection = SyncConnectionWrapper<SqliteConnection>;

/// Concurrent writers wait this long on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

#[derive(Clone)]
pub struct AsyncSqlitePool {
    database_url: String,
}

impl AsyncSqlitePool {
    pub fn new(database_url: &str) -> Self {
        // Strip sqlite: prefix if present for diesel
        let url = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        Self {
            database_url: url.to_string(),
        }
    }

    pub fn from_path(db_path: &Path) -> Self {
        Self::new(&db_path.display().to_string())
    }

    /// Open a new connection.
    pub async fn get(&self) -> Result<AsyncSqliteConnection, DieselError> {
        let mut conn = AsyncSqliteConnection::establish(&self.database_url)
            .await
            .map_err(to_diesel_error)?;
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            BUSY_TIMEOUT_MS
        ))
        .await?;
        Ok(conn)
    }

    /// Open a connection that already holds the write lock.
    ///
    /// Under WAL a deferred transaction that reads before it writes fails
    /// with SQLITE_BUSY on the upgrade, without consulting busy_timeout.
    /// `BEGIN IMMEDIATE` takes the lock up front, where the timeout applies.
    /// Pair with [`end_write`].
    pub async fn begin_write(&self) -> Result<AsyncSqliteConnection, DieselError> {
        let mut conn = self.get().await?;
        conn.batch_execute("BEGIN IMMEDIATE;").await?;
        Ok(conn)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Commit a [`AsyncSqlitePool::begin_write`] transaction on `Ok`, roll it back on `Err`.
pub async fn end_write<T, E>(
    conn: &mut AsyncSqliteConnection,
    result: Result<T, E>,
) -> Result<T, E>
where
    E: From<DieselError>,
{
    match result {
        Ok(value) => {
            conn.batch_execute("COMMIT;").await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = conn.batch_execute("ROLLBACK;").await {
                warn!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}
