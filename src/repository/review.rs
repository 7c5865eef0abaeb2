//! Diesel-based review repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewReview, ReviewRow};
use super::pool::{end_write, AsyncSqliteConnection, AsyncSqlitePool, DieselError};
use super::PersistError;
use crate::models::ReviewRecord;
use crate::schema::reviews;

#[derive(Clone)]
pub struct ReviewRepository {
    pool: AsyncSqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert every review in one transaction: all rows commit, or none do.
    pub async fn insert_batch(&self, batch: &[ReviewRecord]) -> Result<usize, PersistError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut conn = self.pool.begin_write().await?;
        let scraped_at = Utc::now().to_rfc3339();
        let result = insert_all(&mut conn, batch, &scraped_at).await;
        end_write(&mut conn, result).await
    }

    pub async fn insert_one(&self, review: &ReviewRecord) -> Result<(), PersistError> {
        let mut conn = self.pool.get().await?;
        let scraped_at = Utc::now().to_rfc3339();

        diesel::insert_into(reviews::table)
            .values(NewReview::from_review(review, &scraped_at))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    pub async fn count_for_employer(&self, employer_id: i64) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        reviews::table
            .filter(reviews::employer_id.eq(employer_id))
            .count()
            .get_result(&mut conn)
            .await
    }

    /// Stored reviews of one employer, newest first.
    pub async fn list_for_employer(&self, employer_id: i64) -> Result<Vec<ReviewRecord>, DieselError> {
        let mut conn = self.pool.get().await?;

        reviews::table
            .filter(reviews::employer_id.eq(employer_id))
            .order(reviews::date_time.desc())
            .load::<ReviewRow>(&mut conn)
            .await
            .map(|rows| rows.into_iter().map(ReviewRecord::from).collect())
    }
}

async fn insert_all(
    conn: &mut AsyncSqliteConnection,
    batch: &[ReviewRecord],
    scraped_at: &str,
) -> Result<usize, PersistError> {
    let mut inserted = 0;
    for review in batch {
        inserted += diesel::insert_into(reviews::table)
            .values(NewReview::from_review(review, scraped_at))
            .execute(conn)
            .await?;
    }
    Ok(inserted)
}
