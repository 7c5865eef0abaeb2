//! Diesel-based company repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{CompanyRecord, NewCompany, OverviewChangeset};
use super::pool::{end_write, AsyncSqliteConnection, AsyncSqlitePool, DieselError};
use super::PersistError;
use crate::models::{Company, CompanyMatch, OverviewRecord};
use crate::schema::companies;

#[derive(Clone)]
pub struct CompanyRepository {
    pool: AsyncSqlitePool,
}

impl CompanyRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_employer_id(&self, employer_id: i64) -> Result<Option<Company>, DieselError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .filter(companies::employer_id.eq(employer_id))
            .first::<CompanyRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Company::from))
    }

    /// First company stored under `name`.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Company>, DieselError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .filter(companies::employer_name.eq(name))
            .order(companies::id.asc())
            .first::<CompanyRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Company::from))
    }

    /// Register a company name to be resolved later. Returns false when the
    /// name is already present.
    pub async fn add_name(&self, name: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.begin_write().await?;
        let result = insert_name(&mut conn, name).await;
        end_write(&mut conn, result).await
    }

    pub async fn list(&self) -> Result<Vec<Company>, DieselError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .order(companies::id.asc())
            .load::<CompanyRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Company::from).collect())
    }

    /// Companies with a review URL that were not marked not-found,
    /// optionally restricted to `employer_ids`.
    pub async fn scrape_targets(&self, employer_ids: &[i64]) -> Result<Vec<Company>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = companies::table
            .filter(companies::id_not_found.eq(0))
            .filter(
                companies::url_new
                    .is_not_null()
                    .or(companies::url_old.is_not_null()),
            )
            .order(companies::id.asc())
            .into_boxed();

        if !employer_ids.is_empty() {
            query = query.filter(companies::employer_id.eq_any(employer_ids.to_vec()));
        }

        query
            .load::<CompanyRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Company::from).collect())
    }

    /// Upsert the overview into the row for its employer id. Known values
    /// are never replaced by missing ones.
    pub async fn apply_overview(&self, overview: &OverviewRecord) -> Result<(), PersistError> {
        let mut conn = self.pool.begin_write().await?;
        let result = upsert_overview(&mut conn, overview).await;
        end_write(&mut conn, result).await
    }

    /// Make sure a row exists for `employer_id`, named after the id when it
    /// has to be created. Returns true when a row was inserted.
    pub async fn ensure_employer(&self, employer_id: i64) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;
        let name = employer_id.to_string();

        let inserted = diesel::insert_or_ignore_into(companies::table)
            .values(NewCompany {
                employer_id: Some(employer_id),
                employer_name: &name,
                ..Default::default()
            })
            .execute(&mut conn)
            .await?;
        Ok(inserted > 0)
    }

    /// Record a typeahead match for the company searched as `name`.
    pub async fn apply_search_result(
        &self,
        name: &str,
        found: &CompanyMatch,
    ) -> Result<(), PersistError> {
        let mut conn = self.pool.begin_write().await?;
        let result = record_match(&mut conn, name, found).await;
        end_write(&mut conn, result).await
    }

    /// Flag every row named `name` as unresolvable. Returns rows touched.
    pub async fn mark_not_found(&self, name: &str) -> Result<usize, DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::update(companies::table.filter(companies::employer_name.eq(name)))
            .set(companies::id_not_found.eq(1))
            .execute(&mut conn)
            .await
    }

    pub async fn set_review_url(&self, id: i32, url: &str) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::update(companies::table.find(id))
            .set(companies::url_new.eq(Some(url)))
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

async fn insert_name(conn: &mut AsyncSqliteConnection, name: &str) -> Result<bool, DieselError> {
    let existing: i64 = companies::table
        .filter(companies::employer_name.eq(name))
        .count()
        .get_result(conn)
        .await?;
    if existing > 0 {
        return Ok(false);
    }

    diesel::insert_into(companies::table)
        .values(NewCompany {
            employer_name: name,
            query: Some(name),
            ..Default::default()
        })
        .execute(conn)
        .await?;
    Ok(true)
}

async fn upsert_overview(
    conn: &mut AsyncSqliteConnection,
    overview: &OverviewRecord,
) -> Result<(), PersistError> {
    let exists: i64 = companies::table
        .filter(companies::employer_id.eq(overview.employer_id))
        .count()
        .get_result(conn)
        .await?;

    if exists == 0 {
        let fallback_name = overview.employer_id.to_string();
        let name = overview.employer_name.as_deref().unwrap_or(&fallback_name);
        diesel::insert_into(companies::table)
            .values(NewCompany {
                employer_id: Some(overview.employer_id),
                employer_name: name,
                ..Default::default()
            })
            .execute(conn)
            .await?;
    }

    diesel::update(companies::table.filter(companies::employer_id.eq(overview.employer_id)))
        .set(OverviewChangeset::from_overview(overview))
        .execute(conn)
        .await?;
    Ok(())
}

async fn record_match(
    conn: &mut AsyncSqliteConnection,
    name: &str,
    found: &CompanyMatch,
) -> Result<(), PersistError> {
    let existing: Option<CompanyRecord> = companies::table
        .filter(companies::employer_name.eq(name))
        .order(companies::id.asc())
        .first(conn)
        .await
        .optional()?;

    match existing {
        Some(record) => {
            diesel::update(companies::table.find(record.id))
                .set((
                    companies::employer_id.eq(Some(found.employer_id)),
                    companies::employer_name.eq(&found.suggestion),
                    companies::query.eq(record.query.as_deref().or(Some(name))),
                    companies::id_not_found.eq(0),
                ))
                .execute(conn)
                .await?;
        }
        None => {
            diesel::insert_into(companies::table)
                .values(NewCompany {
                    employer_id: Some(found.employer_id),
                    employer_name: &found.suggestion,
                    query: Some(name),
                    ..Default::default()
                })
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}
