//! Diesel row types for the `companies` and `reviews` tables.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use super::parse_datetime_opt;
use super::util::{bool_to_int, int_to_bool};
use crate::models::{Company, OverviewRecord, ReviewNarrative, ReviewRecord};
use crate::schema;

/// Storage format of review timestamps.
pub const REVIEW_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Company record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::companies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CompanyRecord {
    pub id: i32,
    pub employer_id: Option<i64>,
    pub employer_name: String,
    pub gvkey: Option<i64>,
    pub is_gvkey: i32,
    pub id_not_found: i32,
    pub url_old: Option<String>,
    pub url_new: Option<String>,
    pub ticker: Option<String>,
    pub query: Option<String>,
    pub number_of_pages: Option<i64>,
    pub all_reviews_count: Option<i64>,
    pub rated_reviews_count: Option<i64>,
    pub overall_rating: Option<f64>,
    pub ceo_name: Option<String>,
    pub ceo_rating: Option<f64>,
    pub recommend_to_friend_rating: Option<f64>,
    pub culture_and_values_rating: Option<f64>,
    pub diversity_and_inclusion_rating: Option<f64>,
    pub career_opportunities_rating: Option<f64>,
    pub work_life_balance_rating: Option<f64>,
    pub senior_management_rating: Option<f64>,
    pub compensation_and_benefits_rating: Option<f64>,
    pub business_outlook_rating: Option<f64>,
    pub last_scraped: Option<String>,
}

impl From<CompanyRecord> for Company {
    fn from(record: CompanyRecord) -> Self {
        // Only rows that were scraped at least once carry an overview.
        let overview = record.employer_id.filter(|_| record.last_scraped.is_some()).map(
            |employer_id| OverviewRecord {
                employer_id,
                employer_name: Some(record.employer_name.clone()),
                number_of_pages: record.number_of_pages,
                all_reviews_count: record.all_reviews_count,
                rated_reviews_count: record.rated_reviews_count,
                overall_rating: record.overall_rating,
                ceo_name: record.ceo_name.clone(),
                ceo_rating: record.ceo_rating,
                recommend_to_friend_rating: record.recommend_to_friend_rating,
                culture_and_values_rating: record.culture_and_values_rating,
                diversity_and_inclusion_rating: record.diversity_and_inclusion_rating,
                career_opportunities_rating: record.career_opportunities_rating,
                work_life_balance_rating: record.work_life_balance_rating,
                senior_management_rating: record.senior_management_rating,
                compensation_and_benefits_rating: record.compensation_and_benefits_rating,
                business_outlook_rating: record.business_outlook_rating,
            },
        );

        Company {
            id: record.id,
            employer_id: record.employer_id,
            employer_name: record.employer_name,
            gvkey: record.gvkey,
            is_gvkey: int_to_bool(record.is_gvkey),
            id_not_found: int_to_bool(record.id_not_found),
            url_old: record.url_old,
            url_new: record.url_new,
            ticker: record.ticker,
            query: record.query,
            overview,
            last_scraped: parse_datetime_opt(record.last_scraped),
        }
    }
}

/// New company for insertion.
#[derive(Insertable, Debug, Default)]
#[diesel(table_name = schema::companies)]
pub struct NewCompany<'a> {
    pub employer_id: Option<i64>,
    pub employer_name: &'a str,
    pub query: Option<&'a str>,
    pub url_new: Option<&'a str>,
    pub is_gvkey: i32,
    pub id_not_found: i32,
}

/// Overview columns. `None` fields are left untouched by an update.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = schema::companies)]
pub struct OverviewChangeset<'a> {
    pub employer_name: Option<&'a str>,
    pub number_of_pages: Option<i64>,
    pub all_reviews_count: Option<i64>,
    pub rated_reviews_count: Option<i64>,
    pub overall_rating: Option<f64>,
    pub ceo_name: Option<&'a str>,
    pub ceo_rating: Option<f64>,
    pub recommend_to_friend_rating: Option<f64>,
    pub culture_and_values_rating: Option<f64>,
    pub diversity_and_inclusion_rating: Option<f64>,
    pub career_opportunities_rating: Option<f64>,
    pub work_life_balance_rating: Option<f64>,
    pub senior_management_rating: Option<f64>,
    pub compensation_and_benefits_rating: Option<f64>,
    pub business_outlook_rating: Option<f64>,
    pub last_scraped: Option<String>,
}

impl<'a> OverviewChangeset<'a> {
    pub fn from_overview(overview: &'a OverviewRecord) -> Self {
        Self {
            employer_name: overview.employer_name.as_deref(),
            number_of_pages: overview.number_of_pages,
            all_reviews_count: overview.all_reviews_count,
            rated_reviews_count: overview.rated_reviews_count,
            overall_rating: overview.overall_rating,
            ceo_name: overview.ceo_name.as_deref(),
            ceo_rating: overview.ceo_rating,
            recommend_to_friend_rating: overview.recommend_to_friend_rating,
            culture_and_values_rating: overview.culture_and_values_rating,
            diversity_and_inclusion_rating: overview.diversity_and_inclusion_rating,
            career_opportunities_rating: overview.career_opportunities_rating,
            work_life_balance_rating: overview.work_life_balance_rating,
            senior_management_rating: overview.senior_management_rating,
            compensation_and_benefits_rating: overview.compensation_and_benefits_rating,
            business_outlook_rating: overview.business_outlook_rating,
            last_scraped: Some(Utc::now().to_rfc3339()),
        }
    }
}

/// Review record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::reviews)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReviewRow {
    pub id: i32,
    pub review_id: i64,
    pub employer_id: Option<i64>,
    pub date_time: String,
    pub review_text: String,
    pub rating_overall: Option<f64>,
    pub rating_ceo: Option<String>,
    pub rating_business_outlook: Option<String>,
    pub rating_work_life_balance: Option<f64>,
    pub rating_culture_and_values: Option<f64>,
    pub rating_diversity_and_inclusion: Option<f64>,
    pub rating_senior_leadership: Option<f64>,
    pub rating_recommend_to_friend: Option<String>,
    pub rating_career_opportunities: Option<f64>,
    pub rating_compensation_and_benefits: Option<f64>,
    pub is_current_job: i32,
    pub length_of_employment: Option<i64>,
    pub employment_status: Option<String>,
    pub job_ending_year: Option<i64>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub summary: Option<String>,
    pub advice: Option<String>,
    pub count_helpful: Option<i64>,
    pub count_not_helpful: Option<i64>,
    pub is_covid19: Option<i32>,
    pub scraped_at: String,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        let date_time = NaiveDateTime::parse_from_str(&row.date_time, REVIEW_DATE_FORMAT)
            .unwrap_or_default();
        let narrative = ReviewNarrative {
            pros: row.pros,
            cons: row.cons,
            summary: row.summary,
            advice: row.advice,
        };

        let mut review = ReviewRecord::new(row.review_id, date_time, narrative);
        review.employer_id = row.employer_id;
        review.rating_overall = row.rating_overall;
        review.rating_ceo = row.rating_ceo;
        review.rating_business_outlook = row.rating_business_outlook;
        review.rating_work_life_balance = row.rating_work_life_balance;
        review.rating_culture_and_values = row.rating_culture_and_values;
        review.rating_diversity_and_inclusion = row.rating_diversity_and_inclusion;
        review.rating_senior_leadership = row.rating_senior_leadership;
        review.rating_recommend_to_friend = row.rating_recommend_to_friend;
        review.rating_career_opportunities = row.rating_career_opportunities;
        review.rating_compensation_and_benefits = row.rating_compensation_and_benefits;
        review.is_current_job = int_to_bool(row.is_current_job);
        review.length_of_employment = row.length_of_employment;
        review.employment_status = row.employment_status;
        review.job_ending_year = row.job_ending_year;
        review.job_title = row.job_title;
        review.location = row.location;
        review.count_helpful = row.count_helpful;
        review.count_not_helpful = row.count_not_helpful;
        review.is_covid19 = row.is_covid19.map(int_to_bool);
        review
    }
}

/// New review for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::reviews)]
pub struct NewReview<'a> {
    pub review_id: i64,
    pub employer_id: Option<i64>,
    pub date_time: String,
    pub review_text: &'a str,
    pub rating_overall: Option<f64>,
    pub rating_ceo: Option<&'a str>,
    pub rating_business_outlook: Option<&'a str>,
    pub rating_work_life_balance: Option<f64>,
    pub rating_culture_and_values: Option<f64>,
    pub rating_diversity_and_inclusion: Option<f64>,
    pub rating_senior_leadership: Option<f64>,
    pub rating_recommend_to_friend: Option<&'a str>,
    pub rating_career_opportunities: Option<f64>,
    pub rating_compensation_and_benefits: Option<f64>,
    pub is_current_job: i32,
    pub length_of_employment: Option<i64>,
    pub employment_status: Option<&'a str>,
    pub job_ending_year: Option<i64>,
    pub job_title: Option<&'a str>,
    pub location: Option<&'a str>,
    pub pros: Option<&'a str>,
    pub cons: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub advice: Option<&'a str>,
    pub count_helpful: Option<i64>,
    pub count_not_helpful: Option<i64>,
    pub is_covid19: Option<i32>,
    pub scraped_at: &'a str,
}

impl<'a> NewReview<'a> {
    pub fn from_review(review: &'a ReviewRecord, scraped_at: &'a str) -> Self {
        Self {
            review_id: review.review_id,
            employer_id: review.employer_id,
            date_time: review.date_time.format(REVIEW_DATE_FORMAT).to_string(),
            review_text: review.review_text(),
            rating_overall: review.rating_overall,
            rating_ceo: review.rating_ceo.as_deref(),
            rating_business_outlook: review.rating_business_outlook.as_deref(),
            rating_work_life_balance: review.rating_work_life_balance,
            rating_culture_and_values: review.rating_culture_and_values,
            rating_diversity_and_inclusion: review.rating_diversity_and_inclusion,
            rating_senior_leadership: review.rating_senior_leadership,
            rating_recommend_to_friend: review.rating_recommend_to_friend.as_deref(),
            rating_career_opportunities: review.rating_career_opportunities,
            rating_compensation_and_benefits: review.rating_compensation_and_benefits,
            is_current_job: bool_to_int(review.is_current_job),
            length_of_employment: review.length_of_employment,
            employment_status: review.employment_status.as_deref(),
            job_ending_year: review.job_ending_year,
            job_title: review.job_title.as_deref(),
            location: review.location.as_deref(),
            pros: review.pros(),
            cons: review.cons(),
            summary: review.summary(),
            advice: review.advice(),
            count_helpful: review.count_helpful,
            count_not_helpful: review.count_not_helpful,
            is_covid19: review.is_covid19.map(bool_to_int),
            scraped_at,
        }
    }
}
