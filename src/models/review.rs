//! Flattened review record.
//!
//! The four narrative fields are private so that every construction and
//! mutation goes through code that recomputes `review_text`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{check_non_negative, check_rating, ValidationError};

/// The four free-text fields of a review, already cleaned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewNarrative {
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub summary: Option<String>,
    pub advice: Option<String>,
}

impl ReviewNarrative {
    /// Space-joined concatenation in the fixed order pros, cons, summary, advice.
    pub fn joined(&self) -> String {
        format!(
            "{} {} {} {}",
            self.pros.as_deref().unwrap_or(""),
            self.cons.as_deref().unwrap_or(""),
            self.summary.as_deref().unwrap_or(""),
            self.advice.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRecord {
    pub review_id: i64,
    pub date_time: NaiveDateTime,
    pub employer_id: Option<i64>,
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
    pub is_current_job: bool,
    pub length_of_employment: Option<i64>,
    pub employment_status: Option<String>,
    pub job_ending_year: Option<i64>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub count_helpful: Option<i64>,
    pub count_not_helpful: Option<i64>,
    pub is_covid19: Option<bool>,
    #[serde(flatten)]
    narrative: ReviewNarrative,
    review_text: String,
}

impl ReviewRecord {
    /// Create a review with no ratings or metadata set.
    pub fn new(review_id: i64, date_time: NaiveDateTime, narrative: ReviewNarrative) -> Self {
        let review_text = narrative.joined();
        Self {
            review_id,
            date_time,
            employer_id: None,
            rating_overall: None,
            rating_ceo: None,
            rating_business_outlook: None,
            rating_work_life_balance: None,
            rating_culture_and_values: None,
            rating_diversity_and_inclusion: None,
            rating_senior_leadership: None,
            rating_recommend_to_friend: None,
            rating_career_opportunities: None,
            rating_compensation_and_benefits: None,
            is_current_job: false,
            length_of_employment: None,
            employment_status: None,
            job_ending_year: None,
            job_title: None,
            location: None,
            count_helpful: None,
            count_not_helpful: None,
            is_covid19: None,
            narrative,
            review_text,
        }
    }

    pub fn pros(&self) -> Option<&str> {
        self.narrative.pros.as_deref()
    }

    pub fn cons(&self) -> Option<&str> {
        self.narrative.cons.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.narrative.summary.as_deref()
    }

    pub fn advice(&self) -> Option<&str> {
        self.narrative.advice.as_deref()
    }

    pub fn narrative(&self) -> &ReviewNarrative {
        &self.narrative
    }

    /// Derived concatenation of the narrative fields.
    pub fn review_text(&self) -> &str {
        &self.review_text
    }

    pub fn set_pros(&mut self, pros: Option<String>) {
        self.narrative.pros = pros;
        self.refresh_review_text();
    }

    pub fn set_cons(&mut self, cons: Option<String>) {
        self.narrative.cons = cons;
        self.refresh_review_text();
    }

    pub fn set_summary(&mut self, summary: Option<String>) {
        self.narrative.summary = summary;
        self.refresh_review_text();
    }

    pub fn set_advice(&mut self, advice: Option<String>) {
        self.narrative.advice = advice;
        self.refresh_review_text();
    }

    /// Replace all four narrative fields at once.
    pub fn set_narrative(&mut self, narrative: ReviewNarrative) {
        self.narrative = narrative;
        self.refresh_review_text();
    }

    fn refresh_review_text(&mut self) {
        self.review_text = self.narrative.joined();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.review_id <= 0 {
            return Err(ValidationError::new(
                "review_id",
                format!("{} is not a positive id", self.review_id),
            ));
        }
        if let Some(id) = self.employer_id {
            if id <= 0 {
                return Err(ValidationError::new(
                    "employer_id",
                    format!("{} is not a positive id", id),
                ));
            }
        }

        for (field, value) in [
            ("rating_overall", self.rating_overall),
            ("rating_work_life_balance", self.rating_work_life_balance),
            ("rating_culture_and_values", self.rating_culture_and_values),
            (
                "rating_diversity_and_inclusion",
                self.rating_diversity_and_inclusion,
            ),
            ("rating_senior_leadership", self.rating_senior_leadership),
            (
                "rating_career_opportunities",
                self.rating_career_opportunities,
            ),
            (
                "rating_compensation_and_benefits",
                self.rating_compensation_and_benefits,
            ),
        ] {
            check_rating(field, value)?;
        }

        check_non_negative("count_helpful", self.count_helpful)?;
        check_non_negative("count_not_helpful", self.count_not_helpful)?;
        check_non_negative("length_of_employment", self.length_of_employment)?;

        if let Some(year) = self.job_ending_year {
            if !(1900..=2100).contains(&year) {
                return Err(ValidationError::new(
                    "job_ending_year",
                    format!("{} is not a plausible year", year),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 5, 17)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn narrative() -> ReviewNarrative {
        ReviewNarrative {
            pros: Some("good pay".to_string()),
            cons: Some("long hours".to_string()),
            summary: Some("solid place".to_string()),
            advice: Some("hire more".to_string()),
        }
    }

    #[test]
    fn review_text_is_set_on_construction() {
        let review = ReviewRecord::new(1, timestamp(), narrative());
        assert_eq!(
            review.review_text(),
            "good pay long hours solid place hire more"
        );
    }

    #[test]
    fn review_text_follows_every_setter() {
        let mut review = ReviewRecord::new(1, timestamp(), narrative());

        review.set_pros(Some("free lunch".to_string()));
        assert_eq!(
            review.review_text(),
            "free lunch long hours solid place hire more"
        );

        review.set_cons(Some("noisy".to_string()));
        assert_eq!(review.review_text(), "free lunch noisy solid place hire more");

        review.set_summary(Some("fine".to_string()));
        assert_eq!(review.review_text(), "free lunch noisy fine hire more");

        review.set_advice(None);
        assert_eq!(review.review_text(), "free lunch noisy fine ");
    }

    #[test]
    fn review_text_follows_bulk_replacement() {
        let mut review = ReviewRecord::new(1, timestamp(), ReviewNarrative::default());
        assert_eq!(review.review_text(), "   ");

        review.set_narrative(narrative());
        assert_eq!(review.pros(), Some("good pay"));
        assert_eq!(
            review.review_text(),
            "good pay long hours solid place hire more"
        );
    }

    #[test]
    fn validate_flags_bad_counts_and_years() {
        let mut review = ReviewRecord::new(1, timestamp(), narrative());
        review.count_helpful = Some(-1);
        assert_eq!(review.validate().unwrap_err().field, "count_helpful");

        review.count_helpful = Some(3);
        review.job_ending_year = Some(20);
        assert_eq!(review.validate().unwrap_err().field, "job_ending_year");

        review.job_ending_year = Some(2021);
        assert!(review.validate().is_ok());
    }
}
