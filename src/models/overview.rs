//! Per-employer aggregate scraped from the first usable page of a session.

use serde::{Deserialize, Serialize};

use super::{check_non_negative, check_rating, ValidationError};

/// Employer identity plus the ratings aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewRecord {
    pub employer_id: i64,
    pub employer_name: Option<String>,
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
}

impl OverviewRecord {
    /// Create an overview carrying only identity.
    pub fn new(employer_id: i64) -> Self {
        Self {
            employer_id,
            ..Default::default()
        }
    }

    /// Upstream-declared page count, if positive.
    pub fn declared_pages(&self) -> Option<u32> {
        self.number_of_pages
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Fill unset fields from a later observation without clobbering known values.
    pub fn merge_missing(&mut self, later: OverviewRecord) {
        if self.employer_name.is_none() {
            self.employer_name = later.employer_name;
        }
        if self.ceo_name.is_none() {
            self.ceo_name = later.ceo_name;
        }
        self.number_of_pages = self.number_of_pages.or(later.number_of_pages);
        self.all_reviews_count = self.all_reviews_count.or(later.all_reviews_count);
        self.rated_reviews_count = self.rated_reviews_count.or(later.rated_reviews_count);
        self.overall_rating = self.overall_rating.or(later.overall_rating);
        self.ceo_rating = self.ceo_rating.or(later.ceo_rating);
        self.recommend_to_friend_rating = self
            .recommend_to_friend_rating
            .or(later.recommend_to_friend_rating);
        self.culture_and_values_rating = self
            .culture_and_values_rating
            .or(later.culture_and_values_rating);
        self.diversity_and_inclusion_rating = self
            .diversity_and_inclusion_rating
            .or(later.diversity_and_inclusion_rating);
        self.career_opportunities_rating = self
            .career_opportunities_rating
            .or(later.career_opportunities_rating);
        self.work_life_balance_rating = self
            .work_life_balance_rating
            .or(later.work_life_balance_rating);
        self.senior_management_rating = self
            .senior_management_rating
            .or(later.senior_management_rating);
        self.compensation_and_benefits_rating = self
            .compensation_and_benefits_rating
            .or(later.compensation_and_benefits_rating);
        self.business_outlook_rating = self
            .business_outlook_rating
            .or(later.business_outlook_rating);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.employer_id <= 0 {
            return Err(ValidationError::new(
                "employer_id",
                format!("{} is not a positive id", self.employer_id),
            ));
        }
        check_non_negative("number_of_pages", self.number_of_pages)?;
        check_non_negative("all_reviews_count", self.all_reviews_count)?;
        check_non_negative("rated_reviews_count", self.rated_reviews_count)?;

        for (field, value) in [
            ("overall_rating", self.overall_rating),
            ("ceo_rating", self.ceo_rating),
            ("culture_and_values_rating", self.culture_and_values_rating),
            (
                "diversity_and_inclusion_rating",
                self.diversity_and_inclusion_rating,
            ),
            (
                "career_opportunities_rating",
                self.career_opportunities_rating,
            ),
            ("work_life_balance_rating", self.work_life_balance_rating),
            ("senior_management_rating", self.senior_management_rating),
            (
                "compensation_and_benefits_rating",
                self.compensation_and_benefits_rating,
            ),
        ] {
            check_rating(field, value)?;
        }

        Ok(())
    }
}
