//! Data models for employer reviews.

mod company;
mod overview;
mod review;

pub use company::{Company, CompanyMatch};
pub use overview::OverviewRecord;
pub use review::{ReviewNarrative, ReviewRecord};

use thiserror::Error;

/// A flattened record failed a schema constraint.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Ratings are on a five star scale.
pub(crate) fn check_rating(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(0.0..=5.0).contains(&v) => Err(ValidationError::new(
            field,
            format!("{} is outside 0..=5", v),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_non_negative(
    field: &'static str,
    value: Option<i64>,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::new(field, format!("{} is negative", v))),
        _ => Ok(()),
    }
}
