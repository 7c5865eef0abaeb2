//! Repository utilities.

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind};

/// Simple error info wrapper for database errors.
#[derive(Debug)]
pub struct DbErrorInfo(pub String);

impl DatabaseErrorInformation for DbErrorInfo {
    fn message(&self) -> &str {
        &self.0
    }
    fn details(&self) -> Option<&str> {
        None
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        None
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Convert any displayable error to a diesel error with proper message.
pub fn to_diesel_error(e: impl std::fmt::Display) -> diesel::result::Error {
    diesel::result::Error::DatabaseError(
        DatabaseErrorKind::Unknown,
        Box::new(DbErrorInfo(e.to_string())),
    )
}

/// SQLite stores booleans as integers.
pub fn bool_to_int(value: bool) -> i32 {
    i32::from(value)
}

pub fn int_to_bool(value: i32) -> bool {
    value != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_message() {
        match to_diesel_error("disk on fire") {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::Unknown, info) => {
                assert_eq!(info.message(), "disk on fire")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn booleans_round_trip_through_integers() {
        assert_eq!(bool_to_int(true), 1);
        assert!(!int_to_bool(0));
        assert!(int_to_bool(2));
    }
}
