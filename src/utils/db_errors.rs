//! Translation of constraint violations into client-facing errors.
//!
//! Anything that is not a unique or foreign key violation falls through to
//! `AppError::from`, i.e. a 500.

use anyhow::anyhow;
use heightcert_core::AppError;

/// Maps errors from an INSERT or UPDATE: duplicate keys become `409`, a
/// dangling reference becomes `400`.
pub fn map_write_error(e: sqlx::Error, on_duplicate: &str, on_missing_reference: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::conflict(anyhow!("{}", on_duplicate));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::bad_request(anyhow!("{}", on_missing_reference));
        }
    }
    AppError::from(e)
}

/// Maps errors from a DELETE: rows still referenced elsewhere become `409`.
pub fn map_delete_error(e: sqlx::Error, on_in_use: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_foreign_key_violation()
    {
        return AppError::conflict(anyhow!("{}", on_in_use));
    }
    AppError::from(e)
}

/// Which unique constraint was hit, for tables with more than one.
pub fn violated_constraint(e: &sqlx::Error) -> Option<&str> {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => db_err.constraint(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_non_database_errors_are_internal() {
        let err = map_write_error(sqlx::Error::RowNotFound, "dup", "missing");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let err = map_delete_error(sqlx::Error::PoolTimedOut, "in use");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        assert!(violated_constraint(&sqlx::Error::RowNotFound).is_none());
    }
}
