//! Store Errors
//!
//! Error types for credential store operations.

/// Errors that can occur in the credential store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A referenced row does not exist
    #[error("Referenced record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write
    #[error("Constraint violation: {0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Store could not serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return StoreError::NotFound;
        }

        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return StoreError::Conflict(
                        db_err.constraint().unwrap_or("unique").to_string(),
                    );
                }
                Some(FOREIGN_KEY_VIOLATION) => return StoreError::NotFound,
                _ => {}
            }
        }

        StoreError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_pool_errors_stay_database_errors() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_conflict());
    }
}
