//! # Repository Errors
//!
//! ```text
//!   sqlx::Error ─────────┐        CoreError (stock, links, carts)
//!                        ▼                 │
//!                    DbError ◄─── Rejected ┘
//!                        │
//!                        ▼
//!   ApiError in kulino-server: {error, message, ...details}
//! ```
//!
//! A rejection raised inside a unit of work is returned with `?`, which drops
//! the open transaction and rolls it back.

use kulino_core::{CoreError, ValidationError};
use thiserror::Error;

/// Everything a repository call can fail with.
#[derive(Debug, Error)]
pub enum DbError {
    /// Unknown id, or a row removed by a concurrent request.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A second ledger entry for the same sale or purchase.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Typically a size or menu that past sales still point at.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite refused the statement for any other reason (CHECK, I/O, ...).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No pooled connection, or the write lock stayed taken past busy_timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A business rule refused the operation; nothing was written.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Sorts a SQLite error message into a variant.
    ///
    /// SQLite reports constraints as `UNIQUE constraint failed: table.column`
    /// and `FOREIGN KEY constraint failed`.
    fn from_sqlite_message(msg: &str) -> Self {
        if let Some(column) = msg.strip_prefix("UNIQUE constraint failed: ") {
            DbError::UniqueViolation {
                field: column.to_string(),
                value: "unknown".to_string(),
            }
        } else if msg.contains("FOREIGN KEY constraint failed") {
            DbError::ForeignKeyViolation {
                message: msg.to_string(),
            }
        } else if msg.contains("database is locked") || msg.contains("database is busy") {
            DbError::PoolExhausted
        } else {
            DbError::QueryFailed(msg.to_string())
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Rejected(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_become_rejections() {
        let err: DbError = CoreError::SizeNotFound("s1".to_string()).into();
        assert!(matches!(err, DbError::Rejected(CoreError::SizeNotFound(_))));

        let err: DbError = ValidationError::required("buyerName").into();
        assert!(matches!(err, DbError::Rejected(CoreError::Validation(_))));
        assert_eq!(err.to_string(), "Validation error: buyerName is required");
    }

    #[test]
    fn test_sqlite_messages_are_classified() {
        assert!(matches!(
            DbError::from_sqlite_message("UNIQUE constraint failed: ledger_transactions.sale_id"),
            DbError::UniqueViolation { ref field, .. } if field == "ledger_transactions.sale_id"
        ));
        assert!(matches!(
            DbError::from_sqlite_message("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(
            DbError::from_sqlite_message("database is locked"),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from_sqlite_message("CHECK constraint failed: stock >= 0"),
            DbError::QueryFailed(_)
        ));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
