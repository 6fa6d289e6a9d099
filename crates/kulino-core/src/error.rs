//! # Domain Errors
//!
//! Refusals raised by the pure planning code, before storage is touched.
//!
//! ```text
//!   ValidationError ──► CoreError ──► DbError::Rejected ──► ApiError
//!   (bad field)         (bad state)   (kulino-db)           (kulino-server)
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Every variant is raised before any row is touched, so callers can treat
/// them as "nothing happened".
#[derive(Debug, Error)]
pub enum CoreError {
    /// A requested size id does not exist in the catalog.
    #[error("Size not found: {0}")]
    SizeNotFound(String),

    /// Not enough stock to cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: Keripik (Besar) x5
    ///      │
    ///      ▼
    /// plan_sale: stock 3 (+0 restored)
    ///      │
    ///      ▼
    /// StockNotEnough { menu_name: "Keripik", size_name: "Besar",
    ///                  remaining_stock: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Stok Keripik (Besar) tinggal 3"
    /// ```
    #[error("Not enough stock for {menu_name} ({size_name}): remaining {remaining_stock}, requested {requested}")]
    StockNotEnough {
        menu_name: String,
        size_name: String,
        remaining_stock: i64,
        requested: i64,
    },

    /// A ledger entry owned by a sale or a raw material purchase was edited
    /// directly. Those are changed through their owner.
    #[error("Transaction {id} belongs to a {owner} and cannot be edited directly")]
    LinkedTransaction { id: String, owner: String },

    /// A pre-order cannot be converted in its current status.
    #[error("Pre-order {id} is {status}, cannot convert")]
    InvalidPreOrderStatus { id: String, status: String },

    /// A stored pre-order cart failed to decode or validate.
    #[error("Corrupt pre-order cart: {reason}")]
    CorruptCart { reason: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single offending request field.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing, or blank after trimming.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Unparseable date, type or JSON.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
