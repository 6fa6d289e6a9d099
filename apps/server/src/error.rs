//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kulino POS                             │
//! │                                                                         │
//! │  Handler ─► Repository ─► Result<T, DbError>                            │
//! │                              │                                          │
//! │        ┌─────────────────────┼──────────────────────────┐               │
//! │        ▼                     ▼                          ▼               │
//! │  Rejected(CoreError)   NotFound / FK / Unique     QueryFailed, ...      │
//! │  400 / 404 / 409 / 422     404 / 409               500 (logged, masked) │
//! │        │                     │                          │               │
//! │        └─────────────────────┴──────────┬───────────────┘               │
//! │                                         ▼                               │
//! │            { "error": "STOCK_NOT_ENOUGH",                               │
//! │              "message": "Not enough stock for ...",                     │
//! │              "menuName": "Keripik", "sizeName": "Besar",                │
//! │              "remainingStock": 3, "requested": 5 }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};

use kulino_core::pdf::PdfError;
use kulino_core::{CoreError, ValidationError};
use kulino_db::DbError;

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock for a sale (400)
    StockNotEnough,

    /// The row is still referenced or already exists (409)
    Conflict,

    /// Stored data failed to decode (422)
    CorruptData,

    /// Database is busy (503)
    Busy,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::StockNotEnough => "STOCK_NOT_ENOUGH",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::CorruptData => "CORRUPT_DATA",
            ErrorCode::Busy => "BUSY",
            ErrorCode::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::StockNotEnough => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::CorruptData => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// { "error": "NOT_FOUND", "message": "Sale not found: 6f1c..." }
/// ```
/// `details` are flattened into the top-level object.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Map<String, Value>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: Map::new(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error. The message is never shown to the client.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Adds a detail field to the response body.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// The response body.
    pub fn body(&self) -> Value {
        let mut body = self.details.clone();
        body.insert("error".to_string(), json!(self.code.as_str()));
        body.insert("message".to_string(), json!(self.message));
        Value::Object(body)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code.as_str(), "{}", self.message);
        } else {
            tracing::warn!(code = self.code.as_str(), status = status.as_u16(), "{}", self.message);
        }

        let body = if self.code == ErrorCode::Internal {
            json!({ "error": self.code.as_str(), "message": "Internal server error" })
        } else {
            self.body()
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::new(
                ErrorCode::NotFound,
                format!("{} not found: {}", entity, id),
            ),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::debug!("Foreign key violation: {}", message);
                ApiError::new(
                    ErrorCode::Conflict,
                    "Record is still referenced by other records",
                )
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::Busy, "Database is busy, try again")
            }
            DbError::Rejected(core) => ApiError::from(core),
            DbError::ConnectionFailed(e) => {
                ApiError::internal(format!("Database connection failed: {}", e))
            }
            DbError::MigrationFailed(e) => {
                ApiError::internal(format!("Database migration failed: {}", e))
            }
            DbError::QueryFailed(e) => ApiError::internal(format!("Database query failed: {}", e)),
            DbError::Internal(e) => ApiError::internal(format!("Internal database error: {}", e)),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::SizeNotFound(id) => {
                ApiError::new(ErrorCode::NotFound, message).with_detail("sizeId", id)
            }
            CoreError::StockNotEnough {
                menu_name,
                size_name,
                remaining_stock,
                requested,
            } => ApiError::new(ErrorCode::StockNotEnough, message)
                .with_detail("menuName", menu_name)
                .with_detail("sizeName", size_name)
                .with_detail("remainingStock", remaining_stock)
                .with_detail("requested", requested),
            CoreError::LinkedTransaction { id, owner } => ApiError::new(ErrorCode::Conflict, message)
                .with_detail("transactionId", id)
                .with_detail("owner", owner),
            CoreError::InvalidPreOrderStatus { status, .. } => {
                ApiError::new(ErrorCode::Conflict, message).with_detail("status", status)
            }
            CoreError::CorruptCart { .. } => ApiError::new(ErrorCode::CorruptData, message),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let field = err.field().to_string();
        ApiError::validation(err.to_string()).with_detail("field", field)
    }
}

impl From<PdfError> for ApiError {
    fn from(err: PdfError) -> Self {
        ApiError::internal(err.to_string())
    }
}
