//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Till                                   │
//! │                                                                         │
//! │  Command Function  →  Result<Output, ApiError>                         │
//! │         │                                                               │
//! │         ├── ValidationError (amount typo)   ─┐                         │
//! │         ├── CoreError (AlreadyOpen, ...)    ─┤                         │
//! │         ├── SessionError (Domain | Storage) ─┼──► ApiError { code,     │
//! │         └── DbError (pool, query)           ─┘               message } │
//! │                                                                         │
//! │  text mode:  stderr  "error[ALREADY_OPEN]: A cash register ..."        │
//! │  --json:     stdout  {"code":"ALREADY_OPEN","message":"..."}           │
//! │                                                                         │
//! │  Storage details are logged, the operator sees a generic message.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use till_core::{CoreError, ValidationError};
use till_db::{DbError, SessionError};

/// Error returned from CLI commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_OPEN",
///   "message": "Cash register session 4f1c... is not open"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The organization already has an open register
    AlreadyOpen,

    /// The targeted session (or organization) has no open register
    NotOpen,

    /// An amount is empty, non-numeric, negative or too precise
    InvalidAmount,

    /// Session or record does not exist
    NotFound,

    /// The operator's role does not allow the command
    PermissionDenied,

    /// Any other input problem
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AlreadyOpen => "ALREADY_OPEN",
            ErrorCode::NotOpen => "NOT_OPEN",
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                tracing::error!(%field, %value, "Unique constraint violated");
                ApiError::new(ErrorCode::DatabaseError, "Record already exists")
            }
            DbError::ConstraintViolation(e) => {
                tracing::error!("Constraint violation: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database rejected the change")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::AlreadyOpen { .. } => ApiError::new(ErrorCode::AlreadyOpen, message),
            CoreError::NotOpen { .. } => ApiError::new(ErrorCode::NotOpen, message),
            CoreError::InvalidAmount { .. } => ApiError::new(ErrorCode::InvalidAmount, message),
            CoreError::SessionNotFound(id) => ApiError::not_found("Cash register session", &id),
            CoreError::PermissionDenied { .. } => {
                ApiError::new(ErrorCode::PermissionDenied, message)
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Domain(e) => e.into(),
            SessionError::Storage(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[{}]: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}
