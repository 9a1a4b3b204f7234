//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Register rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── SessionError     - CoreError | DbError for register operations    │
//! │                                                                         │
//! │  till-cli errors (in app)                                              │
//! │  └── ApiError         - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Register business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An open session already exists for the organization.
    ///
    /// ## When This Occurs
    /// - Opening the register twice in a row
    /// - Two terminals racing to open the same organization's register
    ///   (the loser of the race gets this error, never a second open row)
    #[error("A cash register session is already open for organization {organization_id}")]
    AlreadyOpen { organization_id: String },

    /// The targeted session is not open.
    ///
    /// ## When This Occurs
    /// - Closing a session that was already closed
    /// - Second request of a double-close race
    /// - Previewing a close when no register is open
    #[error("Cash register session {session_id} is not open")]
    NotOpen { session_id: String },

    /// A monetary input is non-numeric, negative or too precise.
    #[error("Invalid amount for {field}: {reason}")]
    InvalidAmount { field: String, reason: String },

    /// Session does not exist for the organization.
    #[error("Cash register session not found: {0}")]
    SessionNotFound(String),

    /// The operator's role does not grant the requested action.
    #[error("Role {role} is not allowed to {permission}")]
    PermissionDenied { role: String, permission: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(ValidationError),
}

impl CoreError {
    /// Creates a NotOpen error for a session id.
    pub fn not_open(session_id: impl Into<String>) -> Self {
        CoreError::NotOpen {
            session_id: session_id.into(),
        }
    }

    /// Creates an InvalidAmount error for a total that no longer fits in
    /// an `i64` count of cents.
    pub fn amount_out_of_range(field: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            field: field.into(),
            reason: "total is out of range".to_string(),
        }
    }
}

/// Amount problems surface as `InvalidAmount`; everything else stays a
/// generic validation failure.
impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidAmount { field, reason } => {
                CoreError::InvalidAmount { field, reason }
            }
            other => CoreError::Validation(other),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Amount could not be turned into a non-negative number of cents.
    #[error("{field} is not a valid amount: {reason}")]
    InvalidAmount { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub(crate) fn invalid_amount(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidAmount {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_allowed(field: &str, allowed: &[&str]) -> Self {
        ValidationError::NotAllowed {
            field: field.to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
