//! # Validation Module
//!
//! Input validation for register operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Calling layer (CLI / UI)                                     │
//! │  └── Raw strings as typed by the operator                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── parse_amount: "1310,50" style input → exact cents or error        │
//! │  └── normalize_notes: trim, empty → None, length cap                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on enum columns and opening amounts             │
//! │  └── Partial UNIQUE index: one open session per organization           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Empty or malformed amounts are errors. They are never silently read as
//! zero: a blank "counted cash" field would otherwise close the register
//! with a fabricated shortage.

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_NOTES_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amounts
// =============================================================================

/// Parses an operator-entered amount into exact cents.
///
/// ## Rules
/// - Surrounding whitespace is ignored, an optional leading `+` is allowed
/// - Either `.` or `,` is the decimal separator, at most once
/// - At most two fractional digits
/// - Negative, empty and non-numeric input is rejected
///
/// ## Example
/// ```rust
/// use till_core::validation::parse_amount;
///
/// assert_eq!(parse_amount("opening_local", "1310").unwrap().cents(), 131_000);
/// assert_eq!(parse_amount("opening_local", "12,5").unwrap().cents(), 1_250);
/// assert!(parse_amount("opening_local", "").is_err());
/// assert!(parse_amount("opening_local", "-3").is_err());
/// ```
pub fn parse_amount(field: &str, input: &str) -> ValidationResult<Money> {
    let raw = input.trim();

    if raw.is_empty() {
        return Err(ValidationError::invalid_amount(field, "value is empty"));
    }
    if raw.starts_with('-') {
        return Err(ValidationError::invalid_amount(field, "must not be negative"));
    }

    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let (whole, fraction) = match raw.find(|c: char| c == '.' || c == ',') {
        Some(idx) => (&raw[..idx], Some(&raw[idx + 1..])),
        None => (raw, None),
    };

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());

    if !is_digits(whole) {
        return Err(ValidationError::invalid_amount(field, format!("'{input}' is not a number")));
    }

    let fraction_cents = match fraction {
        None => 0,
        Some(digits) => {
            if digits.is_empty() || !is_digits(digits) {
                return Err(ValidationError::invalid_amount(
                    field,
                    format!("'{input}' is not a number"),
                ));
            }
            if digits.len() > 2 {
                return Err(ValidationError::invalid_amount(
                    field,
                    "at most two decimal places are allowed",
                ));
            }
            let value: i64 = digits
                .parse()
                .map_err(|_| ValidationError::invalid_amount(field, "invalid decimal part"))?;
            if digits.len() == 1 {
                value * 10
            } else {
                value
            }
        }
    };

    if whole.is_empty() && fraction.is_none() {
        return Err(ValidationError::invalid_amount(field, format!("'{input}' is not a number")));
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| ValidationError::invalid_amount(field, "value is too large"))?
    };

    whole_value
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction_cents))
        .map(Money::from_cents)
        .ok_or_else(|| ValidationError::invalid_amount(field, "value is too large"))
}

/// Rejects negative amounts that arrive already typed (not as text).
pub fn require_non_negative(field: &str, amount: Money) -> ValidationResult<Money> {
    if amount.is_negative() {
        return Err(ValidationError::invalid_amount(field, "must not be negative"));
    }
    Ok(amount)
}

// =============================================================================
// Free Text
// =============================================================================

/// Trims notes; blank notes become `None`.
///
/// ## Rules
/// - Maximum `MAX_NOTES_LEN` characters after trimming
pub fn normalize_notes(field: &str, notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTES_LEN,
        });
    }

    Ok(Some(notes.to_string()))
}

/// Validates an organization id.
pub fn validate_organization_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "organization_id".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
