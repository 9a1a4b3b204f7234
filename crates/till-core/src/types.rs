//! # Domain Types
//!
//! Core domain types used throughout Till.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌─────────────────────┐               │
//! │  │     CashSession      │        │        Sale         │               │
//! │  │  ──────────────────  │        │  ─────────────────  │               │
//! │  │  id (UUID)           │        │  id (UUID)          │               │
//! │  │  organization_id     │◄──────►│  organization_id    │               │
//! │  │  state               │ window │  total_cents        │               │
//! │  │  opened_at/closed_at │        │  currency           │               │
//! │  │  opening / expected  │        │  payment_method     │               │
//! │  │  counted / diff      │        │  created_at         │               │
//! │  │  sales_* totals      │        └─────────────────────┘               │
//! │  └──────────────────────┘                                               │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  SessionState   │   │    Currency     │   │  PaymentMethod  │       │
//! │  │  Open           │   │  Local  (Bs.)   │   │  Cash           │       │
//! │  │  Closed         │   │  Foreign (USD)  │   │  Card           │       │
//! │  └─────────────────┘   └─────────────────┘   │  MobilePayment  │       │
//! │                                              │  BankTransfer   │       │
//! │                                              │  Mixed          │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sale belongs to a session implicitly: it falls inside the session's
//! window when it has the same organization and `created_at >= opened_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::reconciliation::SalesTotals;

// =============================================================================
// Currency
// =============================================================================

/// The two physical drawers of the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// Local currency, e.g. bolívares (`Bs.`).
    Local,
    /// Foreign currency, e.g. US dollars.
    Foreign,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Local, Currency::Foreign];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Currency::Local => "local",
            Currency::Foreign => "foreign",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ValidationError::not_allowed("currency", &Currency::ALL.map(|c| c.as_str()))
            })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid. Closed set: reconciliation matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash, lands in the drawer of the sale's currency.
    Cash,
    /// Card on the point-of-sale terminal.
    Card,
    /// Mobile payment (bank-to-phone transfer).
    MobilePayment,
    /// Ordinary bank transfer.
    BankTransfer,
    /// Split across several methods.
    Mixed,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::MobilePayment,
        PaymentMethod::BankTransfer,
        PaymentMethod::Mixed,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobilePayment => "mobile_payment",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Mixed => "mixed",
        }
    }

    /// Whether the money physically ends up in the register drawer.
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    /// Accepts the snake_case tag, with `-` allowed in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| {
                ValidationError::not_allowed(
                    "payment_method",
                    &PaymentMethod::ALL.map(|m| m.as_str()),
                )
            })
    }
}

// =============================================================================
// Session State
// =============================================================================

/// `Open --close--> Closed`. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    Closed,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionState::Open => "open",
            SessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale, as far as the register cares about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub organization_id: String,
    /// Sale total in cents of `currency`.
    pub total_cents: i64,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Builds a sale from a request, rejecting negative totals.
    pub fn new(id: String, request: NewSale, created_at: DateTime<Utc>) -> CoreResult<Self> {
        if request.total.is_negative() {
            return Err(CoreError::InvalidAmount {
                field: "total".to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        Ok(Sale {
            id,
            organization_id: request.organization_id,
            total_cents: request.total.cents(),
            currency: request.currency,
            payment_method: request.payment_method,
            created_at,
        })
    }

    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Input of the sale intake path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub organization_id: String,
    pub total: Money,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
}

// =============================================================================
// Cash Session
// =============================================================================

/// One open/close cycle of an organization's cash register.
///
/// ## Field Groups
/// ```text
/// opening_*      set once by `open`
/// sales_*        per-bucket totals, written by `close`
/// expected_*     opening + cash sales of that currency, written by `close`
/// counted_*      operator's physical count, written by `close`
/// difference_*   counted - expected (positive = surplus), written by `close`
/// ```
///
/// The close-time fields are `None` while the session is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    pub organization_id: String,
    pub state: SessionState,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,

    pub opening_cash_local_cents: i64,
    pub opening_cash_foreign_cents: i64,

    pub expected_cash_local_cents: Option<i64>,
    pub expected_cash_foreign_cents: Option<i64>,
    pub counted_cash_local_cents: Option<i64>,
    pub counted_cash_foreign_cents: Option<i64>,
    pub difference_local_cents: Option<i64>,
    pub difference_foreign_cents: Option<i64>,

    pub sales_cash_local_cents: i64,
    pub sales_cash_foreign_cents: i64,
    pub sales_card_cents: i64,
    pub sales_mobile_cents: i64,
    pub sales_transfer_cents: i64,
    pub sales_mixed_cents: i64,
    pub sale_count: i64,

    /// Remark entered when opening.
    pub notes: Option<String>,
    /// Remark entered when closing.
    pub closing_notes: Option<String>,
    pub opened_by: Option<String>,
    pub closed_by: Option<String>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CashSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    #[inline]
    pub fn opening_cash_local(&self) -> Money {
        Money::from_cents(self.opening_cash_local_cents)
    }

    #[inline]
    pub fn opening_cash_foreign(&self) -> Money {
        Money::from_cents(self.opening_cash_foreign_cents)
    }

    /// Opening float of the given drawer.
    pub fn opening_cash(&self, currency: Currency) -> Money {
        match currency {
            Currency::Local => self.opening_cash_local(),
            Currency::Foreign => self.opening_cash_foreign(),
        }
    }

    pub fn expected_local(&self) -> Option<Money> {
        self.expected_cash_local_cents.map(Money::from_cents)
    }

    pub fn expected_foreign(&self) -> Option<Money> {
        self.expected_cash_foreign_cents.map(Money::from_cents)
    }

    pub fn counted_local(&self) -> Option<Money> {
        self.counted_cash_local_cents.map(Money::from_cents)
    }

    pub fn counted_foreign(&self) -> Option<Money> {
        self.counted_cash_foreign_cents.map(Money::from_cents)
    }

    pub fn difference_local(&self) -> Option<Money> {
        self.difference_local_cents.map(Money::from_cents)
    }

    pub fn difference_foreign(&self) -> Option<Money> {
        self.difference_foreign_cents.map(Money::from_cents)
    }

    /// Per-bucket sales totals stored on the session.
    pub fn sales_totals(&self) -> SalesTotals {
        SalesTotals {
            cash_local: Money::from_cents(self.sales_cash_local_cents),
            cash_foreign: Money::from_cents(self.sales_cash_foreign_cents),
            card: Money::from_cents(self.sales_card_cents),
            mobile: Money::from_cents(self.sales_mobile_cents),
            transfer: Money::from_cents(self.sales_transfer_cents),
            mixed: Money::from_cents(self.sales_mixed_cents),
            count: self.sale_count,
        }
    }

    /// Card + mobile + transfer + mixed, the "other methods" column of the
    /// close-out history.
    pub fn other_methods_total(&self) -> Money {
        self.sales_totals().non_cash_total()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(
            "mobile-payment".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::MobilePayment
        );
        assert_eq!(
            " Bank_Transfer ".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );

        let err = "cheque".parse::<PaymentMethod>().unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { ref field, .. } if field == "payment_method"));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("LOCAL".parse::<Currency>().unwrap(), Currency::Local);
        assert_eq!("foreign".parse::<Currency>().unwrap(), Currency::Foreign);
        assert!("usd".parse::<Currency>().is_err());
    }

    #[test]
    fn test_serde_tags() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::MobilePayment).unwrap(),
            "\"mobile_payment\""
        );
        assert_eq!(serde_json::to_string(&SessionState::Closed).unwrap(), "\"closed\"");
        assert_eq!(serde_json::to_string(&Currency::Foreign).unwrap(), "\"foreign\"");
    }

    #[test]
    fn test_sale_rejects_negative_total() {
        let request = NewSale {
            organization_id: "org-1".to_string(),
            total: Money::from_cents(-1),
            currency: Currency::Local,
            payment_method: PaymentMethod::Cash,
        };
        let err = Sale::new("s-1".to_string(), request, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }

    #[test]
    fn test_only_cash_is_cash() {
        let cash: Vec<_> = PaymentMethod::ALL.into_iter().filter(|m| m.is_cash()).collect();
        assert_eq!(cash, vec![PaymentMethod::Cash]);
    }
}
