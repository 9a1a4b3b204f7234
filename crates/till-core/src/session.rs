//! # Session Transitions
//!
//! The register session state machine, as pure functions over
//! [`CashSession`]. Persisting the result (and enforcing "one open session
//! per organization" across terminals) is the job of till-db.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   (none) ──── open(OpenRequest) ────► Open ──── close(...) ────► Closed │
//! │                                        │                          │     │
//! │                                        │ sales accrue             │     │
//! │                                        │ (created_at >= opened_at)│     │
//! │                                        ▼                          ▼     │
//! │                                 compute_expected          immutable     │
//! │                                                                         │
//! │   Closed has no outgoing transition. There is no reopen.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::reconciliation::Reconciliation;
use crate::types::{CashSession, SessionState};
use crate::validation::{normalize_notes, require_non_negative, validate_organization_id};

// =============================================================================
// Requests
// =============================================================================

/// Everything needed to open a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub organization_id: String,
    pub opening_cash_local: Money,
    pub opening_cash_foreign: Money,
    pub notes: Option<String>,
    pub opened_by: Option<String>,
}

impl OpenRequest {
    pub fn new(
        organization_id: impl Into<String>,
        opening_cash_local: Money,
        opening_cash_foreign: Money,
    ) -> Self {
        OpenRequest {
            organization_id: organization_id.into(),
            opening_cash_local,
            opening_cash_foreign,
            notes: None,
            opened_by: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn opened_by(mut self, operator: impl Into<String>) -> Self {
        self.opened_by = Some(operator.into());
        self
    }
}

/// The operator's physical count at close time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    pub counted_cash_local: Money,
    pub counted_cash_foreign: Money,
    pub notes: Option<String>,
    pub closed_by: Option<String>,
}

impl CloseRequest {
    pub fn new(counted_cash_local: Money, counted_cash_foreign: Money) -> Self {
        CloseRequest {
            counted_cash_local,
            counted_cash_foreign,
            notes: None,
            closed_by: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn closed_by(mut self, operator: impl Into<String>) -> Self {
        self.closed_by = Some(operator.into());
        self
    }
}

// =============================================================================
// Transitions
// =============================================================================

impl CashSession {
    /// Builds a freshly opened session.
    ///
    /// ## Errors
    /// - `InvalidAmount` if either opening float is negative
    /// - `Validation` if the organization id is blank or the notes too long
    pub fn open(id: String, request: OpenRequest, now: DateTime<Utc>) -> CoreResult<CashSession> {
        validate_organization_id(&request.organization_id)?;
        let opening_local = require_non_negative("opening_cash_local", request.opening_cash_local)?;
        let opening_foreign =
            require_non_negative("opening_cash_foreign", request.opening_cash_foreign)?;
        let notes = normalize_notes("notes", request.notes.as_deref())?;

        Ok(CashSession {
            id,
            organization_id: request.organization_id,
            state: SessionState::Open,
            opened_at: now,
            closed_at: None,
            opening_cash_local_cents: opening_local.cents(),
            opening_cash_foreign_cents: opening_foreign.cents(),
            expected_cash_local_cents: None,
            expected_cash_foreign_cents: None,
            counted_cash_local_cents: None,
            counted_cash_foreign_cents: None,
            difference_local_cents: None,
            difference_foreign_cents: None,
            sales_cash_local_cents: 0,
            sales_cash_foreign_cents: 0,
            sales_card_cents: 0,
            sales_mobile_cents: 0,
            sales_transfer_cents: 0,
            sales_mixed_cents: 0,
            sale_count: 0,
            notes,
            closing_notes: None,
            opened_by: request.opened_by,
            closed_by: None,
            updated_at: now,
        })
    }

    /// Produces the closed version of this session.
    ///
    /// `reconciliation` must come from [`crate::compute_expected`] over the
    /// sales of this session's window. The differences are
    /// `counted - expected`, positive meaning surplus.
    ///
    /// ## Errors
    /// - `NotOpen` if the session is already closed
    /// - `InvalidAmount` if a counted amount is negative or a difference
    ///   leaves the `i64` range
    pub fn close(
        &self,
        reconciliation: &Reconciliation,
        request: CloseRequest,
        now: DateTime<Utc>,
    ) -> CoreResult<CashSession> {
        if !self.is_open() {
            return Err(CoreError::not_open(&self.id));
        }

        let counted_local = require_non_negative("counted_cash_local", request.counted_cash_local)?;
        let counted_foreign =
            require_non_negative("counted_cash_foreign", request.counted_cash_foreign)?;
        let closing_notes = normalize_notes("closing_notes", request.notes.as_deref())?;

        let (difference_local, difference_foreign) =
            reconciliation.differences(counted_local, counted_foreign)?;
        let totals = reconciliation.totals;

        Ok(CashSession {
            state: SessionState::Closed,
            closed_at: Some(now),
            expected_cash_local_cents: Some(reconciliation.expected_local.cents()),
            expected_cash_foreign_cents: Some(reconciliation.expected_foreign.cents()),
            counted_cash_local_cents: Some(counted_local.cents()),
            counted_cash_foreign_cents: Some(counted_foreign.cents()),
            difference_local_cents: Some(difference_local.cents()),
            difference_foreign_cents: Some(difference_foreign.cents()),
            sales_cash_local_cents: totals.cash_local.cents(),
            sales_cash_foreign_cents: totals.cash_foreign.cents(),
            sales_card_cents: totals.card.cents(),
            sales_mobile_cents: totals.mobile.cents(),
            sales_transfer_cents: totals.transfer.cents(),
            sales_mixed_cents: totals.mixed.cents(),
            sale_count: totals.count,
            closing_notes,
            closed_by: request.closed_by,
            updated_at: now,
            ..self.clone()
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::compute_expected;
    use crate::types::{Currency, NewSale, PaymentMethod, Sale};
    use chrono::Duration;

    fn money(major: i64) -> Money {
        Money::from_major_minor(major, 0)
    }

    fn open_session() -> CashSession {
        CashSession::open(
            "session-1".to_string(),
            OpenRequest::new("org-1", money(1000), money(50))
                .with_notes("  morning shift ")
                .opened_by("ana"),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_open_sets_initial_state() {
        let session = open_session();
        assert!(session.is_open());
        assert_eq!(session.opening_cash_local(), money(1000));
        assert_eq!(session.opening_cash_foreign(), money(50));
        assert_eq!(session.notes.as_deref(), Some("morning shift"));
        assert_eq!(session.opened_by.as_deref(), Some("ana"));
        assert!(session.closed_at.is_none());
        assert!(session.expected_local().is_none());
        assert_eq!(session.sales_totals(), crate::SalesTotals::default());
    }

    #[test]
    fn test_open_rejects_negative_opening() {
        let err = CashSession::open(
            "s".to_string(),
            OpenRequest::new("org-1", money(-1), money(0)),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidAmount { ref field, .. } if field == "opening_cash_local"
        ));
    }

    #[test]
    fn test_open_rejects_blank_organization() {
        let err = CashSession::open(
            "s".to_string(),
            OpenRequest::new("  ", money(0), money(0)),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_close_fills_close_out_fields() {
        let session = open_session();
        let at = session.opened_at + Duration::minutes(1);
        let sale = |major, currency, payment_method| {
            Sale::new(
                "x".to_string(),
                NewSale {
                    organization_id: "org-1".to_string(),
                    total: money(major),
                    currency,
                    payment_method,
                },
                at,
            )
            .unwrap()
        };
        let sales = [
            sale(300, Currency::Local, PaymentMethod::Cash),
            sale(20, Currency::Foreign, PaymentMethod::Cash),
            sale(150, Currency::Local, PaymentMethod::Card),
        ];
        let reconciliation = compute_expected(&session, &sales).unwrap();
        let closed_at = at + Duration::hours(8);

        let closed = session
            .close(
                &reconciliation,
                CloseRequest::new(money(1310), money(68))
                    .with_notes("counted twice")
                    .closed_by("luis"),
                closed_at,
            )
            .unwrap();

        assert_eq!(closed.state, SessionState::Closed);
        assert_eq!(closed.closed_at, Some(closed_at));
        assert_eq!(closed.expected_local(), Some(money(1300)));
        assert_eq!(closed.expected_foreign(), Some(money(70)));
        assert_eq!(closed.counted_local(), Some(money(1310)));
        assert_eq!(closed.difference_local(), Some(money(10)));
        assert_eq!(closed.difference_foreign(), Some(money(-2)));
        assert_eq!(closed.sales_card_cents, money(150).cents());
        assert_eq!(closed.other_methods_total(), money(150));
        assert_eq!(closed.sale_count, 3);
        assert_eq!(closed.notes.as_deref(), Some("morning shift"));
        assert_eq!(closed.closing_notes.as_deref(), Some("counted twice"));
        assert_eq!(closed.closed_by.as_deref(), Some("luis"));
        assert_eq!(closed.opened_at, session.opened_at);
    }

    #[test]
    fn test_close_twice_is_not_open() {
        let session = open_session();
        let reconciliation = compute_expected(&session, &[]).unwrap();
        let closed = session
            .close(&reconciliation, CloseRequest::new(money(1000), money(50)), Utc::now())
            .unwrap();

        let err = closed
            .close(&reconciliation, CloseRequest::new(money(1000), money(50)), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotOpen { ref session_id } if session_id == "session-1"));
    }

    #[test]
    fn test_close_rejects_negative_count() {
        let session = open_session();
        let reconciliation = compute_expected(&session, &[]).unwrap();
        let err = session
            .close(&reconciliation, CloseRequest::new(money(0), money(-5)), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidAmount { ref field, .. } if field == "counted_cash_foreign"
        ));
    }

    #[test]
    fn test_close_blank_notes_become_none() {
        let session = open_session();
        let reconciliation = compute_expected(&session, &[]).unwrap();
        let closed = session
            .close(
                &reconciliation,
                CloseRequest::new(money(1000), money(50)).with_notes("   "),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(closed.closing_notes, None);
        assert_eq!(closed.difference_local(), Some(Money::zero()));
    }
}
