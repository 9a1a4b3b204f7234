//! # Reconciliation
//!
//! Turns the sales of a session window into per-method totals and the cash
//! the drawers should hold.
//!
//! ## Bucketing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale (method, currency, total)            Bucket                      │
//! │  ───────────────────────────────           ─────────────               │
//! │  Cash          + Local              ──►    CashLocal     ─┐            │
//! │  Cash          + Foreign            ──►    CashForeign   ─┤ in drawer  │
//! │  Card          + any currency       ──►    Card           │            │
//! │  MobilePayment + any currency       ──►    Mobile         │ informa-   │
//! │  BankTransfer  + any currency       ──►    Transfer       │ tional     │
//! │  Mixed         + any currency       ──►    Mixed          │ only       │
//! │                                                                         │
//! │  expected_local   = opening_local   + CashLocal                        │
//! │  expected_foreign = opening_foreign + CashForeign                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Non-cash money never reaches the drawer, so it never feeds an expected
//! figure.
//!
//! Every sum here is checked: a total that leaves the `i64` range is an
//! `InvalidAmount` error, never a wrapped value written to a closed session.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CashSession, Currency, PaymentMethod, Sale};

// =============================================================================
// Tender Bucket
// =============================================================================

/// The six totals kept per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TenderBucket {
    CashLocal,
    CashForeign,
    Card,
    Mobile,
    Transfer,
    Mixed,
}

impl TenderBucket {
    pub const ALL: [TenderBucket; 6] = [
        TenderBucket::CashLocal,
        TenderBucket::CashForeign,
        TenderBucket::Card,
        TenderBucket::Mobile,
        TenderBucket::Transfer,
        TenderBucket::Mixed,
    ];

    /// Bucket a sale lands in. Only cash is split by currency.
    pub const fn for_sale(method: PaymentMethod, currency: Currency) -> Self {
        match (method, currency) {
            (PaymentMethod::Cash, Currency::Local) => TenderBucket::CashLocal,
            (PaymentMethod::Cash, Currency::Foreign) => TenderBucket::CashForeign,
            (PaymentMethod::Card, _) => TenderBucket::Card,
            (PaymentMethod::MobilePayment, _) => TenderBucket::Mobile,
            (PaymentMethod::BankTransfer, _) => TenderBucket::Transfer,
            (PaymentMethod::Mixed, _) => TenderBucket::Mixed,
        }
    }

    pub const fn is_cash(&self) -> bool {
        matches!(self, TenderBucket::CashLocal | TenderBucket::CashForeign)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            TenderBucket::CashLocal => "cash (local)",
            TenderBucket::CashForeign => "cash (foreign)",
            TenderBucket::Card => "card",
            TenderBucket::Mobile => "mobile payment",
            TenderBucket::Transfer => "bank transfer",
            TenderBucket::Mixed => "mixed",
        }
    }
}

// =============================================================================
// Sales Totals
// =============================================================================

/// Accumulated sales of one session window, per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesTotals {
    pub cash_local: Money,
    pub cash_foreign: Money,
    pub card: Money,
    pub mobile: Money,
    pub transfer: Money,
    pub mixed: Money,
    /// Number of sales of any method.
    pub count: i64,
}

impl SalesTotals {
    /// Adds one sale to its bucket.
    ///
    /// ## Errors
    /// - `InvalidAmount` if the bucket total would overflow; `self` is left
    ///   unchanged
    pub fn record(&mut self, sale: &Sale) -> CoreResult<()> {
        let bucket = TenderBucket::for_sale(sale.payment_method, sale.currency);
        let slot = self.bucket_mut(bucket);
        *slot = slot
            .checked_add(sale.total())
            .ok_or_else(|| CoreError::amount_out_of_range(bucket.label()))?;
        self.count += 1;
        Ok(())
    }

    pub fn get(&self, bucket: TenderBucket) -> Money {
        match bucket {
            TenderBucket::CashLocal => self.cash_local,
            TenderBucket::CashForeign => self.cash_foreign,
            TenderBucket::Card => self.card,
            TenderBucket::Mobile => self.mobile,
            TenderBucket::Transfer => self.transfer,
            TenderBucket::Mixed => self.mixed,
        }
    }

    fn bucket_mut(&mut self, bucket: TenderBucket) -> &mut Money {
        match bucket {
            TenderBucket::CashLocal => &mut self.cash_local,
            TenderBucket::CashForeign => &mut self.cash_foreign,
            TenderBucket::Card => &mut self.card,
            TenderBucket::Mobile => &mut self.mobile,
            TenderBucket::Transfer => &mut self.transfer,
            TenderBucket::Mixed => &mut self.mixed,
        }
    }

    /// `(bucket, amount)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (TenderBucket, Money)> + '_ {
        TenderBucket::ALL.into_iter().map(move |b| (b, self.get(b)))
    }

    /// Cash sales of one currency.
    pub fn cash(&self, currency: Currency) -> Money {
        match currency {
            Currency::Local => self.cash_local,
            Currency::Foreign => self.cash_foreign,
        }
    }

    /// Card + mobile + transfer + mixed.
    ///
    /// Saturates at `i64::MAX` cents. Totals produced by
    /// [`compute_expected`] are guaranteed not to reach it.
    pub fn non_cash_total(&self) -> Money {
        self.checked_non_cash_total()
            .unwrap_or(Money::from_cents(i64::MAX))
    }

    fn checked_non_cash_total(&self) -> Option<Money> {
        self.iter()
            .filter(|(bucket, _)| !bucket.is_cash())
            .try_fold(Money::zero(), |total, (_, amount)| total.checked_add(amount))
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Expected drawer contents for a session, before the operator counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub totals: SalesTotals,
    pub expected_local: Money,
    pub expected_foreign: Money,
}

impl Reconciliation {
    pub fn expected(&self, currency: Currency) -> Money {
        match currency {
            Currency::Local => self.expected_local,
            Currency::Foreign => self.expected_foreign,
        }
    }

    /// `counted - expected` per currency; positive is a surplus.
    pub fn differences(
        &self,
        counted_local: Money,
        counted_foreign: Money,
    ) -> CoreResult<(Money, Money)> {
        let difference_local = counted_local
            .checked_sub(self.expected_local)
            .ok_or_else(|| CoreError::amount_out_of_range("difference_local"))?;
        let difference_foreign = counted_foreign
            .checked_sub(self.expected_foreign)
            .ok_or_else(|| CoreError::amount_out_of_range("difference_foreign"))?;
        Ok((difference_local, difference_foreign))
    }
}

/// Computes what the drawers should hold at close time.
///
/// `sales` is the result of the "sales since open" query. Sales belonging to
/// another organization or dated before `opened_at` are ignored, so a
/// sloppy caller cannot leak another tenant's cash into this drawer.
///
/// ## Errors
/// - `InvalidAmount` if a bucket, an expected figure or the non-cash total
///   leaves the `i64` range of cents
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use till_core::session::OpenRequest;
/// use till_core::{compute_expected, CashSession, Currency, Money, NewSale, PaymentMethod, Sale};
///
/// let opened_at = Utc::now();
/// let session = CashSession::open(
///     "s-1".into(),
///     OpenRequest::new("org-1", Money::from_major_minor(1000, 0), Money::from_major_minor(50, 0)),
///     opened_at,
/// )
/// .unwrap();
///
/// let sale = |total: i64, currency, payment_method| {
///     Sale::new(
///         "x".into(),
///         NewSale { organization_id: "org-1".into(), total: Money::from_major_minor(total, 0), currency, payment_method },
///         opened_at,
///     )
///     .unwrap()
/// };
/// let sales = [
///     sale(300, Currency::Local, PaymentMethod::Cash),
///     sale(20, Currency::Foreign, PaymentMethod::Cash),
///     sale(150, Currency::Foreign, PaymentMethod::Card),
/// ];
///
/// let r = compute_expected(&session, &sales).unwrap();
/// assert_eq!(r.expected_local, Money::from_major_minor(1300, 0));
/// assert_eq!(r.expected_foreign, Money::from_major_minor(70, 0));
/// assert_eq!(r.totals.card, Money::from_major_minor(150, 0));
/// assert_eq!(r.totals.count, 3);
/// ```
pub fn compute_expected(session: &CashSession, sales: &[Sale]) -> CoreResult<Reconciliation> {
    let mut totals = SalesTotals::default();

    for sale in sales
        .iter()
        .filter(|s| s.organization_id == session.organization_id)
        .filter(|s| s.created_at >= session.opened_at)
    {
        totals.record(sale)?;
    }

    totals
        .checked_non_cash_total()
        .ok_or_else(|| CoreError::amount_out_of_range("other_methods_total"))?;

    let expected_local = session
        .opening_cash_local()
        .checked_add(totals.cash_local)
        .ok_or_else(|| CoreError::amount_out_of_range("expected_cash_local"))?;
    let expected_foreign = session
        .opening_cash_foreign()
        .checked_add(totals.cash_foreign)
        .ok_or_else(|| CoreError::amount_out_of_range("expected_cash_foreign"))?;

    Ok(Reconciliation {
        totals,
        expected_local,
        expected_foreign,
    })
}

/// How a close-out difference reads to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum Discrepancy {
    Balanced,
    /// More cash than expected.
    Surplus(Money),
    /// Less cash than expected; the amount is positive.
    Shortage(Money),
}

impl Discrepancy {
    pub fn from_difference(difference: Money) -> Self {
        if difference.is_positive() {
            Discrepancy::Surplus(difference)
        } else if difference.is_negative() {
            Discrepancy::Shortage(difference.abs())
        } else {
            Discrepancy::Balanced
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
