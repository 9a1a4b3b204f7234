//! # till-core: Pure Business Logic for the Cash Register
//!
//! This crate is the **heart** of Till. It contains the register session
//! state machine and the close-out reconciliation as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    till-cli (operator commands)                 │   │
//! │  │          open ──► sale ──► status ──► close ──► history         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   money   │  │  session /  │  │validation│  │   │
//! │  │   │CashSession│  │   Money   │  │ reconcile   │  │ amounts  │  │   │
//! │  │   │   Sale    │  │ (cents)   │  │ state mach. │  │  notes   │  │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Database Layer)                     │   │
//! │  │       SQLite transactions, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CashSession, Sale, Currency, PaymentMethod)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Amount parsing and input rules
//! - [`reconciliation`] - Bucketing of sales and expected-cash figures
//! - [`session`] - Open/close transitions of a register session
//! - [`permissions`] - Which roles may open or close the register
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use till_core::session::{CloseRequest, OpenRequest};
//! use till_core::{compute_expected, CashSession, Money};
//!
//! let session = CashSession::open(
//!     "session-1".to_string(),
//!     OpenRequest::new("org-1", Money::from_major_minor(1000, 0), Money::from_major_minor(50, 0)),
//!     Utc::now(),
//! )
//! .unwrap();
//!
//! // No sales yet: the drawer should hold exactly the opening float.
//! let reconciliation = compute_expected(&session, &[]).unwrap();
//! assert_eq!(reconciliation.expected_local, Money::from_major_minor(1000, 0));
//!
//! let closed = session
//!     .close(
//!         &reconciliation,
//!         CloseRequest::new(Money::from_major_minor(1000, 0), Money::from_major_minor(49, 0)),
//!         Utc::now(),
//!     )
//!     .unwrap();
//! assert_eq!(closed.difference_foreign(), Some(Money::from_major_minor(-1, 0)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod permissions;
pub mod reconciliation;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use permissions::{authorize, Permission, Role};
pub use reconciliation::{compute_expected, Discrepancy, Reconciliation, SalesTotals, TenderBucket};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Organization used when the caller does not configure one.
///
/// The schema is multi-tenant; a single-store install simply runs every
/// operation under this id.
pub const DEFAULT_ORGANIZATION_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum length of opening or closing notes.
pub const MAX_NOTES_LEN: usize = 500;

/// Default number of closed sessions returned by a history query.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;
