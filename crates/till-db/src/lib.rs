//! # till-db: Database Layer for Till
//!
//! Persists register sessions and sales in SQLite, using sqlx for async
//! operations. The register rules themselves live in till-core; this crate
//! wraps them in transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Data Flow                                 │
//! │                                                                         │
//! │  till-cli command (open / close / status / history / sale)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │    │ CashSessionRepo    │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo           │  │ 001_init   │  │   │
//! │  │   └───────────────┘    └─────────┬──────────┘  └────────────┘  │   │
//! │  │                                  │ compute_expected, close      │   │
//! │  │                                  ▼                              │   │
//! │  │                              till-core                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and register-operation error types
//! - [`repository`] - Session and sale repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_core::session::{CloseRequest, OpenRequest};
//! use till_core::Money;
//! use till_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("till.db")).await?;
//!
//! let session = db
//!     .sessions()
//!     .open_session(OpenRequest::new("org-1", Money::from_cents(100_000), Money::zero()))
//!     .await?;
//!
//! let closed = db
//!     .sessions()
//!     .close_session("org-1", &session.id, CloseRequest::new(Money::from_cents(100_000), Money::zero()))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, SessionError, SessionResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::sale::SaleRepository;
pub use repository::session::{CashSessionRepository, ClosePreview};
