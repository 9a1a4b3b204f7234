//! # Repository Module
//!
//! Database repository implementations for Till.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  till-cli command                                                      │
//! │       │                                                                 │
//! │       │  db.sessions().close_session(org, id, request)                 │
//! │       ▼                                                                 │
//! │  CashSessionRepository                                                 │
//! │  ├── open_session / close_session    (transactional writes)            │
//! │  ├── get_open / get_by_id            (state queries)                   │
//! │  └── preview_close / history         (read-only reports)               │
//! │       │                                                                 │
//! │       │  reads sales through                                            │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── record_sale / insert_sale                                         │
//! │  └── sales_since                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Timestamps
//! Every timestamp is bound as fixed-width RFC 3339 text with microsecond
//! precision and a `Z` suffix, so that `created_at >= ?` compares times
//! correctly as strings. [`now`] truncates to the same precision so that a
//! value read back equals the value written.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

pub mod sale;
pub mod session;

/// Current time at storage precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Text form of a timestamp as stored in the database.
pub(crate) fn db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_db_timestamp_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2026, 1, 31, 14, 5, 9).unwrap();
        assert_eq!(db_timestamp(&whole), "2026-01-31T14:05:09.000000Z");

        let later = whole + chrono::Duration::microseconds(1);
        assert!(db_timestamp(&later) > db_timestamp(&whole));
    }

    #[test]
    fn test_now_has_microsecond_precision() {
        let ts = now();
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000, 0);
    }
}
