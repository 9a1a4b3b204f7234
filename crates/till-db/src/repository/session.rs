//! # Cash Session Repository
//!
//! Persistence of register sessions, including the two transitions.
//!
//! ## Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OPEN                                                                   │
//! │    INSERT ... state = 'open'                                           │
//! │      └── partial UNIQUE index (organization_id) WHERE state = 'open'   │
//! │          rejects the loser of a race → AlreadyOpen                     │
//! │                                                                         │
//! │  CLOSE (one transaction)                                               │
//! │    1. claim:  UPDATE ... SET updated_at WHERE id, org, state='open'    │
//! │               takes the write lock first; 0 rows → NotOpen / NotFound │
//! │    2. read:   session row + sales since opened_at                      │
//! │    3. compute expected / differences (till-core)                       │
//! │    4. write:  UPDATE ... WHERE id, org, state='open'                   │
//! │    5. commit                                                            │
//! │                                                                         │
//! │  A second closer blocks on the write lock in step 1, then sees         │
//! │  state = 'closed' and gets NotOpen.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Claiming before reading matters: a deferred SQLite transaction that reads
//! first and writes later fails with `SQLITE_BUSY` instead of waiting when
//! another writer committed in between.

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::sale::fetch_sales_since;
use super::{db_timestamp, now};
use crate::error::{DbResult, SessionError, SessionResult};
use till_core::session::{CloseRequest, OpenRequest};
use till_core::{compute_expected, CashSession, CoreError, Reconciliation};

const SESSION_COLUMNS: &str = r#"
    id, organization_id, state, opened_at, closed_at,
    opening_cash_local_cents, opening_cash_foreign_cents,
    expected_cash_local_cents, expected_cash_foreign_cents,
    counted_cash_local_cents, counted_cash_foreign_cents,
    difference_local_cents, difference_foreign_cents,
    sales_cash_local_cents, sales_cash_foreign_cents,
    sales_card_cents, sales_mobile_cents, sales_transfer_cents, sales_mixed_cents,
    sale_count, notes, closing_notes, opened_by, closed_by, updated_at
"#;

/// What the close form shows before the operator counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosePreview {
    pub session: CashSession,
    pub reconciliation: Reconciliation,
}

/// Repository for cash register sessions.
#[derive(Debug, Clone)]
pub struct CashSessionRepository {
    pool: SqlitePool,
}

impl CashSessionRepository {
    /// Creates a new CashSessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashSessionRepository { pool }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Opens the register for `request.organization_id`.
    ///
    /// ## Errors
    /// - `AlreadyOpen` if the organization has an open session (nothing is
    ///   written)
    /// - `InvalidAmount` / `Validation` for bad input
    pub async fn open_session(&self, request: OpenRequest) -> SessionResult<CashSession> {
        let session = CashSession::open(Uuid::new_v4().to_string(), request, now())?;

        let result = sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, organization_id, state, opened_at,
                opening_cash_local_cents, opening_cash_foreign_cents,
                notes, opened_by, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&session.id)
        .bind(&session.organization_id)
        .bind(session.state)
        .bind(db_timestamp(&session.opened_at))
        .bind(session.opening_cash_local_cents)
        .bind(session.opening_cash_foreign_cents)
        .bind(&session.notes)
        .bind(&session.opened_by)
        .bind(db_timestamp(&session.updated_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(
                    session_id = %session.id,
                    organization_id = %session.organization_id,
                    opening_cash_local_cents = session.opening_cash_local_cents,
                    opening_cash_foreign_cents = session.opening_cash_foreign_cents,
                    "Cash session opened"
                );
                Ok(session)
            }
            Err(err) => {
                let err = crate::DbError::from(err);
                if err.is_open_session_conflict() {
                    warn!(organization_id = %session.organization_id, "Register already open");
                    Err(CoreError::AlreadyOpen {
                        organization_id: session.organization_id,
                    }
                    .into())
                } else {
                    Err(err.into())
                }
            }
        }
    }

    /// Closes an open session: reads its sales, computes the expected cash
    /// and stores counted amounts and differences, all in one transaction.
    ///
    /// ## Errors
    /// - `SessionNotFound` if no session `session_id` exists for the
    ///   organization
    /// - `NotOpen` if it is already closed (including losing a close race)
    /// - `InvalidAmount` for a negative count
    pub async fn close_session(
        &self,
        organization_id: &str,
        session_id: &str,
        request: CloseRequest,
    ) -> SessionResult<CashSession> {
        let mut tx = self.pool.begin().await?;
        let closed_at = now();

        let claimed = sqlx::query(
            r#"
            UPDATE cash_sessions SET updated_at = ?1
            WHERE id = ?2 AND organization_id = ?3 AND state = 'open'
            "#,
        )
        .bind(db_timestamp(&closed_at))
        .bind(session_id)
        .bind(organization_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            let err = match fetch_session(&mut tx, organization_id, session_id).await? {
                Some(_) => CoreError::not_open(session_id),
                None => CoreError::SessionNotFound(session_id.to_string()),
            };
            tx.rollback().await?;
            return Err(err.into());
        }

        let session = fetch_session(&mut tx, organization_id, session_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;

        let sales = fetch_sales_since(&mut tx, organization_id, &session.opened_at).await?;
        let reconciliation = compute_expected(&session, &sales)?;
        let closed = session.close(&reconciliation, request, closed_at)?;

        let written = sqlx::query(
            r#"
            UPDATE cash_sessions SET
                state = ?1,
                closed_at = ?2,
                expected_cash_local_cents = ?3,
                expected_cash_foreign_cents = ?4,
                counted_cash_local_cents = ?5,
                counted_cash_foreign_cents = ?6,
                difference_local_cents = ?7,
                difference_foreign_cents = ?8,
                sales_cash_local_cents = ?9,
                sales_cash_foreign_cents = ?10,
                sales_card_cents = ?11,
                sales_mobile_cents = ?12,
                sales_transfer_cents = ?13,
                sales_mixed_cents = ?14,
                sale_count = ?15,
                closing_notes = ?16,
                closed_by = ?17,
                updated_at = ?18
            WHERE id = ?19 AND organization_id = ?20 AND state = 'open'
            "#,
        )
        .bind(closed.state)
        .bind(db_timestamp(&closed_at))
        .bind(closed.expected_cash_local_cents)
        .bind(closed.expected_cash_foreign_cents)
        .bind(closed.counted_cash_local_cents)
        .bind(closed.counted_cash_foreign_cents)
        .bind(closed.difference_local_cents)
        .bind(closed.difference_foreign_cents)
        .bind(closed.sales_cash_local_cents)
        .bind(closed.sales_cash_foreign_cents)
        .bind(closed.sales_card_cents)
        .bind(closed.sales_mobile_cents)
        .bind(closed.sales_transfer_cents)
        .bind(closed.sales_mixed_cents)
        .bind(closed.sale_count)
        .bind(&closed.closing_notes)
        .bind(&closed.closed_by)
        .bind(db_timestamp(&closed.updated_at))
        .bind(&closed.id)
        .bind(&closed.organization_id)
        .execute(&mut *tx)
        .await?;

        if written.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CoreError::not_open(session_id).into());
        }

        tx.commit().await?;

        info!(
            session_id = %closed.id,
            organization_id = %closed.organization_id,
            sale_count = closed.sale_count,
            difference_local_cents = ?closed.difference_local_cents,
            difference_foreign_cents = ?closed.difference_foreign_cents,
            "Cash session closed"
        );

        Ok(closed)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The organization's open session, if any.
    pub async fn get_open(&self, organization_id: &str) -> DbResult<Option<CashSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE organization_id = ?1 AND state = 'open'"
        );

        let session = sqlx::query_as::<_, CashSession>(&sql)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Gets a session by ID, scoped to the organization.
    pub async fn get_by_id(
        &self,
        organization_id: &str,
        session_id: &str,
    ) -> DbResult<Option<CashSession>> {
        let mut conn = self.pool.acquire().await?;
        fetch_session(&mut conn, organization_id, session_id).await
    }

    /// Expected figures for the open session, without writing anything.
    ///
    /// ## Errors
    /// - `NotOpen` when the organization has no open session
    pub async fn preview_close(&self, organization_id: &str) -> SessionResult<ClosePreview> {
        let session = self
            .get_open(organization_id)
            .await?
            .ok_or_else(|| SessionError::Domain(CoreError::not_open(organization_id)))?;

        let mut conn = self.pool.acquire().await?;
        let sales = fetch_sales_since(&mut conn, organization_id, &session.opened_at).await?;
        let reconciliation = compute_expected(&session, &sales)?;

        debug!(
            session_id = %session.id,
            expected_local_cents = reconciliation.expected_local.cents(),
            expected_foreign_cents = reconciliation.expected_foreign.cents(),
            "Close preview computed"
        );

        Ok(ClosePreview {
            session,
            reconciliation,
        })
    }

    /// Closed sessions of the organization, most recently closed first.
    pub async fn history(&self, organization_id: &str, limit: u32) -> DbResult<Vec<CashSession>> {
        let sql = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM cash_sessions
            WHERE organization_id = ?1 AND state = 'closed'
            ORDER BY closed_at DESC, id
            LIMIT ?2
            "#
        );

        let sessions = sqlx::query_as::<_, CashSession>(&sql)
            .bind(organization_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }
}

async fn fetch_session(
    conn: &mut SqliteConnection,
    organization_id: &str,
    session_id: &str,
) -> DbResult<Option<CashSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE id = ?1 AND organization_id = ?2"
    );

    let session = sqlx::query_as::<_, CashSession>(&sql)
        .bind(session_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(session)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use till_core::{Currency, Money, NewSale, PaymentMethod, SessionState};

    fn money(major: i64) -> Money {
        Money::from_major_minor(major, 0)
    }

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn record(db: &Database, org: &str, major: i64, currency: Currency, method: PaymentMethod) {
        db.sales()
            .record_sale(NewSale {
                organization_id: org.to_string(),
                total: money(major),
                currency,
                payment_method: method,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_then_get_open() {
        let db = setup().await;
        let opened = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(1000), money(50)).with_notes("A"))
            .await
            .unwrap();

        let loaded = db.sessions().get_open("org-1").await.unwrap().unwrap();
        assert_eq!(loaded, opened);
        assert!(db.sessions().get_open("org-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_open_is_already_open() {
        let db = setup().await;
        let first = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(10), money(0)))
            .await
            .unwrap();

        let err = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(20), money(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::AlreadyOpen { .. })));

        // No second row was written.
        assert_eq!(db.sessions().get_open("org-1").await.unwrap().unwrap().id, first.id);

        // Another organization is unaffected.
        db.sessions()
            .open_session(OpenRequest::new("org-2", money(0), money(0)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_rejects_negative_amount_without_writing() {
        let db = setup().await;
        let err = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(-5), money(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::InvalidAmount { .. })));
        assert!(db.sessions().get_open("org-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_reference_scenario() {
        let db = setup().await;
        let session = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(1000), money(50)))
            .await
            .unwrap();

        record(&db, "org-1", 300, Currency::Local, PaymentMethod::Cash).await;
        record(&db, "org-1", 20, Currency::Foreign, PaymentMethod::Cash).await;
        record(&db, "org-1", 150, Currency::Local, PaymentMethod::Card).await;
        record(&db, "org-2", 999, Currency::Local, PaymentMethod::Cash).await;

        let preview = db.sessions().preview_close("org-1").await.unwrap();
        assert_eq!(preview.reconciliation.expected_local, money(1300));

        let closed = db
            .sessions()
            .close_session(
                "org-1",
                &session.id,
                CloseRequest::new(money(1310), money(68)).with_notes("end of day"),
            )
            .await
            .unwrap();

        assert_eq!(closed.state, SessionState::Closed);
        assert_eq!(closed.expected_local(), Some(money(1300)));
        assert_eq!(closed.expected_foreign(), Some(money(70)));
        assert_eq!(closed.difference_local(), Some(money(10)));
        assert_eq!(closed.difference_foreign(), Some(money(-2)));
        assert_eq!(closed.sales_card_cents, money(150).cents());
        assert_eq!(closed.sale_count, 3);

        let stored = db.sessions().get_by_id("org-1", &session.id).await.unwrap().unwrap();
        assert_eq!(stored, closed);
        assert!(db.sessions().get_open("org-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_with_overflowing_expected_cash_rolls_back() {
        let db = setup().await;
        let opening = till_core::validation::parse_amount("opening_cash_local", "92233720368547758.07")
            .unwrap();
        assert_eq!(opening.cents(), i64::MAX);

        let session = db
            .sessions()
            .open_session(OpenRequest::new("org-1", opening, money(0)))
            .await
            .unwrap();
        db.sales()
            .record_sale(NewSale {
                organization_id: "org-1".to_string(),
                total: Money::from_cents(1),
                currency: Currency::Local,
                payment_method: PaymentMethod::Cash,
            })
            .await
            .unwrap();

        let err = db.sessions().preview_close("org-1").await.unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::InvalidAmount { .. })));

        let err = db
            .sessions()
            .close_session("org-1", &session.id, CloseRequest::new(money(0), money(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::InvalidAmount { .. })));

        // Nothing was committed: the session is still open and unchanged.
        let stored = db.sessions().get_by_id("org-1", &session.id).await.unwrap().unwrap();
        assert_eq!(stored, session);
        assert_eq!(stored.expected_cash_local_cents, None);
    }

    #[tokio::test]
    async fn test_close_twice_is_not_open() {
        let db = setup().await;
        let session = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(0), money(0)))
            .await
            .unwrap();

        let first = db
            .sessions()
            .close_session("org-1", &session.id, CloseRequest::new(money(0), money(0)))
            .await
            .unwrap();

        let err = db
            .sessions()
            .close_session("org-1", &session.id, CloseRequest::new(money(5), money(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::NotOpen { .. })));

        let stored = db.sessions().get_by_id("org-1", &session.id).await.unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn test_close_unknown_or_foreign_session_is_not_found() {
        let db = setup().await;
        let session = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(0), money(0)))
            .await
            .unwrap();

        let err = db
            .sessions()
            .close_session("org-2", &session.id, CloseRequest::new(money(0), money(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::SessionNotFound(_))));

        let err = db
            .sessions()
            .close_session("org-1", "missing", CloseRequest::new(money(0), money(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::SessionNotFound(_))));

        assert!(db.sessions().get_open("org-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_close_negative_count_rolls_back() {
        let db = setup().await;
        let session = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(0), money(0)))
            .await
            .unwrap();

        let err = db
            .sessions()
            .close_session("org-1", &session.id, CloseRequest::new(money(-1), money(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::InvalidAmount { .. })));

        let stored = db.sessions().get_open("org-1").await.unwrap().unwrap();
        assert_eq!(stored, session);
    }

    #[tokio::test]
    async fn test_closed_row_is_immutable_in_storage() {
        let db = setup().await;
        let session = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(0), money(0)))
            .await
            .unwrap();
        db.sessions()
            .close_session("org-1", &session.id, CloseRequest::new(money(0), money(0)))
            .await
            .unwrap();

        let result = sqlx::query("UPDATE cash_sessions SET counted_cash_local_cents = 1 WHERE id = ?1")
            .bind(&session.id)
            .execute(db.pool())
            .await;
        let err = crate::DbError::from(result.unwrap_err());
        assert!(matches!(err, crate::DbError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_preview_without_open_session_is_not_open() {
        let db = setup().await;
        let err = db.sessions().preview_close("org-1").await.unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::NotOpen { .. })));
    }

    #[tokio::test]
    async fn test_history_newest_first_and_limited() {
        let db = setup().await;
        let mut ids = Vec::new();
        for i in 0..3 {
            let session = db
                .sessions()
                .open_session(OpenRequest::new("org-1", money(i), money(0)))
                .await
                .unwrap();
            db.sessions()
                .close_session("org-1", &session.id, CloseRequest::new(money(i), money(0)))
                .await
                .unwrap();
            ids.push(session.id);
        }
        db.sessions()
            .open_session(OpenRequest::new("org-1", money(0), money(0)))
            .await
            .unwrap();

        let history = db.sessions().history("org-1", 2).await.unwrap();
        let got: Vec<_> = history.iter().map(|s| s.id.clone()).collect();
        assert_eq!(got, vec![ids[2].clone(), ids[1].clone()]);
        assert!(history.iter().all(|s| s.state == SessionState::Closed));

        assert!(db.sessions().history("org-2", 10).await.unwrap().is_empty());
    }

    // =========================================================================
    // Races (file-backed, several connections)
    // =========================================================================

    async fn file_db(dir: &tempfile::TempDir) -> Database {
        Database::new(DbConfig::new(dir.path().join("till.db")).max_connections(4))
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_opens_exactly_one_wins() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move {
                    db.sessions()
                        .open_session(OpenRequest::new("org-1", money(i), money(0)))
                        .await
                })
            })
            .collect();

        let mut opened = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => opened += 1,
                Err(SessionError::Domain(CoreError::AlreadyOpen { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(opened, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_closes_exactly_one_wins() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let session = db
            .sessions()
            .open_session(OpenRequest::new("org-1", money(100), money(0)))
            .await
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let db = db.clone();
                let id = session.id.clone();
                tokio::spawn(async move {
                    db.sessions()
                        .close_session("org-1", &id, CloseRequest::new(money(100 + i), money(0)))
                        .await
                })
            })
            .collect();

        let mut closed = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(session) => closed.push(session),
                Err(SessionError::Domain(CoreError::NotOpen { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(closed.len(), 1);

        let stored = db.sessions().get_by_id("org-1", &session.id).await.unwrap().unwrap();
        assert_eq!(stored, closed[0]);
    }
}
