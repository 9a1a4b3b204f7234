//! # Sale Repository
//!
//! The register's view of sales: a minimal write path and the "sales since
//! open" range query the close-out reads.
//!
//! ## Where Sales Meet Sessions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sales (organization_id, created_at) index                             │
//! │                                                                         │
//! │  org-1 ──┬── 09:58  cash   local    ✗ before opened_at                 │
//! │          ├── 10:00  ════════════════ session opened_at ═══════════     │
//! │          ├── 10:04  cash   local    ✓                                  │
//! │          ├── 11:30  card   foreign  ✓ (card bucket, not in drawer)     │
//! │          └── 12:10  cash   foreign  ✓                                  │
//! │  org-2 ──┴── 10:20  cash   local    ✗ other organization               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{db_timestamp, now};
use crate::error::{DbResult, SessionResult};
use till_core::{NewSale, Sale};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale timestamped now.
    ///
    /// ## Errors
    /// - `Domain(InvalidAmount)` for a negative total
    /// - `Storage` if the insert fails
    pub async fn record_sale(&self, request: NewSale) -> SessionResult<Sale> {
        let sale = Sale::new(Uuid::new_v4().to_string(), request, now())?;
        self.insert_sale(&sale).await?;
        Ok(sale)
    }

    /// Inserts a complete sale (seeding, imports).
    pub async fn insert_sale(&self, sale: &Sale) -> DbResult<()> {
        debug!(
            id = %sale.id,
            organization_id = %sale.organization_id,
            total_cents = sale.total_cents,
            currency = %sale.currency,
            payment_method = %sale.payment_method,
            "Inserting sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, organization_id, total_cents, currency, payment_method, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.organization_id)
        .bind(sale.total_cents)
        .bind(sale.currency)
        .bind(sale.payment_method)
        .bind(db_timestamp(&sale.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a sale by ID, scoped to the organization.
    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, organization_id, total_cents, currency, payment_method, created_at
            FROM sales
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Sales of `organization_id` with `created_at >= since`, oldest first.
    pub async fn sales_since(
        &self,
        organization_id: &str,
        since: &DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sales_since(&mut conn, organization_id, since).await
    }
}

/// The "sales since open" query, on any connection (including one inside
/// a transaction).
pub(crate) async fn fetch_sales_since(
    conn: &mut SqliteConnection,
    organization_id: &str,
    since: &DateTime<Utc>,
) -> DbResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, organization_id, total_cents, currency, payment_method, created_at
        FROM sales
        WHERE organization_id = ?1 AND created_at >= ?2
        ORDER BY created_at, id
        "#,
    )
    .bind(organization_id)
    .bind(db_timestamp(since))
    .fetch_all(&mut *conn)
    .await?;

    debug!(organization_id, count = sales.len(), "Fetched sales since open");

    Ok(sales)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use till_core::{CoreError, Currency, Money, PaymentMethod};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_sale(org: &str, cents: i64, currency: Currency, method: PaymentMethod) -> NewSale {
        NewSale {
            organization_id: org.to_string(),
            total: Money::from_cents(cents),
            currency,
            payment_method: method,
        }
    }

    fn sale_at(org: &str, cents: i64, at: DateTime<Utc>) -> Sale {
        Sale::new(
            Uuid::new_v4().to_string(),
            new_sale(org, cents, Currency::Local, PaymentMethod::Cash),
            at,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_record_and_get_sale() {
        let db = setup().await;
        let sale = db
            .sales()
            .record_sale(new_sale("org-1", 1_250, Currency::Foreign, PaymentMethod::MobilePayment))
            .await
            .unwrap();

        let loaded = db.sales().get_by_id("org-1", &sale.id).await.unwrap().unwrap();
        assert_eq!(loaded, sale);

        assert!(db.sales().get_by_id("org-2", &sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_sale_rejects_negative_total() {
        let db = setup().await;
        let err = db
            .sales()
            .record_sale(new_sale("org-1", -1, Currency::Local, PaymentMethod::Cash))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Domain(CoreError::InvalidAmount { .. })));
    }

    #[tokio::test]
    async fn test_sales_since_filters_by_time_and_organization() {
        let db = setup().await;
        let opened_at = now();

        let before = sale_at("org-1", 100, opened_at - Duration::microseconds(1));
        let at_open = sale_at("org-1", 200, opened_at);
        let after = sale_at("org-1", 300, opened_at + Duration::minutes(3));
        let other_org = sale_at("org-2", 400, opened_at + Duration::minutes(1));

        for sale in [&after, &before, &other_org, &at_open] {
            db.sales().insert_sale(sale).await.unwrap();
        }

        let sales = db.sales().sales_since("org-1", &opened_at).await.unwrap();
        let ids: Vec<_> = sales.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![at_open.id.as_str(), after.id.as_str()]);
    }

    /// Whole seconds and fractional seconds must still order correctly.
    #[tokio::test]
    async fn test_sales_since_compares_across_subsecond_boundaries() {
        let db = setup().await;
        let opened_at = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 3, 1, 9, 0, 0).unwrap()
            + Duration::microseconds(500_000);

        db.sales().insert_sale(&sale_at("org-1", 1, opened_at - Duration::milliseconds(500))).await.unwrap();
        db.sales().insert_sale(&sale_at("org-1", 2, opened_at + Duration::milliseconds(500))).await.unwrap();

        let sales = db.sales().sales_since("org-1", &opened_at).await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].total_cents, 2);
    }
}
