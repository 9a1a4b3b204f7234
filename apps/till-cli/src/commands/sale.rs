//! `sale`: records one sale for the configured organization.

use tracing::info;

use crate::cli::SaleArgs;
use crate::commands::Output;
use crate::config::AppConfig;
use crate::error::ApiError;
use till_core::validation::parse_amount;
use till_core::{authorize, Currency, NewSale, PaymentMethod, Permission};
use till_db::Database;

pub async fn record(db: &Database, config: &AppConfig, args: SaleArgs) -> Result<Output, ApiError> {
    authorize(config.operator_role, Permission::CreateSale)?;

    let total = parse_amount("total", &args.total)?;
    let currency: Currency = args.currency.parse()?;
    let payment_method: PaymentMethod = args.method.parse()?;

    let sale = db
        .sales()
        .record_sale(NewSale {
            organization_id: config.organization_id.clone(),
            total,
            currency,
            payment_method,
        })
        .await?;

    info!(sale_id = %sale.id, %payment_method, "Sale recorded");

    let text = format!(
        "Sale recorded ({})\n  {} {}",
        sale.id,
        config.format_currency(currency, sale.total()),
        payment_method
    );
    Output::new(&sale, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ErrorCode;
    use till_core::Role;

    fn args(total: &str, currency: &str, method: &str) -> SaleArgs {
        SaleArgs {
            total: total.to_string(),
            currency: currency.to_string(),
            method: method.to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_sale() {
        let db = testing::database().await;
        let config = testing::config(Role::Seller);

        let out = record(&db, &config, args("12,50", "foreign", "mobile-payment"))
            .await
            .unwrap();
        assert_eq!(out.json["total_cents"], 1_250);
        assert_eq!(out.json["currency"], "foreign");
        assert_eq!(out.json["payment_method"], "mobile_payment");
        assert!(out.text.contains("USD 12.50"), "{}", out.text);
    }

    #[tokio::test]
    async fn test_rejects_unknown_method_and_currency() {
        let db = testing::database().await;
        let config = testing::config(Role::Cashier);

        let err = record(&db, &config, args("10", "local", "cheque")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = record(&db, &config, args("10", "euro", "cash")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = record(&db, &config, args("-1", "local", "cash")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
    }
}
