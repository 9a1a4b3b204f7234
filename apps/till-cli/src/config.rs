//! # Configuration
//!
//! Loaded from `TILL_*` environment variables with fallback to defaults.
//!
//! | Variable                       | Default                         |
//! |--------------------------------|---------------------------------|
//! | `TILL_DB_PATH`                 | `<platform data dir>/till.db`   |
//! | `TILL_ORGANIZATION_ID`         | `DEFAULT_ORGANIZATION_ID`       |
//! | `TILL_OPERATOR_ID`             | unset                           |
//! | `TILL_OPERATOR_ROLE`           | `cashier`                       |
//! | `TILL_LOCAL_CURRENCY_SYMBOL`   | `Bs.`                           |
//! | `TILL_FOREIGN_CURRENCY_SYMBOL` | `USD`                           |
//! | `TILL_HISTORY_LIMIT`           | `10`                            |

use directories::ProjectDirs;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use till_core::{Currency, Money, Role, DEFAULT_HISTORY_LIMIT, DEFAULT_ORGANIZATION_ID};

/// CLI configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Organization every command runs under
    pub organization_id: String,

    /// Recorded as opened_by / closed_by
    pub operator_id: Option<String>,

    /// Checked against the permission of each command
    pub operator_role: Role,

    /// Display symbol of the local currency
    pub local_currency_symbol: String,

    /// Display symbol of the foreign currency
    pub foreign_currency_symbol: String,

    /// Default row count of `history`
    pub history_limit: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let db_path = match var("TILL_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        let organization_id =
            var("TILL_ORGANIZATION_ID").unwrap_or_else(|| DEFAULT_ORGANIZATION_ID.to_string());

        let operator_role = var("TILL_OPERATOR_ROLE")
            .unwrap_or_else(|| "cashier".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("TILL_OPERATOR_ROLE".to_string()))?;

        let history_limit = match var("TILL_HISTORY_LIMIT") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| ConfigError::InvalidValue("TILL_HISTORY_LIMIT".to_string()))?,
            None => DEFAULT_HISTORY_LIMIT,
        };

        Ok(AppConfig {
            db_path,
            organization_id,
            operator_id: var("TILL_OPERATOR_ID"),
            operator_role,
            local_currency_symbol: var("TILL_LOCAL_CURRENCY_SYMBOL")
                .unwrap_or_else(|| "Bs.".to_string()),
            foreign_currency_symbol: var("TILL_FOREIGN_CURRENCY_SYMBOL")
                .unwrap_or_else(|| "USD".to_string()),
            history_limit,
        })
    }

    pub fn currency_symbol(&self, currency: Currency) -> &str {
        match currency {
            Currency::Local => &self.local_currency_symbol,
            Currency::Foreign => &self.foreign_currency_symbol,
        }
    }

    /// Formats an amount for display.
    ///
    /// ## Example
    /// ```rust,ignore
    /// assert_eq!(config.format_currency(Currency::Local, Money::from_cents(131_000)), "Bs. 1310.00");
    /// assert_eq!(config.format_currency(Currency::Foreign, Money::from_cents(-200)), "-USD 2.00");
    /// ```
    pub fn format_currency(&self, currency: Currency, amount: Money) -> String {
        format!(
            "{}{} {}",
            if amount.is_negative() { "-" } else { "" },
            self.currency_symbol(currency),
            amount.abs()
        )
    }
}

/// Platform data directory, e.g. `~/.local/share/till/till.db` on Linux.
fn default_db_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "till", "till")
        .ok_or_else(|| ConfigError::MissingRequired("TILL_DB_PATH".to_string()))?;
    Ok(dirs.data_dir().join("till.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let mut vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.entry("TILL_DB_PATH".to_string())
            .or_insert_with(|| "/tmp/till-test.db".to_string());
        AppConfig::from_lookup(move |name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/till-test.db"));
        assert_eq!(config.organization_id, DEFAULT_ORGANIZATION_ID);
        assert_eq!(config.operator_role, Role::Cashier);
        assert_eq!(config.operator_id, None);
        assert_eq!(config.local_currency_symbol, "Bs.");
        assert_eq!(config.foreign_currency_symbol, "USD");
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("TILL_ORGANIZATION_ID", "shop-2"),
            ("TILL_OPERATOR_ID", "ana"),
            ("TILL_OPERATOR_ROLE", "manager"),
            ("TILL_FOREIGN_CURRENCY_SYMBOL", "EUR"),
            ("TILL_HISTORY_LIMIT", "25"),
        ])
        .unwrap();
        assert_eq!(config.organization_id, "shop-2");
        assert_eq!(config.operator_id.as_deref(), Some("ana"));
        assert_eq!(config.operator_role, Role::Manager);
        assert_eq!(config.foreign_currency_symbol, "EUR");
        assert_eq!(config.history_limit, 25);
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = load(&[("TILL_OPERATOR_ID", "  "), ("TILL_ORGANIZATION_ID", "")]).unwrap();
        assert_eq!(config.operator_id, None);
        assert_eq!(config.organization_id, DEFAULT_ORGANIZATION_ID);
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("TILL_OPERATOR_ROLE", "owner")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name) if name == "TILL_OPERATOR_ROLE"));

        for bad in ["ten", "-1", "0"] {
            let err = load(&[("TILL_HISTORY_LIMIT", bad)]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(ref name) if name == "TILL_HISTORY_LIMIT"));
        }
    }

    #[test]
    fn test_format_currency() {
        let config = load(&[]).unwrap();
        assert_eq!(
            config.format_currency(Currency::Local, Money::from_cents(131_000)),
            "Bs. 1310.00"
        );
        assert_eq!(
            config.format_currency(Currency::Foreign, Money::from_cents(-200)),
            "-USD 2.00"
        );
        assert_eq!(config.format_currency(Currency::Foreign, Money::zero()), "USD 0.00");
    }
}
