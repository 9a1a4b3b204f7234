//! # Commands
//!
//! One function per subcommand. Each checks the operator's permission
//! first, parses operator input with till-core, calls till-db and returns
//! an [`Output`] carrying both renderings of the result.
//!
//! ```text
//! Command::Open    → register::open     (open_register)
//! Command::Close   → register::close    (close_register)
//! Command::Status  → register::status   (preview needs close_register)
//! Command::History → register::history  (view_reports)
//! Command::Sale    → sale::record       (create_sale)
//! ```

pub mod register;
pub mod sale;

use serde::Serialize;
use till_db::Database;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::error::ApiError;

/// Result of a command, printable as text or JSON.
#[derive(Debug, Clone)]
pub struct Output {
    pub text: String,
    pub json: serde_json::Value,
}

impl Output {
    pub fn new<T: Serialize>(value: &T, text: impl Into<String>) -> Result<Self, ApiError> {
        let json = serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))?;
        Ok(Output {
            text: text.into(),
            json,
        })
    }

    pub fn render(&self, as_json: bool) -> String {
        if as_json {
            serde_json::to_string_pretty(&self.json).unwrap_or_else(|_| self.json.to_string())
        } else {
            self.text.clone()
        }
    }
}

/// Runs one parsed command.
pub async fn dispatch(
    db: &Database,
    config: &AppConfig,
    command: Command,
) -> Result<Output, ApiError> {
    match command {
        Command::Open(args) => register::open(db, config, args).await,
        Command::Close(args) => register::close(db, config, args).await,
        Command::Status => register::status(db, config).await,
        Command::History { limit } => register::history(db, config, limit).await,
        Command::Sale(args) => sale::record(db, config, args).await,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;
    use till_core::{Role, DEFAULT_HISTORY_LIMIT};
    use till_db::{Database, DbConfig};

    use crate::config::AppConfig;

    pub fn config(role: Role) -> AppConfig {
        AppConfig {
            db_path: PathBuf::from(":memory:"),
            organization_id: "org-1".to_string(),
            operator_id: Some("op-1".to_string()),
            operator_role: role,
            local_currency_symbol: "Bs.".to_string(),
            foreign_currency_symbol: "USD".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }
}
