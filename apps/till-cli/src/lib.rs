//! # Till CLI Library
//!
//! Operator front-end for the cash-register session manager. The binary in
//! `main.rs` only parses arguments and prints; everything it calls lives
//! here so the commands can be tested against an in-memory database.
//!
//! ## Module Organization
//! ```text
//! till_cli/
//! ├── lib.rs          ◄─── You are here (tracing, database setup, run)
//! ├── cli.rs          ◄─── clap argument definitions
//! ├── config.rs       ◄─── TILL_* environment configuration
//! ├── commands/
//! │   ├── mod.rs      ◄─── Output type and dispatch
//! │   ├── register.rs ◄─── open / close / status / history
//! │   └── sale.rs     ◄─── sale
//! └── error.rs        ◄─── ApiError for command results
//! ```
//!
//! ## Output Streams
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stdout  command result (text, or JSON with --json)                     │
//! │  stderr  tracing logs, text-mode errors                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::Output;
use config::AppConfig;
use error::ApiError;
use till_db::{Database, DbConfig};

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so `--json` output stays parseable. Override the
/// level with `RUST_LOG`, e.g. `RUST_LOG=till_db=trace`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,till_cli=info,till_db=info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Opens (and migrates) the database named by the configuration.
///
/// The parent directory is created when missing.
pub async fn open_database(config: &AppConfig) -> Result<Database, ApiError> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!(path = %parent.display(), "Cannot create data directory: {}", e);
                ApiError::internal(format!("Cannot create {}", parent.display()))
            })?;
        }
    }

    info!(path = %config.db_path.display(), "Using database");
    Ok(Database::new(DbConfig::new(&config.db_path)).await?)
}

/// Runs one invocation against an already opened database.
pub async fn run(db: &Database, config: &AppConfig, cli: Cli) -> Result<Output, ApiError> {
    commands::dispatch(db, config, cli.command).await
}
