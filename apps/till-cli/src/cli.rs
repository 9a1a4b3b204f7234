//! Command-line arguments.
//!
//! Amounts are taken as text and parsed by `till_core::validation`, so that
//! `12,50` and `12.50` both work and a typo is an `INVALID_AMOUNT`, never
//! zero.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "till")]
#[command(about = "Open, close and reconcile the cash register")]
#[command(version)]
pub struct Cli {
    /// Print results (and errors) as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the register with a starting float
    Open(OpenArgs),
    /// Count the drawers and close the register
    Close(CloseArgs),
    /// Show the open register and its expected cash
    Status,
    /// List recently closed sessions, newest first
    History {
        /// Maximum number of sessions (defaults to TILL_HISTORY_LIMIT)
        #[arg(long, short = 'n')]
        limit: Option<u32>,
    },
    /// Record a sale
    Sale(SaleArgs),
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Opening cash in local currency
    #[arg(long, value_name = "AMOUNT")]
    pub local: String,

    /// Opening cash in foreign currency
    #[arg(long, value_name = "AMOUNT")]
    pub foreign: String,

    /// Remark stored with the session
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Counted cash in local currency
    #[arg(long, value_name = "AMOUNT")]
    pub local: String,

    /// Counted cash in foreign currency
    #[arg(long, value_name = "AMOUNT")]
    pub foreign: String,

    /// Closing remark
    #[arg(long)]
    pub notes: Option<String>,

    /// Session to close (defaults to the open one)
    #[arg(long, value_name = "ID")]
    pub session: Option<String>,
}

#[derive(Args, Debug)]
pub struct SaleArgs {
    /// Sale total
    #[arg(value_name = "AMOUNT")]
    pub total: String,

    /// local | foreign
    #[arg(long, default_value = "local")]
    pub currency: String,

    /// cash | card | mobile_payment | bank_transfer | mixed
    #[arg(long, default_value = "cash")]
    pub method: String,
}
