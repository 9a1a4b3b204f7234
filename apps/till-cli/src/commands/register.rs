//! # Register Commands
//!
//! `open`, `close`, `status` and `history`.

use serde::Serialize;
use std::fmt::Write as _;
use tracing::{debug, info};

use crate::cli::{CloseArgs, OpenArgs};
use crate::commands::Output;
use crate::config::AppConfig;
use crate::error::ApiError;
use till_core::session::{CloseRequest, OpenRequest};
use till_core::validation::parse_amount;
use till_core::{
    authorize, CashSession, CoreError, Currency, Discrepancy, Money, Permission, Reconciliation,
    SalesTotals, TenderBucket,
};
use till_db::{ClosePreview, Database, SessionError};

/// JSON shape of `status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub open: bool,
    pub session: Option<CashSession>,
    pub reconciliation: Option<Reconciliation>,
}

// =============================================================================
// open
// =============================================================================

pub async fn open(db: &Database, config: &AppConfig, args: OpenArgs) -> Result<Output, ApiError> {
    authorize(config.operator_role, Permission::OpenRegister)?;

    let opening_local = parse_amount("opening_cash_local", &args.local)?;
    let opening_foreign = parse_amount("opening_cash_foreign", &args.foreign)?;

    let mut request = OpenRequest::new(config.organization_id.as_str(), opening_local, opening_foreign);
    request.notes = args.notes;
    request.opened_by = config.operator_id.clone();

    let session = db.sessions().open_session(request).await?;
    info!(session_id = %session.id, "Register opened");

    let text = format!(
        "Register opened ({})\n  Opening {:<8} {}\n  Opening {:<8} {}",
        session.id,
        "local",
        config.format_currency(Currency::Local, session.opening_cash_local()),
        "foreign",
        config.format_currency(Currency::Foreign, session.opening_cash_foreign()),
    );

    Output::new(&session, text)
}

// =============================================================================
// close
// =============================================================================

pub async fn close(db: &Database, config: &AppConfig, args: CloseArgs) -> Result<Output, ApiError> {
    authorize(config.operator_role, Permission::CloseRegister)?;

    let counted_local = parse_amount("counted_cash_local", &args.local)?;
    let counted_foreign = parse_amount("counted_cash_foreign", &args.foreign)?;

    let organization_id = config.organization_id.as_str();
    let session_id = match args.session {
        Some(id) => id,
        None => db
            .sessions()
            .get_open(organization_id)
            .await?
            .map(|session| session.id)
            .ok_or_else(|| CoreError::not_open(organization_id))?,
    };

    let mut request = CloseRequest::new(counted_local, counted_foreign);
    request.notes = args.notes;
    request.closed_by = config.operator_id.clone();

    let closed = db
        .sessions()
        .close_session(organization_id, &session_id, request)
        .await?;

    Output::new(&closed, render_close_out(config, &closed))
}

fn render_close_out(config: &AppConfig, session: &CashSession) -> String {
    let mut text = format!("Register closed ({})\n", session.id);

    for currency in Currency::ALL {
        let (expected, counted, difference) = match currency {
            Currency::Local => (
                session.expected_local(),
                session.counted_local(),
                session.difference_local(),
            ),
            Currency::Foreign => (
                session.expected_foreign(),
                session.counted_foreign(),
                session.difference_foreign(),
            ),
        };
        let fmt = |amount: Option<Money>| {
            config.format_currency(currency, amount.unwrap_or_default())
        };

        let _ = writeln!(text, "  {currency}");
        let _ = writeln!(text, "    Expected   {}", fmt(expected));
        let _ = writeln!(text, "    Counted    {}", fmt(counted));
        let _ = writeln!(
            text,
            "    Difference {}",
            describe_difference(config, currency, difference.unwrap_or_default())
        );
    }

    text.push_str(&render_totals(config, &session.sales_totals()));
    text
}

fn describe_difference(config: &AppConfig, currency: Currency, difference: Money) -> String {
    match Discrepancy::from_difference(difference) {
        Discrepancy::Balanced => "balanced".to_string(),
        Discrepancy::Surplus(amount) => {
            format!("surplus {}", config.format_currency(currency, amount))
        }
        Discrepancy::Shortage(amount) => {
            format!("shortage {}", config.format_currency(currency, amount))
        }
    }
}

/// Per-method totals block. Only the cash buckets belong to one drawer;
/// the others add up sales of both currencies and carry no symbol.
fn render_totals(config: &AppConfig, totals: &SalesTotals) -> String {
    let mut text = format!("  Sales ({})\n", totals.count);
    for (bucket, amount) in totals.iter() {
        let _ = writeln!(
            text,
            "    {:<15} {}",
            bucket.label(),
            format_bucket(config, bucket, amount)
        );
    }
    text
}

fn format_bucket(config: &AppConfig, bucket: TenderBucket, amount: Money) -> String {
    match bucket {
        TenderBucket::CashLocal => config.format_currency(Currency::Local, amount),
        TenderBucket::CashForeign => config.format_currency(Currency::Foreign, amount),
        TenderBucket::Card | TenderBucket::Mobile | TenderBucket::Transfer | TenderBucket::Mixed => {
            mixed_currency(amount)
        }
    }
}

fn mixed_currency(amount: Money) -> String {
    format!("{amount} (mixed currency)")
}

// =============================================================================
// status
// =============================================================================

/// Shows the open register. Expected figures are included only for roles
/// that may close the register.
pub async fn status(db: &Database, config: &AppConfig) -> Result<Output, ApiError> {
    let organization_id = config.organization_id.as_str();

    if config.operator_role.can(Permission::CloseRegister) {
        match db.sessions().preview_close(organization_id).await {
            Ok(ClosePreview {
                session,
                reconciliation,
            }) => {
                let text = render_status(config, &session, Some(&reconciliation));
                return Output::new(
                    &StatusView {
                        open: true,
                        session: Some(session),
                        reconciliation: Some(reconciliation),
                    },
                    text,
                );
            }
            Err(SessionError::Domain(CoreError::NotOpen { .. })) => {}
            Err(err) => return Err(err.into()),
        }
    } else if let Some(session) = db.sessions().get_open(organization_id).await? {
        let text = render_status(config, &session, None);
        return Output::new(
            &StatusView {
                open: true,
                session: Some(session),
                reconciliation: None,
            },
            text,
        );
    }

    debug!(organization_id, "No register open");
    Output::new(
        &StatusView {
            open: false,
            session: None,
            reconciliation: None,
        },
        "No register open",
    )
}

fn render_status(
    config: &AppConfig,
    session: &CashSession,
    reconciliation: Option<&Reconciliation>,
) -> String {
    let mut text = format!(
        "Register open ({})\n  Opened {}\n",
        session.id,
        session.opened_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(notes) = &session.notes {
        let _ = writeln!(text, "  Notes  {notes}");
    }

    for currency in Currency::ALL {
        let _ = write!(
            text,
            "  {:<8} opening {}",
            currency.as_str(),
            config.format_currency(currency, session.opening_cash(currency))
        );
        if let Some(r) = reconciliation {
            let _ = write!(
                text,
                "  expected {}",
                config.format_currency(currency, r.expected(currency))
            );
        }
        text.push('\n');
    }

    if let Some(r) = reconciliation {
        text.push_str(&render_totals(config, &r.totals));
    }
    text
}

// =============================================================================
// history
// =============================================================================

pub async fn history(
    db: &Database,
    config: &AppConfig,
    limit: Option<u32>,
) -> Result<Output, ApiError> {
    authorize(config.operator_role, Permission::ViewReports)?;

    let limit = limit.unwrap_or(config.history_limit);
    if limit == 0 {
        return Err(ApiError::validation("limit must be at least 1"));
    }

    let sessions = db
        .sessions()
        .history(config.organization_id.as_str(), limit)
        .await?;

    if sessions.is_empty() {
        return Output::new(&sessions, "No closed sessions");
    }

    let mut text = String::new();
    for session in &sessions {
        let closed_at = session
            .closed_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let _ = writeln!(
            text,
            "{closed_at}  {}  local {} ({})  foreign {} ({})  other {}  sales {}",
            session.id,
            config.format_currency(Currency::Local, session.counted_local().unwrap_or_default()),
            describe_difference(config, Currency::Local, session.difference_local().unwrap_or_default()),
            config.format_currency(Currency::Foreign, session.counted_foreign().unwrap_or_default()),
            describe_difference(config, Currency::Foreign, session.difference_foreign().unwrap_or_default()),
            mixed_currency(session.other_methods_total()),
            session.sale_count,
        );
    }

    Output::new(&sessions, text.trim_end().to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
