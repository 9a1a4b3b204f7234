//! `till`: open, close and reconcile the cash register.
//!
//! ```text
//! till open  --local 1000 --foreign 50
//! till sale  300 --method cash
//! till status
//! till close --local 1310 --foreign 68 --notes "shift A"
//! till history -n 5 --json
//! ```

use clap::Parser;
use std::process::ExitCode;

use till_cli::cli::Cli;
use till_cli::config::AppConfig;
use till_cli::error::ApiError;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    till_cli::init_tracing();

    let as_json = cli.json;
    let config = AppConfig::from_env()?;

    let result = match till_cli::open_database(&config).await {
        Ok(db) => {
            let result = till_cli::run(&db, &config, cli).await;
            db.close().await;
            result
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(output) => {
            println!("{}", output.render(as_json));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report(&err, as_json)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report(err: &ApiError, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string(err)?);
    } else {
        eprintln!("{err}");
    }
    Ok(())
}
