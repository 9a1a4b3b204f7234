//! # Seed Data Generator
//!
//! Populates a database with an open register and a day of demo sales.
//!
//! ## Usage
//! ```bash
//! # 200 sales (default) into ./till_dev.db
//! cargo run -p till-db --bin seed
//!
//! # Custom amount, organization and path
//! cargo run -p till-db --bin seed -- --count 1000 --org shop-2 --db ./data/till.db
//! ```
//!
//! ## Generated Sales
//! Sales rotate through every payment method and both currencies, with
//! totals between 1.00 and 80.99. If the organization has no open register,
//! one is opened with a 500.00 / 20.00 float first.

use std::env;
use till_core::session::OpenRequest;
use till_core::{Currency, Money, NewSale, PaymentMethod, DEFAULT_ORGANIZATION_ID};
use till_db::{Database, DbConfig};

/// Payment mix, weighted towards cash like a small shop's day.
const METHODS: &[PaymentMethod] = &[
    PaymentMethod::Cash,
    PaymentMethod::Cash,
    PaymentMethod::Cash,
    PaymentMethod::Card,
    PaymentMethod::MobilePayment,
    PaymentMethod::Cash,
    PaymentMethod::BankTransfer,
    PaymentMethod::Mixed,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./till_dev.db");
    let mut organization_id = DEFAULT_ORGANIZATION_ID.to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--org" | "-o" => {
                if i + 1 < args.len() {
                    organization_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of sales to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -o, --org <ID>     Organization id (default: {DEFAULT_ORGANIZATION_ID})");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Till Seed Data Generator");
    println!("===========================");
    println!("Database:     {}", db_path);
    println!("Organization: {}", organization_id);
    println!("Sales:        {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let session = match db.sessions().get_open(&organization_id).await? {
        Some(session) => {
            println!("✓ Using open register {}", session.id);
            session
        }
        None => {
            let request = OpenRequest::new(
                organization_id.as_str(),
                Money::from_major_minor(500, 0),
                Money::from_major_minor(20, 0),
            )
            .with_notes("seed");
            let session = db.sessions().open_session(request).await?;
            println!("✓ Opened register {}", session.id);
            session
        }
    };

    println!();
    println!("Generating sales...");
    let start = std::time::Instant::now();
    let mut generated = 0;

    for seed in 0..count {
        let sale = generate_sale(&organization_id, seed);
        if let Err(e) = db.sales().record_sale(sale).await {
            eprintln!("Failed to insert sale {}: {}", seed, e);
            continue;
        }
        generated += 1;

        if generated % 50 == 0 {
            println!("  Generated {} sales...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} sales in {:?}", generated, elapsed);

    let preview = db.sessions().preview_close(&organization_id).await?;
    let r = &preview.reconciliation;
    println!();
    println!("Register {}:", session.id);
    println!("  Sales:            {}", r.totals.count);
    println!("  Expected local:   {}", r.expected_local);
    println!("  Expected foreign: {}", r.expected_foreign);
    println!("  Other methods:    {}", r.totals.non_cash_total());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Deterministic sale for index `seed`.
fn generate_sale(organization_id: &str, seed: usize) -> NewSale {
    let payment_method = METHODS[seed % METHODS.len()];
    let currency = if seed % 3 == 0 {
        Currency::Foreign
    } else {
        Currency::Local
    };
    let total = Money::from_cents(100 + ((seed * 733) % 8_000) as i64);

    NewSale {
        organization_id: organization_id.to_string(),
        total,
        currency,
        payment_method,
    }
}
