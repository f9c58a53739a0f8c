//! # Seed Tool
//!
//! Populates a development database with a demo catalog and optionally
//! credits an existing customer's balance.
//!
//! ## Usage
//! ```bash
//! # Create ./shop.db (if needed) and load the demo catalog
//! cargo run -p shop-db --bin seed
//!
//! # Specify database path
//! cargo run -p shop-db --bin seed -- --db ./data/shop.db
//!
//! # Give a registered customer $50.00 to spend
//! cargo run -p shop-db --bin seed -- --credit alice 5000
//! ```
//!
//! The catalog is only loaded into an empty `products` table, so running
//! the tool twice never duplicates products.

use anyhow::{bail, Context};
use std::env;
use shop_core::validation::{validate_credit_cents, validate_price_cents};
use shop_core::Money;
use shop_db::{Database, DbConfig};

/// Demo catalog: (name, description, category, price in cents, units on hand)
const CATALOG: &[(&str, &str, &str, i64, i64)] = &[
    ("Ceramic Mug", "12oz stoneware mug, dishwasher safe", "Drinkware", 1299, 40),
    ("Pour-Over Kettle", "Gooseneck kettle, 1L", "Brewing", 4599, 12),
    ("Coffee Beans 1kg", "Medium roast, whole bean", "Coffee", 2450, 60),
    ("Paper Filters (100)", "Size 02 cone filters", "Brewing", 599, 200),
    ("Hand Grinder", "Conical burr, adjustable", "Brewing", 7900, 8),
    ("Digital Scale", "0.1g resolution with timer", "Brewing", 3499, 15),
    ("Travel Tumbler", "Vacuum insulated, 16oz", "Drinkware", 2199, 25),
    ("Cold Brew Jar", "1.5L glass with mesh filter", "Brewing", 2899, 10),
    ("Espresso Cups (2)", "Double-walled glass, 80ml", "Drinkware", 1850, 30),
    ("Last One Standing", "Single unit, for race testing", "Misc", 999, 1),
];

struct Args {
    db_path: String,
    credit: Option<(String, i64)>,
}

fn print_help() {
    println!("Storefront Seed Tool");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>                Database file path (default: ./shop.db)");
    println!("  -c, --credit <USERNAME> <CENTS> Credit an existing customer's balance");
    println!("  -h, --help                     Show this help message");
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut parsed = Args {
        db_path: String::from("./shop.db"),
        credit: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--db" => {
                parsed.db_path = args.get(i + 1).context("--db requires a path")?.clone();
                i += 1;
            }
            "-c" | "--credit" => {
                let username = args.get(i + 1).context("--credit requires a username")?;
                let cents = args
                    .get(i + 2)
                    .context("--credit requires an amount in cents")?
                    .parse::<i64>()
                    .context("credit amount must be an integer number of cents")?;
                validate_credit_cents(cents)?;
                parsed.credit = Some((username.clone(), cents));
                i += 2;
            }
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            other => bail!("unknown argument: {other} (see --help)"),
        }
        i += 1;
    }

    Ok(Some(parsed))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };

    println!("🌱 Storefront Seed Tool");
    println!("=======================");
    println!("Database: {}", args.db_path);
    println!();

    let db = Database::new(DbConfig::new(&args.db_path))
        .await
        .with_context(|| format!("opening {}", args.db_path))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products, catalog not reloaded", existing);
    } else {
        for (name, description, category, price_cents, quantity) in CATALOG {
            validate_price_cents(*price_cents)?;
            let product = db
                .products()
                .insert(name, description, category, *price_cents, *quantity)
                .await
                .with_context(|| format!("inserting {name}"))?;
            println!(
                "  + {:<22} {:>9}  ×{}",
                product.name,
                product.price().to_string(),
                product.quantity
            );
        }
        println!("✓ Loaded {} products", CATALOG.len());
    }

    if let Some((username, cents)) = args.credit {
        let customer = db
            .customers()
            .credit(&username, cents)
            .await
            .with_context(|| format!("crediting {username} (register the account first)"))?;
        println!(
            "✓ Credited {} to {}, balance now {}",
            Money::from_cents(cents),
            customer.username,
            customer.balance()
        );
    }

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
