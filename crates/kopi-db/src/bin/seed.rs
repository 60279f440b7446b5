//! # Seed Data Generator
//!
//! Populates a development database with a coffee-shop menu.
//!
//! ## Usage
//! ```bash
//! # Menu for user 1 in ./kopi_dev.db
//! cargo run -p kopi-db --bin seed
//!
//! # Different owner, plus a few committed checkouts
//! cargo run -p kopi-db --bin seed -- --user 2 --demo-sales
//!
//! # Specify database path
//! cargo run -p kopi-db --bin seed -- --db ./data/kopi.db
//! ```
//!
//! Demo sales are spread over the last week so the daily and monthly
//! reports have something to show.

use chrono::{Duration, Utc};
use kopi_core::{CartLine, CheckoutRequest, NewProduct, Product, ProductCategory};
use kopi_db::{init_tracing, Database, DbConfig};
use std::env;

/// (name, description, category, price, stock)
const MENU: &[(&str, &str, ProductCategory, f64, i64)] = &[
    ("Kopi Susu", "Espresso, fresh milk, palm sugar", ProductCategory::Coffee, 25000.0, 40),
    ("Americano", "Double shot over hot water", ProductCategory::Coffee, 22000.0, 40),
    ("Cappuccino", "Espresso with steamed milk foam", ProductCategory::Coffee, 30000.0, 30),
    ("Kopi Tubruk", "Unfiltered Javanese coffee", ProductCategory::Coffee, 15000.0, 50),
    ("V60 Gayo", "Pour-over, single origin Aceh Gayo", ProductCategory::Coffee, 35000.0, 20),
    ("Matcha Latte", "Ceremonial matcha with milk", ProductCategory::NonCoffee, 32000.0, 25),
    ("Teh Tarik", "Pulled milk tea", ProductCategory::NonCoffee, 18000.0, 30),
    ("Chocolate", "Dark chocolate, hot or iced", ProductCategory::NonCoffee, 28000.0, 25),
    ("Croissant", "Butter croissant", ProductCategory::Food, 20000.0, 15),
    ("Pisang Goreng", "Fried banana with cheese", ProductCategory::Food, 17000.0, 20),
    ("Roti Bakar", "Toast with kaya jam", ProductCategory::Food, 19000.0, 20),
];

/// (menu indexes with quantities, payment method, days ago)
const DEMO_SALES: &[(&[(usize, i64)], &str, i64)] = &[
    (&[(0, 2), (8, 1)], "cash", 0),
    (&[(1, 1)], "card", 0),
    (&[(5, 1), (10, 2)], "transfer", 0),
    (&[(3, 3)], "cash", 1),
    (&[(2, 1), (9, 1)], "qr", 2),
    (&[(4, 2), (6, 2)], "cash", 6),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kopi_dev.db");
    let mut user_id: i64 = 1;
    let mut demo_sales = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user_id = args[i + 1].parse().unwrap_or(1);
                    i += 1;
                }
            }
            "--demo-sales" => demo_sales = true,
            "--help" | "-h" => {
                println!("Kopi POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kopi_dev.db)");
                println!("  -u, --user <ID>    Owner of the seeded menu (default: 1)");
                println!("      --demo-sales   Commit a few example checkouts");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    println!("☕ Kopi POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("User:     {}", user_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count(user_id).await?;
    if existing > 0 {
        println!("⚠ User {} already has {} products", user_id, existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut products: Vec<Product> = Vec::with_capacity(MENU.len());
    for (name, description, category, price, stock) in MENU {
        let product = db
            .products()
            .create(
                user_id,
                &NewProduct {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    category: *category,
                    price: *price,
                    stock: *stock,
                },
            )
            .await?;
        products.push(product);
    }

    println!("✓ Created {} menu items", products.len());

    if demo_sales {
        let ledger = db.ledger();
        let now = Utc::now();

        for (lines, method, days_ago) in DEMO_SALES {
            let request = CheckoutRequest {
                items: lines
                    .iter()
                    .map(|&(idx, quantity)| CartLine {
                        product_id: products[idx].id,
                        quantity,
                        price: products[idx].price().as_major_f64(),
                    })
                    .collect(),
                payment_method: method.to_string(),
                notes: None,
            };

            let receipt = ledger
                .commit_at(user_id, &request, now - Duration::days(*days_ago))
                .await?;
            println!(
                "  Sale #{} ({}) total {}",
                receipt.transaction_id, method, receipt.total_amount
            );
        }

        println!("✓ Committed {} demo sales", DEMO_SALES.len());
    }

    let today = db.reports().daily_summary_today(user_id).await?;
    println!();
    println!("Today ({}):", today.date);
    println!("  Transactions: {}", today.transaction_count);
    println!("  Total sales:  {}", today.total_sales);
    println!("  Line items:   {}", today.items.len());

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
