//! # Seed Data Generator
//!
//! Populates the database with a sample snack menu for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./kulino_dev.db
//! cargo run -p kulino-db --bin seed
//!
//! # Specify database path
//! cargo run -p kulino-db --bin seed -- --db ./data/kulino.db
//! ```
//!
//! Each menu gets the sizes listed below with a starting stock; nothing is
//! written when the database already has menus.

use std::env;

use kulino_core::{MenuInput, SizeInput};
use kulino_db::{Database, DbConfig};

/// (menu, [(size, price, stock)])
const MENUS: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Keripik Singkong",
        &[("Kecil", 5_000, 40), ("Sedang", 10_000, 25), ("Besar", 15_000, 15)],
    ),
    (
        "Makaroni Pedas",
        &[("Kecil", 5_000, 50), ("Besar", 12_000, 20)],
    ),
    (
        "Basreng",
        &[("Kecil", 6_000, 30), ("Besar", 14_000, 12)],
    ),
    (
        "Seblak Kering",
        &[("Sedang", 8_000, 25), ("Besar", 15_000, 10)],
    ),
    (
        "Kerupuk Kulit",
        &[("Sedang", 12_000, 15)],
    ),
    (
        "Usus Crispy",
        &[("Kecil", 7_000, 30), ("Sedang", 13_000, 18), ("Besar", 20_000, 8)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kulino_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kulino POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kulino_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kulino POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.menus().list().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} menus", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating menus...");

    let mut sizes = 0;
    for (name, variants) in MENUS {
        let input = MenuInput {
            id: None,
            name: name.to_string(),
            image: None,
            sizes: variants
                .iter()
                .map(|(size, price, stock)| SizeInput {
                    id: None,
                    size: size.to_string(),
                    price: *price,
                    stock: *stock,
                })
                .collect(),
        };

        match db.menus().create(&input).await {
            Ok(menu) => {
                sizes += menu.sizes.len();
                println!("  + {} ({} sizes)", menu.name, menu.sizes.len());
            }
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }

    println!();
    println!("✓ Seeded {} menus, {} sizes", MENUS.len(), sizes);

    db.close().await;
    Ok(())
}
