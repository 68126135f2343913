//! # Seed Data Generator
//!
//! Creates the first operator account and a small sample catalog.
//!
//! ## Usage
//! ```bash
//! # admin/admin and the sample catalog in ./level99.db
//! cargo run -p level99-db --bin seed
//!
//! # Specify database path and operator
//! L99_ADMIN_USER=maria L99_ADMIN_PASSWORD=... cargo run -p level99-db --bin seed -- --db ./data/level99.db
//!
//! # Operator only, no sample games
//! cargo run -p level99-db --bin seed -- --no-catalog
//! ```
//!
//! Safe to re-run: an existing operator gets its password reset, and the
//! catalog is only seeded into an empty products table.

use std::env;

use anyhow::Context;
use level99_core::validation::{validate_category_name, validate_product_name};
use level99_core::{Money, ProductInput};
use level99_db::{Database, DbConfig, DbError};

/// Genres and the games filed under each, with prices in cents.
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "RPG",
        &[
            ("Chrono Trigger", 4999),
            ("Final Fantasy VI", 4499),
            ("EarthBound", 3999),
            ("Secret of Mana", 3499),
        ],
    ),
    (
        "Platformer",
        &[
            ("Super Mario World", 2999),
            ("Sonic the Hedgehog 2", 1999),
            ("Mega Man X", 2499),
        ],
    ),
    (
        "Action",
        &[
            ("The Legend of Zelda: A Link to the Past", 3999),
            ("Super Metroid", 3499),
            ("Contra III", 2299),
        ],
    ),
    (
        "Puzzle",
        &[("Tetris", 999), ("Dr. Mario", 899), ("Puyo Puyo", 1299)],
    ),
    (
        "Fighting",
        &[("Street Fighter II Turbo", 2799), ("Mortal Kombat II", 2599)],
    ),
];

/// Uncategorized extras.
const EXTRAS: &[(&str, i64)] = &[("Memory Card 8MB", 1499), ("Demo Disc", 0)];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("L99_DB_PATH").unwrap_or_else(|_| "./level99.db".to_string());
    let mut with_catalog = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--no-catalog" => with_catalog = false,
            "--help" | "-h" => {
                println!("Level 99 Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $L99_DB_PATH or ./level99.db)");
                println!("      --no-catalog   Only create the operator account");
                println!("  -h, --help         Show this help message");
                println!();
                println!("Environment:");
                println!("  L99_ADMIN_USER      Operator username (default: admin)");
                println!("  L99_ADMIN_PASSWORD  Operator password (default: admin)");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let username = env::var("L99_ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    let password = env::var("L99_ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());

    println!("🌱 Level 99 Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("Failed to open {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Operator account
    match db.users().create(&username, &password).await {
        Ok(user) => println!("✓ Created operator '{}'", user.username),
        Err(DbError::UniqueViolation { .. }) => {
            db.users().set_password(&username, &password).await?;
            println!("✓ Operator '{}' exists, password reset", username);
        }
        Err(e) => return Err(e.into()),
    }
    if password == "admin" {
        println!("⚠ Using the default password. Set L99_ADMIN_PASSWORD for real use.");
    }

    if !with_catalog {
        println!();
        println!("✓ Seed complete!");
        return Ok(());
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalog to avoid duplicates.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let mut generated = 0;
    for (genre, games) in CATALOG {
        let category = db.categories().insert(&validate_category_name(genre)?).await?;

        for (name, cents) in games.iter() {
            let input = ProductInput {
                name: validate_product_name(name)?,
                price: Money::from_cents(*cents),
                category_id: Some(category.id),
            };
            if let Err(e) = db.products().insert(&input).await {
                eprintln!("Failed to insert {}: {}", name, e);
                continue;
            }
            generated += 1;
        }
    }

    for (name, cents) in EXTRAS {
        let input = ProductInput {
            name: name.to_string(),
            price: Money::from_cents(*cents),
            category_id: None,
        };
        db.products().insert(&input).await?;
        generated += 1;
    }

    println!(
        "✓ Generated {} categories and {} products",
        CATALOG.len(),
        generated
    );
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
