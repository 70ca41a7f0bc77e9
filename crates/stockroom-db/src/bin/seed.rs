//! # Seed Data Generator
//!
//! Populates the database with categories, products and a few weeks of
//! sales history for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockroom-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! - One category per entry in `CATEGORIES`
//! - Products named `{item} {size}` with prices $1.99 - $12.49 and stock 0 - 100
//! - `--sales <N>` historical transactions spread over the last 30 days
//!   (recorded without touching stock)

use chrono::{Duration, Utc};
use std::env;
use stockroom_core::{Money, NewCategory, NewProduct, Product};
use stockroom_db::migrations::migration_status;
use stockroom_db::{Database, DbConfig};

/// Categories and their items
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "Beverages",
        "Sodas, water, juice and coffee",
        &[
            "Cola",
            "Lemon Soda",
            "Mineral Water",
            "Orange Juice",
            "Apple Juice",
            "Iced Tea",
            "Kopi",
            "Teh Tarik",
        ],
    ),
    (
        "Snacks",
        "Chips, candy and cookies",
        &[
            "Potato Chips",
            "Tortilla Chips",
            "Peanuts",
            "Chocolate Bar",
            "Gummy Bears",
            "Butter Cookies",
            "Crackers",
            "Pretzels",
        ],
    ),
    (
        "Dairy",
        "Milk, cheese and yogurt",
        &[
            "Whole Milk",
            "Oat Milk",
            "Cheddar",
            "Mozzarella",
            "Greek Yogurt",
            "Butter",
            "Eggs Dozen",
            "Cream Cheese",
        ],
    ),
    (
        "Grocery",
        "Dry and canned goods",
        &[
            "Rice",
            "Spaghetti",
            "Canned Beans",
            "Canned Tomatoes",
            "Oatmeal",
            "Peanut Butter",
            "Honey",
            "Flour",
        ],
    ),
];

/// Size variants and their price add-on in cents
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("Family Pack", 250),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut sales: usize = 50;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -s, --sales <N>    Number of past transactions (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!("Sales:    {}", sales);
    println!();

    // Connect to database
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let (total, applied) = migration_status(db.pool()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied ({}/{})", applied, total);

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut products: Vec<Product> = Vec::with_capacity(count);
    let mut seed = 0usize;

    'outer: for (category_name, description, items) in CATEGORIES {
        let category = db
            .categories()
            .create(&NewCategory {
                name: category_name.to_string(),
                description: description.to_string(),
            })
            .await?;

        for item in items.iter() {
            for (size, price_addon) in SIZES {
                if products.len() >= count {
                    break 'outer;
                }

                let new = generate_product(category.id, item, size, *price_addon, seed);
                seed += 1;

                match db.products().create(&new).await {
                    Ok(product) => products.push(product),
                    Err(e) => eprintln!("Failed to insert {}: {}", new.name, e),
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!(
        "✓ Generated {} products in {} categories in {:?}",
        products.len(),
        db.categories().count().await?,
        elapsed
    );

    if !products.is_empty() {
        println!();
        println!("Recording sales history...");

        let now = Utc::now();
        for n in 0..sales {
            let created_at = now - Duration::hours((n * 13 % (30 * 24)) as i64);
            let lines: Vec<(i64, i64, Money)> = (0..1 + n % 3)
                .map(|k| {
                    let product = &products[(n * 7 + k * 11) % products.len()];
                    let quantity = 1 + ((n + k) % 4) as i64;
                    (product.id, quantity, product.price().multiply_quantity(quantity))
                })
                .collect();

            if let Err(e) = db.transactions().record(created_at, &lines).await {
                eprintln!("Failed to record sale {}: {}", n, e);
            }
        }

        println!("✓ Recorded {} transactions", db.transactions().count().await?);
    }

    // Verify search
    println!();
    println!("Verifying search...");
    let results = db.products().search_by_name("milk").await?;
    println!("  Search 'milk': {} results", results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic data.
fn generate_product(
    category_id: i64,
    item: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> NewProduct {
    // Base $1.99 - $9.99 plus size addon
    let price_cents = 199 + ((seed * 17) % 800) as i64 + price_addon;

    NewProduct {
        name: format!("{} {}", item, size),
        price_cents,
        stock: (seed % 101) as i64,
        category_id,
    }
}
