//! # Seed Data Generator
//!
//! Populates the database with demo inventory for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p stockpile-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockpile-db --bin seed -- --db ./data/stockpile.db
//! ```
//!
//! ## Generated Data
//! - Categories: Beverages, Snacks, Grocery
//! - Suppliers: Acme Wholesale, Globex Trading
//! - Clients: Walk-in, Corner Cafe
//! - A handful of products per category, each stocked via the ledger
//! - A few PAID sales so the reports have something to aggregate

use std::env;

use stockpile_core::{NewProduct, NewSale, NewSaleItem, PaymentMethod, SaleStatus};
use stockpile_db::{Database, DbConfig};

/// (sku, name, cost cents, selling cents, initial stock, category index)
const PRODUCTS: &[(&str, &str, i64, i64, i64, usize)] = &[
    ("BEV-001", "Cola 330ml", 40, 120, 120, 0),
    ("BEV-002", "Orange Juice 1L", 150, 320, 48, 0),
    ("BEV-003", "Sparkling Water 500ml", 30, 90, 8, 0),
    ("SNK-001", "Salted Chips 150g", 80, 210, 60, 1),
    ("SNK-002", "Chocolate Bar", 60, 150, 0, 1),
    ("GRO-001", "Spaghetti 500g", 70, 180, 35, 2),
    ("GRO-002", "Rice 1kg", 120, 260, 90, 2),
    ("GRO-003", "Olive Oil 750ml", 450, 899, 6, 2),
];

/// (product index, quantity) per demo sale
const SALES: &[&[(usize, i64)]] = &[
    &[(0, 12), (3, 4)],
    &[(1, 2), (6, 3)],
    &[(0, 6)],
    &[(7, 1), (5, 2), (0, 3)],
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./stockpile_dev.db");

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
                println!("Stockpile Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stockpile_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockpile Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding directory...");

    let directory = db.directory();
    let mut categories = Vec::new();
    for name in ["Beverages", "Snacks", "Grocery"] {
        categories.push(directory.create_category(name).await?);
    }
    let suppliers = vec![
        directory.create_supplier("Acme Wholesale").await?,
        directory.create_supplier("Globex Trading").await?,
    ];
    let client = directory.create_client("Corner Cafe").await?;
    directory.create_client("Walk-in").await?;

    println!("Seeding products and stock...");

    let products = db.products();
    let ledger = db.ledger();
    let mut product_ids = Vec::new();
    for (i, (sku, name, cost, sell, stock, category_idx)) in PRODUCTS.iter().enumerate() {
        let product = products
            .create(NewProduct {
                sku: sku.to_string(),
                name: name.to_string(),
                cost_price_cents: Some(*cost),
                selling_price_cents: Some(*sell),
                category_id: Some(categories[*category_idx].id.clone()),
                supplier_id: Some(suppliers[i % suppliers.len()].id.clone()),
            })
            .await?;

        if *stock > 0 {
            ledger
                .record_addition(&product.id, *stock, "purchase", Some("PO-SEED"))
                .await?;
        }
        product_ids.push(product.id);
    }

    println!("Seeding sales...");

    let sales = db.sales();
    for (n, lines) in SALES.iter().enumerate() {
        let items = lines
            .iter()
            .map(|(product_idx, quantity)| NewSaleItem {
                product_id: product_ids[*product_idx].clone(),
                quantity: *quantity,
                unit_price_cents: None,
                discount_cents: 0,
            })
            .collect();

        sales
            .create_sale(NewSale {
                client_id: if n % 2 == 0 {
                    Some(client.id.clone())
                } else {
                    None
                },
                reference: None,
                payment_method: PaymentMethod::Cash,
                notes: None,
                items,
                initial_status: SaleStatus::Paid,
            })
            .await?;
    }

    let summary = db.reports().summary(None).await?;
    let status = db.reports().stock_status().await?;

    println!();
    println!("✓ Seeded {} products, {} sales", PRODUCTS.len(), SALES.len());
    println!(
        "  Revenue: {}  Profit: {}  (margin {:.1}%)",
        summary.revenue, summary.profit, summary.profit_margin_pct
    );
    println!(
        "  Stock: {} in / {} low / {} out",
        status.in_stock, status.low_stock, status.out_of_stock
    );

    Ok(())
}
