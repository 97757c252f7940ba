//! # Seed Data Generator
//!
//! Populates a database with a demo marketplace for development.
//!
//! ## Usage
//! ```bash
//! # Three sellers (default)
//! cargo run -p bazaar-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p bazaar-db --bin seed -- --sellers 10 --db ./data/bazaar.db
//!
//! # More logging
//! RUST_LOG=bazaar_db=trace cargo run -p bazaar-db --bin seed
//! ```
//!
//! ## Generated Data
//! Per seller:
//! - One listing per catalog entry, GST 5 % / 12 % / 18 % in rotation
//! - A default payout account
//! - Orders in every status, so dashboards and payouts have numbers to show

use bazaar_core::{
    AccountType, DeliveryAddress, Money, NewProduct, OrderStatus, PaymentMethodDetails, Product,
    Rate,
};
use bazaar_db::{generate_product_id, Database, DbConfig, NewOrder};
use chrono::Utc;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Demo catalog: (name, SKU stem, cost in rupees).
const CATALOG: &[(&str, &str, i64)] = &[
    ("Banarasi Silk Saree", "SAR", 4_200),
    ("Madhubani Wall Painting", "ART", 1_850),
    ("Brass Diya Set", "DIY", 640),
    ("Terracotta Planter", "POT", 380),
    ("Pashmina Shawl", "SHL", 3_100),
    ("Darjeeling First Flush Tea", "TEA", 520),
    ("Kolhapuri Chappal", "CHP", 950),
    ("Channapatna Toy Train", "TOY", 710),
];

/// GST slabs in basis points.
const TAX_RATES: &[u32] = &[500, 1200, 1800];

const CITIES: &[(&str, &str, &str)] = &[
    ("Kolkata", "West Bengal", "700001"),
    ("Mumbai", "Maharashtra", "400001"),
    ("Bengaluru", "Karnataka", "560001"),
    ("Jaipur", "Rajasthan", "302001"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bazaar=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut sellers: usize = 3;
    let mut db_path = String::from("./bazaar_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sellers" | "-s" => {
                if i + 1 < args.len() {
                    sellers = args[i + 1].parse().unwrap_or(3);
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
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sellers <N>  Number of demo sellers (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./bazaar_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, sellers, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count_by_seller(&seller_id(0)).await?;
    if existing > 0 {
        warn!(existing, "Database already seeded; delete the file to regenerate");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut orders_placed = 0usize;

    for seller_idx in 0..sellers {
        let seller = seller_id(seller_idx);
        let products = seed_catalog(&db, &seller, seller_idx).await?;

        db.payment_methods()
            .add(
                &seller,
                &PaymentMethodDetails {
                    bank_name: "State Bank of India".to_string(),
                    account_type: AccountType::Current,
                    account_holder: format!("Demo Seller {}", seller_idx + 1),
                    account_number: format!("3000{:08}", seller_idx + 1),
                    routing_code: "SBIN0000691".to_string(),
                },
                true,
                Utc::now(),
            )
            .await?;

        orders_placed += seed_orders(&db, &products, seller_idx).await?;

        let dashboard = db.reports().dashboard(&seller).await?;
        info!(
            seller = %seller,
            products = dashboard.product_count,
            orders = dashboard.order_count,
            revenue = %dashboard.delivered_revenue_formatted,
            "Seller seeded"
        );
    }

    info!(
        sellers,
        orders = orders_placed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    Ok(())
}

fn seller_id(idx: usize) -> String {
    format!("seller-{:03}", idx + 1)
}

async fn seed_catalog(
    db: &Database,
    seller: &str,
    seller_idx: usize,
) -> Result<Vec<Product>, Box<dyn std::error::Error>> {
    let mut products = Vec::with_capacity(CATALOG.len());

    for (idx, (name, stem, cost)) in CATALOG.iter().enumerate() {
        let input = NewProduct {
            name: name.to_string(),
            description: None,
            sku: Some(format!("{}-{:03}-{:02}", stem, seller_idx + 1, idx)),
            cost_price: Money::from_rupees(*cost),
            tax_rate: Rate::from_bps(TAX_RATES[(seller_idx + idx) % TAX_RATES.len()]),
            quantity: 20 + ((seller_idx * 7 + idx * 13) % 60) as i64,
        };
        let product = Product::create(generate_product_id(), seller.to_string(), input, Utc::now())?;
        products.push(db.products().insert(&product).await?);
    }

    Ok(products)
}

/// Places one order per product and walks them through the lifecycle:
/// every fourth stays processing, the rest ship, most get delivered and
/// a few are cancelled in transit.
async fn seed_orders(
    db: &Database,
    products: &[Product],
    seller_idx: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    for (idx, product) in products.iter().enumerate() {
        let (city, state, pincode) = CITIES[(seller_idx + idx) % CITIES.len()];
        let request = NewOrder {
            product_id: product.id.clone(),
            quantity: 1 + (idx % 3) as i64,
            address: DeliveryAddress {
                city: Some(city.to_string()),
                state: Some(state.to_string()),
                pincode: Some(pincode.to_string()),
            },
            payment_method: Some(["upi", "card", "cod"][idx % 3].to_string()),
            quoted_unit_price: None,
        };

        let order = db.orders().place(&format!("buyer-{:03}", idx + 1), &request, Utc::now()).await?;

        if idx % 4 == 0 {
            continue;
        }
        db.orders().transition(&order.id, OrderStatus::InTransit, None, Utc::now()).await?;

        let last = if idx % 5 == 0 {
            OrderStatus::Cancelled
        } else {
            OrderStatus::Delivered
        };
        db.orders().transition(&order.id, last, None, Utc::now()).await?;
    }

    Ok(products.len())
}
