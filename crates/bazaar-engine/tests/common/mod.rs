//! Fixtures shared by the engine integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use bazaar_core::{Money, NewProduct, Order, Product, Rate};
use bazaar_db::{Database, DbConfig};
use bazaar_engine::{Engine, EngineConfig, NewOrderRequest};
use tempfile::TempDir;

/// Engine over a fresh in-memory database with default settings.
pub async fn engine() -> Engine {
    engine_with(EngineConfig::default()).await
}

pub async fn engine_with(config: EngineConfig) -> Engine {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Engine::new(config, db)
}

pub async fn list_product(
    engine: &Engine,
    seller_id: &str,
    name: &str,
    cost_rupees: i64,
    tax_percent: u32,
    quantity: i64,
) -> Product {
    engine
        .catalog()
        .add_product(
            seller_id,
            NewProduct {
                name: name.to_string(),
                description: None,
                sku: None,
                cost_price: Money::from_rupees(cost_rupees),
                tax_rate: Rate::from_percent(tax_percent),
                quantity,
            },
        )
        .await
        .unwrap()
}

pub fn request(product_id: &str, quantity: i64) -> NewOrderRequest {
    NewOrderRequest {
        product_id: product_id.to_string(),
        quantity,
        address: Default::default(),
        payment_method: Some("upi".to_string()),
        quoted_unit_price: None,
    }
}

/// Places, ships and delivers one order.
pub async fn deliver(engine: &Engine, buyer_id: &str, product_id: &str, quantity: i64) -> Order {
    let orders = engine.orders();
    let order = orders.create_order(buyer_id, &request(product_id, quantity)).await.unwrap();
    orders.mark_shipped(&order.id, None).await.unwrap();
    orders.mark_delivered(&order.id).await.unwrap()
}

/// A database file inside a temp directory that is deleted on drop.
pub struct TempStore {
    pub path: PathBuf,
    _dir: TempDir,
}

impl TempStore {
    pub fn new() -> TempStore {
        let dir = tempfile::tempdir().unwrap();
        TempStore {
            path: dir.path().join("bazaar.db"),
            _dir: dir,
        }
    }

    /// Engine config pointing at this file.
    pub fn config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.store.database_path = self.path.clone();
        config
    }
}
