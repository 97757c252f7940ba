//! Concurrent writers against a real SQLite file with a multi-connection pool.
//!
//! In-memory databases are limited to one connection, so these tests use a
//! temp file to get genuinely parallel transactions.

use std::path::PathBuf;

use bazaar_core::{
    AccountType, ErrorKind, Money, NewProduct, OrderStatus, PaymentMethodDetails, Product, Rate,
};
use bazaar_db::{generate_product_id, Database, DbConfig, NewOrder};
use chrono::Utc;
use tempfile::TempDir;

/// A multi-connection database in a temp directory deleted on drop.
struct TempDb {
    path: PathBuf,
    db: Database,
    _dir: TempDir,
}

impl TempDb {
    async fn open() -> TempDb {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bazaar.db");
        let db = Database::new(DbConfig::new(&path).max_connections(8))
            .await
            .unwrap();
        TempDb { path, db, _dir: dir }
    }
}

async fn seed_product(db: &Database, seller: &str, quantity: i64, cost_rupees: i64) -> Product {
    let product = Product::create(
        generate_product_id(),
        seller.to_string(),
        NewProduct {
            name: "Last Pashmina".to_string(),
            description: None,
            sku: None,
            cost_price: Money::from_rupees(cost_rupees),
            tax_rate: Rate::zero(),
            quantity,
        },
        Utc::now(),
    )
    .unwrap();
    db.products().insert(&product).await.unwrap()
}

fn order_for(product_id: &str) -> NewOrder {
    NewOrder {
        product_id: product_id.to_string(),
        quantity: 1,
        address: Default::default(),
        payment_method: None,
        quoted_unit_price: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_unit_sells_once() {
    let temp = TempDb::open().await;
    let product = seed_product(&temp.db, "seller-1", 1, 500).await;

    let mut handles = Vec::new();
    for buyer in 0..2 {
        let db = temp.db.clone();
        let request = order_for(&product.id);
        handles.push(tokio::spawn(async move {
            db.orders().place(&format!("buyer-{}", buyer), &request, Utc::now()).await
        }));
    }

    let mut placed = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(e) if e.kind() == ErrorKind::InsufficientStock => out_of_stock += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!((placed, out_of_stock), (1, 1));
    let stored = temp.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.quantity, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_numbers_unique_under_contention() {
    let temp = TempDb::open().await;
    let product = seed_product(&temp.db, "seller-1", 100, 10).await;

    let mut handles = Vec::new();
    for buyer in 0..16 {
        let db = temp.db.clone();
        let request = order_for(&product.id);
        handles.push(tokio::spawn(async move {
            db.orders().place(&format!("buyer-{}", buyer), &request, Utc::now()).await
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().order_number);
    }
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 16);

    let stored = temp.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.quantity, 84);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_payouts_cannot_overdraw() {
    let temp = TempDb::open().await;
    let db = &temp.db;
    let product = seed_product(db, "seller-1", 1, 1_000).await;

    let order = db.orders().place("buyer-1", &order_for(&product.id), Utc::now()).await.unwrap();
    db.orders().transition(&order.id, OrderStatus::InTransit, None, Utc::now()).await.unwrap();
    db.orders().transition(&order.id, OrderStatus::Delivered, None, Utc::now()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let db = temp.db.clone();
        handles.push(tokio::spawn(async move {
            db.payouts()
                .request("seller-1", Money::from_rupees(600), Rate::from_percent(10), None, Utc::now())
                .await
        }));
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) if e.kind() == ErrorKind::InsufficientPayableBalance => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!((accepted, rejected), (1, 1));
    assert_eq!(
        db.payouts().outstanding_total("seller-1").await.unwrap(),
        Money::from_rupees(600)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_default_additions_leave_one_default() {
    let temp = TempDb::open().await;

    let mut handles = Vec::new();
    for n in 0..8 {
        let db = temp.db.clone();
        handles.push(tokio::spawn(async move {
            db.payment_methods()
                .add(
                    "seller-1",
                    &PaymentMethodDetails {
                        bank_name: format!("Bank {}", n),
                        account_type: AccountType::Savings,
                        account_holder: "Meera Iyer".to_string(),
                        account_number: format!("90000000{:02}", n),
                        routing_code: "ICIC0000042".to_string(),
                    },
                    true,
                    Utc::now(),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let methods = temp.db.payment_methods().list_by_seller("seller-1").await.unwrap();
    assert_eq!(methods.len(), 8);
    assert_eq!(methods.iter().filter(|m| m.is_default).count(), 1);
}

#[tokio::test]
async fn test_read_only_replica_serves_reports() {
    let temp = TempDb::open().await;
    seed_product(&temp.db, "seller-1", 3, 100).await;

    let replica = Database::new(DbConfig::new(&temp.path).read_only()).await.unwrap();
    let stats = replica.reports().dashboard("seller-1").await.unwrap();
    assert_eq!(stats.product_count, 1);

    let err = replica
        .products()
        .deactivate("anything", Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

    replica.close().await;
}
