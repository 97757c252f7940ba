//! # Order Repository
//!
//! Order placement and lifecycle persistence.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. PLACE (one transaction)                                            │
//! │     ├── UPDATE products SET quantity = quantity - q                    │
//! │     │   WHERE id = ? AND status = 'active' AND quantity >= q           │
//! │     │   (0 rows → NotFound / ProductInactive / InsufficientStock)      │
//! │     ├── next ORD number                                                │
//! │     ├── INSERT INTO orders (price snapshot)                            │
//! │     └── INSERT INTO event_outbox (order.created)                       │
//! │                                                                         │
//! │  2. TRANSITION (compare-and-swap)                                      │
//! │     ├── plan in bazaar-core (state table, tracking id, timestamps)     │
//! │     ├── UPDATE orders SET status = to ... WHERE id = ? AND status = from│
//! │     │   (0 rows → someone else moved it first → InvalidTransition)     │
//! │     └── INSERT INTO event_outbox (order.status_changed)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders are financial records and are never deleted.

use bazaar_core::pricing::price_order_line;
use bazaar_core::validation::{validate_pincode, validate_quantity, validate_search_query};
use bazaar_core::{
    CoreError, DeliveryAddress, DomainEvent, Money, Order, OrderStatus, Product, ProductStatus,
    ORDER_NUMBER_PREFIX,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::outbox;
use crate::repository::sequence::{next_document_number, ORDER_SEQUENCE};

// =============================================================================
// Request & Filter Types
// =============================================================================

/// What a buyer submits to order one product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub address: DeliveryAddress,
    /// Informational label such as `upi`, `card` or `cod`.
    pub payment_method: Option<String>,
    /// Pre-tax unit price the buyer was shown. When set, placement is
    /// rejected if the listing's price has since moved.
    #[serde(default)]
    pub quoted_unit_price: Option<Money>,
}

/// Seller order listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches order number or product name.
    pub search: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Places a single order atomically.
    ///
    /// ## Returns
    /// * `Err(DbError::Rejected(NotFound))` - No such product
    /// * `Err(DbError::Rejected(ProductInactive))` - Product deactivated
    /// * `Err(DbError::Rejected(InsufficientStock))` - Not enough on hand
    pub async fn place(
        &self,
        buyer_id: &str,
        request: &NewOrder,
        now: DateTime<Utc>,
    ) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;
        let order = place_in_tx(&mut tx, buyer_id, request, now).await?;
        tx.commit().await?;

        debug!(order_number = %order.order_number, "Order placed");
        Ok(order)
    }

    /// Places one order per request in a single transaction.
    ///
    /// All or nothing: the first rejection rolls back every earlier line,
    /// including its stock decrement and order number.
    pub async fn place_many(
        &self,
        buyer_id: &str,
        requests: &[NewOrder],
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Order>> {
        let mut tx = self.pool.begin().await?;
        let mut orders = Vec::with_capacity(requests.len());

        for request in requests {
            orders.push(place_in_tx(&mut tx, buyer_id, request, now).await?);
        }

        tx.commit().await?;

        debug!(buyer_id = %buyer_id, count = orders.len(), "Checkout committed");
        Ok(orders)
    }

    /// Moves an order to `target` with a compare-and-swap on its status.
    ///
    /// `tracking_id` is only consulted on the move to in_transit.
    pub async fn transition(
        &self,
        order_id: &str,
        target: OrderStatus,
        tracking_id: Option<String>,
        now: DateTime<Utc>,
    ) -> DbResult<Order> {
        let (order, _) = self
            .transition_recorded(order_id, target, tracking_id, now)
            .await?;
        Ok(order)
    }

    /// Like [`transition`](Self::transition), also returning the
    /// `order.status_changed` event written to the outbox.
    pub async fn transition_recorded(
        &self,
        order_id: &str,
        target: OrderStatus,
        tracking_id: Option<String>,
        now: DateTime<Utc>,
    ) -> DbResult<(Order, DomainEvent)> {
        let mut order = self
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let plan = order.plan_transition(target, tracking_id, now)?;

        debug!(
            order_id = %order_id,
            from = %plan.from,
            to = %plan.to,
            "Transitioning order"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?3,
                tracking_id = ?4,
                shipped_at = ?5,
                delivered_at = ?6,
                updated_at = ?7
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(order_id)
        .bind(plan.from)
        .bind(plan.to)
        .bind(&plan.tracking_id)
        .bind(plan.shipped_at)
        .bind(plan.delivered_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            drop(tx);
            // Lost the race: report against whatever status won.
            let current = self
                .get_by_id(order_id)
                .await?
                .ok_or_else(|| DbError::not_found("Order", order_id))?;
            return Err(CoreError::InvalidTransition {
                entity: "order",
                id: order_id.to_string(),
                from: current.status.to_string(),
                to: target.to_string(),
            }
            .into());
        }

        order.apply_transition(&plan, now);
        let event = DomainEvent::order_status_changed(&order, plan.from);
        outbox::append(&mut tx, &event, now).await?;

        tx.commit().await?;

        Ok((order, event))
    }

    /// A seller's orders, newest first.
    pub async fn list_by_seller(&self, seller_id: &str, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let pattern = match &filter.search {
            Some(query) => {
                let query = validate_search_query(query).map_err(CoreError::from)?;
                (!query.is_empty()).then(|| format!("%{}%", query))
            }
            None => None,
        };

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE seller_id = ?1
            AND (?2 IS NULL OR status = ?2)
            AND (?3 IS NULL OR order_number LIKE ?3 OR product_name LIKE ?3)
            ORDER BY created_at DESC, order_number DESC
            "#,
        )
        .bind(seller_id)
        .bind(filter.status)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// A buyer's order history, newest first.
    pub async fn list_by_buyer(&self, buyer_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE buyer_id = ?1 ORDER BY created_at DESC, order_number DESC",
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

// =============================================================================
// Placement
// =============================================================================

/// Places one order on the caller's transaction.
///
/// The conditional decrement is the first statement, so competing checkouts
/// queue on the write lock and the loser sees the winner's stock.
async fn place_in_tx(
    conn: &mut SqliteConnection,
    buyer_id: &str,
    request: &NewOrder,
    now: DateTime<Utc>,
) -> DbResult<Order> {
    validate_quantity(request.quantity).map_err(CoreError::from)?;
    if let Some(pincode) = &request.address.pincode {
        validate_pincode(pincode).map_err(CoreError::from)?;
    }

    let decremented = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND status = 'active' AND quantity >= ?2
        "#,
    )
    .bind(&request.product_id)
    .bind(request.quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if decremented.rows_affected() == 0 {
        return Err(stock_rejection(conn, &request.product_id, request.quantity).await);
    }

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
        .bind(&request.product_id)
        .fetch_one(&mut *conn)
        .await?;

    if let Some(quoted) = request.quoted_unit_price {
        if quoted != product.cost_price {
            return Err(CoreError::PriceChanged {
                product_id: product.id.clone(),
                quoted,
                current: product.cost_price,
            }
            .into());
        }
    }

    let order_number = next_document_number(conn, ORDER_SEQUENCE, ORDER_NUMBER_PREFIX, now).await?;
    let pricing = price_order_line(product.cost_price, request.quantity, product.tax_rate)?;

    let order = Order {
        id: Uuid::new_v4().to_string(),
        order_number,
        seller_id: product.seller_id.clone(),
        buyer_id: buyer_id.to_string(),
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity: request.quantity,
        unit_price: product.cost_price,
        tax_rate: product.tax_rate,
        tax_amount: pricing.tax_amount,
        total_amount: pricing.total_amount,
        status: OrderStatus::Processing,
        tracking_id: None,
        payment_method: request.payment_method.clone(),
        shipping_city: request.address.city.clone(),
        shipping_state: request.address.state.clone(),
        shipping_pincode: request.address.pincode.clone(),
        shipped_at: None,
        delivered_at: None,
        created_at: now,
        updated_at: now,
    };

    debug!(
        order_number = %order.order_number,
        product_id = %order.product_id,
        quantity = order.quantity,
        "Inserting order"
    );

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, seller_id, buyer_id, product_id, product_name,
            quantity, unit_price, tax_rate, tax_amount, total_amount,
            status, tracking_id, payment_method,
            shipping_city, shipping_state, shipping_pincode,
            shipped_at, delivered_at, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14,
            ?15, ?16, ?17,
            ?18, ?19, ?20, ?21
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.seller_id)
    .bind(&order.buyer_id)
    .bind(&order.product_id)
    .bind(&order.product_name)
    .bind(order.quantity)
    .bind(order.unit_price)
    .bind(order.tax_rate)
    .bind(order.tax_amount)
    .bind(order.total_amount)
    .bind(order.status)
    .bind(&order.tracking_id)
    .bind(&order.payment_method)
    .bind(&order.shipping_city)
    .bind(&order.shipping_state)
    .bind(&order.shipping_pincode)
    .bind(order.shipped_at)
    .bind(order.delivered_at)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    outbox::append(conn, &DomainEvent::order_created(&order), now).await?;

    Ok(order)
}

/// Works out why the conditional decrement matched nothing.
async fn stock_rejection(conn: &mut SqliteConnection, product_id: &str, requested: i64) -> DbError {
    let row: Result<Option<(ProductStatus, i64)>, sqlx::Error> =
        sqlx::query_as("SELECT status, quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await;

    match row {
        Ok(None) => CoreError::not_found("product", product_id).into(),
        Ok(Some((ProductStatus::Inactive, _))) => CoreError::ProductInactive {
            product_id: product_id.to_string(),
        }
        .into(),
        Ok(Some((ProductStatus::Active, available))) => CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            available,
            requested,
        }
        .into(),
        Err(e) => e.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::generate_product_id;
    use crate::{Database, DbConfig};
    use bazaar_core::{ErrorKind, Money, NewProduct, Rate};

    async fn seed_product(db: &Database, quantity: i64) -> Product {
        let product = Product::create(
            generate_product_id(),
            "seller-1".to_string(),
            NewProduct {
                name: "Brass Diya".to_string(),
                description: None,
                sku: None,
                cost_price: Money::from_rupees(100),
                tax_rate: Rate::from_percent(18),
                quantity,
            },
            Utc::now(),
        )
        .unwrap();
        db.products().insert(&product).await.unwrap()
    }

    fn request(product_id: &str, quantity: i64) -> NewOrder {
        NewOrder {
            product_id: product_id.to_string(),
            quantity,
            address: DeliveryAddress {
                city: Some("Kolkata".to_string()),
                state: Some("West Bengal".to_string()),
                pincode: Some("700001".to_string()),
            },
            payment_method: Some("upi".to_string()),
            quoted_unit_price: None,
        }
    }

    #[tokio::test]
    async fn test_place_snapshots_price_and_decrements_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 5).await;

        let order = db.orders().place("buyer-1", &request(&product.id, 2), Utc::now()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.unit_price, Money::from_rupees(100));
        assert_eq!(order.tax_amount, Money::from_rupees(36));
        assert_eq!(order.total_amount, Money::from_rupees(236));
        assert!(order.order_number.starts_with("ORD-"));
        assert!(order.order_number.ends_with("-000001"));

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 3);

        let events = db.outbox().for_aggregate(&order.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "order.created");
    }

    #[tokio::test]
    async fn test_place_rejections() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 1).await;
        let orders = db.orders();

        let err = orders.place("b", &request(&product.id, 2), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        let err = orders.place("b", &request("missing", 1), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = orders.place("b", &request(&product.id, 0), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        db.products().deactivate(&product.id, Utc::now()).await.unwrap();
        let err = orders.place("b", &request(&product.id, 1), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 1);
    }

    #[tokio::test]
    async fn test_place_rejects_stale_quote() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 4).await;
        let orders = db.orders();

        let mut stale = request(&product.id, 1);
        stale.quoted_unit_price = Some(Money::from_rupees(90));
        let err = orders.place("b", &stale, Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::PriceChanged { .. })
        ));

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 4);

        let mut current = request(&product.id, 1);
        current.quoted_unit_price = Some(Money::from_rupees(100));
        let order = orders.place("b", &current, Utc::now()).await.unwrap();
        assert_eq!(order.unit_price, Money::from_rupees(100));
    }

    #[tokio::test]
    async fn test_place_many_is_all_or_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let plenty = seed_product(&db, 10).await;
        let scarce = seed_product(&db, 1).await;

        let err = db
            .orders()
            .place_many(
                "buyer-1",
                &[request(&plenty.id, 3), request(&scarce.id, 2)],
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        let stored = db.products().get_by_id(&plenty.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 10);
        assert!(db.orders().list_by_buyer("buyer-1").await.unwrap().is_empty());

        let placed = db
            .orders()
            .place_many("buyer-1", &[request(&plenty.id, 3), request(&scarce.id, 1)], Utc::now())
            .await
            .unwrap();
        assert_eq!(placed.len(), 2);
        // The rolled-back attempt handed its numbers back.
        assert!(placed[0].order_number.ends_with("-000001"));
    }

    #[tokio::test]
    async fn test_transition_sets_tracking_and_timestamps() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 5).await;
        let order = db.orders().place("buyer-1", &request(&product.id, 1), Utc::now()).await.unwrap();

        let shipped = db
            .orders()
            .transition(&order.id, OrderStatus::InTransit, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::InTransit);
        assert!(shipped.shipped_at.is_some());
        let expected_tracking = format!("TRK-{}", order.order_number.trim_start_matches("ORD-"));
        assert_eq!(shipped.tracking_id.as_deref(), Some(expected_tracking.as_str()));

        let delivered = db
            .orders()
            .transition(&order.id, OrderStatus::Delivered, None, Utc::now())
            .await
            .unwrap();
        assert!(delivered.delivered_at.is_some());

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored, delivered);

        let events = db.outbox().for_aggregate(&order.id).await.unwrap();
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn test_illegal_transition_leaves_order_unchanged() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 5).await;
        let order = db.orders().place("buyer-1", &request(&product.id, 1), Utc::now()).await.unwrap();

        for target in [OrderStatus::Processing, OrderStatus::Delivered] {
            let err = db
                .orders()
                .transition(&order.id, target, None, Utc::now())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        }

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn test_recorded_transition_reports_prior_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 5).await;
        let order = db.orders().place("buyer-1", &request(&product.id, 1), Utc::now()).await.unwrap();

        let (cancelled, event) = db
            .orders()
            .transition_recorded(&order.id, OrderStatus::Cancelled, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        match event {
            DomainEvent::OrderStatusChanged { from, to, .. } => {
                assert_eq!(from, OrderStatus::Processing);
                assert_eq!(to, OrderStatus::Cancelled);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_by_seller_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 10).await;
        let first = db.orders().place("buyer-1", &request(&product.id, 1), Utc::now()).await.unwrap();
        let second = db.orders().place("buyer-2", &request(&product.id, 1), Utc::now()).await.unwrap();
        db.orders()
            .transition(&first.id, OrderStatus::Cancelled, None, Utc::now())
            .await
            .unwrap();

        let all = db.orders().list_by_seller("seller-1", &OrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let cancelled = db
            .orders()
            .list_by_seller(
                "seller-1",
                &OrderFilter {
                    status: Some(OrderStatus::Cancelled),
                    search: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);

        let by_number = db
            .orders()
            .list_by_seller(
                "seller-1",
                &OrderFilter {
                    status: None,
                    search: Some(second.order_number.clone()),
                },
            )
            .await
            .unwrap();
        assert_eq!(by_number.len(), 1);

        let by_name = db
            .orders()
            .list_by_seller(
                "seller-1",
                &OrderFilter {
                    status: None,
                    search: Some("diya".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(by_name.len(), 2);

        assert_eq!(db.orders().list_by_buyer("buyer-2").await.unwrap().len(), 1);
    }
}
