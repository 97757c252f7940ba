//! Catalog, checkout and the order lifecycle through the engine.

mod common;

use bazaar_core::{
    Cart, DeliveryAddress, DomainEvent, ErrorKind, Money, OrderStatus, ProductStatus,
    ProductUpdate, Rate,
};
use bazaar_engine::{CheckoutDetails, OrderFilter, ProductFilter};
use common::{deliver, engine, list_product, request};

#[tokio::test]
async fn test_create_order_prices_and_decrements() {
    let engine = engine().await;
    let product = list_product(&engine, "seller-1", "Kanjivaram Saree", 100, 18, 10).await;
    assert_eq!(product.sell_price, Money::from_rupees(118));

    let order = engine
        .orders()
        .create_order("buyer-1", &request(&product.id, 3))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.unit_price, Money::from_rupees(100));
    assert_eq!(order.tax_amount, Money::from_rupees(54));
    assert_eq!(order.total_amount, Money::from_rupees(354));
    assert!(order.order_number.starts_with("ORD-"));

    let stored = engine.catalog().get_product(&product.id).await.unwrap();
    assert_eq!(stored.quantity, 7);
}

#[tokio::test]
async fn test_create_order_rejections() {
    let engine = engine().await;
    let product = list_product(&engine, "seller-1", "Clay Kulhad Set", 200, 5, 2).await;
    let orders = engine.orders();

    let err = orders.create_order("buyer-1", &request("missing", 1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    for quantity in [0, 1_000] {
        let err = orders
            .create_order("buyer-1", &request(&product.id, quantity))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    let err = orders
        .create_order("buyer-1", &request(&product.id, 3))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientStock);

    engine.catalog().deactivate_product(&product.id).await.unwrap();
    let err = orders
        .create_order("buyer-1", &request(&product.id, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let stored = engine.catalog().get_product(&product.id).await.unwrap();
    assert_eq!(stored.quantity, 2);
    assert!(orders.list_buyer_orders("buyer-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lifecycle_and_illegal_moves() {
    let engine = engine().await;
    let product = list_product(&engine, "seller-1", "Phulkari Dupatta", 900, 12, 5).await;
    let orders = engine.orders();

    let order = orders.create_order("buyer-1", &request(&product.id, 1)).await.unwrap();
    let shipped = orders
        .mark_shipped(&order.id, Some("DTDC-99812".to_string()))
        .await
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::InTransit);
    assert_eq!(shipped.tracking_id.as_deref(), Some("DTDC-99812"));
    assert!(shipped.shipped_at.is_some());

    let delivered = orders.mark_delivered(&order.id).await.unwrap();
    assert!(delivered.delivered_at.is_some());
    assert_eq!(delivered.total_amount, order.total_amount);

    for target in [
        OrderStatus::Processing,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ] {
        let err = orders.transition(&order.id, target, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }
    assert_eq!(orders.get_order(&order.id).await.unwrap(), delivered);

    let err = orders.get_order("no-such-order").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_in_transit_cancel_keeps_stock() {
    let engine = engine().await;
    let product = list_product(&engine, "seller-1", "Cane Basket", 150, 0, 4).await;
    let orders = engine.orders();

    let order = orders.create_order("buyer-1", &request(&product.id, 2)).await.unwrap();
    orders.mark_shipped(&order.id, None).await.unwrap();
    let cancelled = orders.cancel(&order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let stored = engine.catalog().get_product(&product.id).await.unwrap();
    assert_eq!(stored.quantity, 2);
}

#[tokio::test]
async fn test_events_follow_commits() {
    let engine = engine().await;
    let mut events = engine.subscribe();
    let product = list_product(&engine, "seller-1", "Mysore Sandal Soap", 60, 18, 10).await;
    let orders = engine.orders();

    let order = orders.create_order("buyer-1", &request(&product.id, 1)).await.unwrap();
    orders.cancel(&order.id).await.unwrap();
    let _ = orders.create_order("buyer-1", &request(&product.id, 50)).await.unwrap_err();

    match events.try_recv().unwrap() {
        DomainEvent::OrderCreated { order_id, total_amount, .. } => {
            assert_eq!(order_id, order.id);
            assert_eq!(total_amount, order.total_amount);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match events.try_recv().unwrap() {
        DomainEvent::OrderStatusChanged { from, to, .. } => {
            assert_eq!(from, OrderStatus::Processing);
            assert_eq!(to, OrderStatus::Cancelled);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    // The rejected order published nothing
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_checkout_places_every_line() {
    let engine = engine().await;
    let lamp = list_product(&engine, "seller-1", "Dokra Lamp", 300, 12, 5).await;
    let mat = list_product(&engine, "seller-2", "Sabai Grass Mat", 150, 5, 5).await;

    let mut cart = Cart::new();
    cart.add(&lamp, 1).unwrap();
    cart.add(&mat, 1).unwrap();

    let details = CheckoutDetails {
        address: DeliveryAddress {
            city: Some("Bhubaneswar".to_string()),
            state: Some("Odisha".to_string()),
            pincode: Some("751001".to_string()),
        },
        payment_method: Some("cod".to_string()),
    };
    let receipt = engine.orders().checkout("buyer-1", &cart, &details).await.unwrap();

    assert_eq!(receipt.orders.len(), 2);
    assert_eq!(receipt.orders[0].seller_id, "seller-1");
    assert_eq!(receipt.orders[1].seller_id, "seller-2");
    // 450 is under the ₹500 threshold: flat ₹60 shipping; tax is each
    // product's own rate (12% of 300 + 5% of 150)
    assert_eq!(receipt.totals.subtotal, Money::from_rupees(450));
    assert_eq!(receipt.totals.shipping, Money::from_rupees(60));
    assert_eq!(receipt.totals.tax, Money::from_paise(4_350));
    assert_eq!(receipt.totals.total, Money::from_paise(55_350));

    let charged: Money = receipt.orders.iter().map(|o| o.total_amount).sum();
    assert_eq!(receipt.totals.total, charged + receipt.totals.shipping);

    let history = engine.orders().list_buyer_orders("buyer-1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].delivery_address(), details.address);
}

#[tokio::test]
async fn test_checkout_rejects_price_edited_after_add() {
    let engine = engine().await;
    let lamp = list_product(&engine, "seller-1", "Brass Hanging Lamp", 100, 0, 10).await;
    let bell = list_product(&engine, "seller-2", "Temple Bell", 250, 0, 10).await;

    let mut cart = Cart::new();
    cart.add(&bell, 1).unwrap();
    cart.add(&lamp, 2).unwrap();

    engine
        .catalog()
        .update_product(
            &lamp.id,
            &ProductUpdate {
                cost_price: Some(Money::from_rupees(1_000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = engine
        .orders()
        .checkout("buyer-1", &cart, &CheckoutDetails::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    // Nothing placed for either line
    assert!(engine.orders().list_buyer_orders("buyer-1").await.unwrap().is_empty());
    assert_eq!(engine.catalog().get_product(&lamp.id).await.unwrap().quantity, 10);
    assert_eq!(engine.catalog().get_product(&bell.id).await.unwrap().quantity, 10);

    // A cart rebuilt from the current listing goes through at the new price
    let current = engine.catalog().get_product(&lamp.id).await.unwrap();
    let mut cart = Cart::new();
    cart.add(&current, 2).unwrap();
    let receipt = engine
        .orders()
        .checkout("buyer-1", &cart, &CheckoutDetails::default())
        .await
        .unwrap();
    assert_eq!(receipt.orders[0].total_amount, Money::from_rupees(2_000));
    assert_eq!(receipt.totals.subtotal, Money::from_rupees(2_000));
    assert_eq!(receipt.totals.shipping, Money::zero());
    assert_eq!(receipt.totals.total, Money::from_rupees(2_000));
}

#[tokio::test]
async fn test_checkout_is_all_or_nothing() {
    let engine = engine().await;
    let plenty = list_product(&engine, "seller-1", "Agarbatti Pack", 40, 5, 100).await;
    let scarce = list_product(&engine, "seller-1", "Pattachitra Scroll", 2_500, 12, 1).await;

    let mut cart = Cart::new();
    cart.add(&plenty, 5).unwrap();
    cart.add(&scarce, 2).unwrap();

    let err = engine
        .orders()
        .checkout("buyer-1", &cart, &CheckoutDetails::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientStock);

    let stored = engine.catalog().get_product(&plenty.id).await.unwrap();
    assert_eq!(stored.quantity, 100);
    assert!(engine.orders().list_buyer_orders("buyer-1").await.unwrap().is_empty());

    let err = engine
        .orders()
        .checkout("buyer-1", &Cart::new(), &CheckoutDetails::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_seller_order_listing() {
    let engine = engine().await;
    let product = list_product(&engine, "seller-1", "Bidriware Box", 700, 12, 10).await;
    let delivered = deliver(&engine, "buyer-1", &product.id, 1).await;
    let open = engine
        .orders()
        .create_order("buyer-2", &request(&product.id, 1))
        .await
        .unwrap();

    let all = engine
        .orders()
        .list_seller_orders("seller-1", &OrderFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, open.id);

    let filtered = engine
        .orders()
        .list_seller_orders(
            "seller-1",
            &OrderFilter {
                status: Some(OrderStatus::Delivered),
                search: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, delivered.id);

    let by_number = engine
        .orders()
        .list_seller_orders(
            "seller-1",
            &OrderFilter {
                status: None,
                search: Some(open.order_number.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(by_number.len(), 1);
}

#[tokio::test]
async fn test_catalog_edits_rederive_price() {
    let engine = engine().await;
    let catalog = engine.catalog();
    let product = list_product(&engine, "seller-1", "Chikankari Kurti", 1_000, 5, 10).await;
    assert_eq!(product.sell_price, Money::from_rupees(1_050));

    let updated = catalog
        .update_product(
            &product.id,
            &ProductUpdate {
                tax_rate: Some(Rate::from_percent(12)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.sell_price, Money::from_rupees(1_120));

    let err = catalog
        .update_product(
            &product.id,
            &ProductUpdate {
                cost_price: Some(Money::from_rupees(-1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(catalog.get_product(&product.id).await.unwrap(), updated);

    catalog.deactivate_product(&product.id).await.unwrap();
    let active = catalog
        .list_seller_products(
            "seller-1",
            &ProductFilter {
                status: Some(ProductStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(active.is_empty());

    let err = catalog.deactivate_product("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
