//! # Order Lifecycle
//!
//! Placing orders and moving them through delivery.
//!
//! ## State Machine
//! ```text
//!                 ┌────────────┐  mark_shipped   ┌────────────┐  mark_delivered  ┌───────────┐
//!   create ──────►│ processing │────────────────►│ in_transit │─────────────────►│ delivered │
//!                 └─────┬──────┘                 └─────┬──────┘                  └───────────┘
//!                       │ cancel                       │ cancel
//!                       ▼                              ▼
//!                 ┌───────────┐◄───────────────────────┘
//!                 │ cancelled │   (stock is not restored)
//!                 └───────────┘
//! ```
//!
//! Every other move, same-state moves included, is `InvalidTransition` and
//! leaves the order untouched.

use bazaar_core::pricing::compute_checkout_totals;
use bazaar_core::{
    Cart, CartTotals, CoreError, DeliveryAddress, DomainEvent, Order, OrderPricing, OrderStatus,
    ValidationError,
};
use bazaar_db::{NewOrder, OrderFilter};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::context::ServiceContext;
use crate::error::{EngineError, EngineResult};

/// A buyer's request for one product line.
pub type NewOrderRequest = NewOrder;

// =============================================================================
// Checkout Types
// =============================================================================

/// Shipping and payment details shared by every line of a checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    #[serde(default)]
    pub address: DeliveryAddress,
    pub payment_method: Option<String>,
}

/// What the buyer gets back from a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    /// One order per cart line, in cart order.
    pub orders: Vec<Order>,
    /// Sum of what the orders recorded, plus shipping at the configured
    /// threshold and fee.
    pub totals: CartTotals,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct OrderService {
    ctx: ServiceContext,
}

impl OrderService {
    pub(crate) fn new(ctx: ServiceContext) -> Self {
        OrderService { ctx }
    }

    /// Places one order, decrementing stock in the same transaction.
    ///
    /// ## Errors
    /// * `NotFound` - no such product
    /// * `InvalidInput` - inactive product, quantity outside 1..=999, bad pincode
    /// * `InsufficientStock` - quantity exceeds stock on hand
    pub async fn create_order(&self, buyer_id: &str, request: &NewOrderRequest) -> EngineResult<Order> {
        let orders = self.ctx.db.orders();
        let placed = self
            .ctx
            .bounded("create_order", orders.place(buyer_id, request, Utc::now()))
            .await;

        match placed {
            Ok(order) => {
                info!(
                    order_number = %order.order_number,
                    buyer_id = %buyer_id,
                    product_id = %order.product_id,
                    total = %order.total_amount,
                    "Order created"
                );
                self.ctx.events.publish(DomainEvent::order_created(&order));
                Ok(order)
            }
            Err(e) => {
                warn!(
                    buyer_id = %buyer_id,
                    product_id = %request.product_id,
                    quantity = request.quantity,
                    error = %e,
                    "Order rejected"
                );
                Err(e)
            }
        }
    }

    /// Places every cart line in one transaction: all orders or none.
    ///
    /// Each line is placed at the unit price the cart captured. A line whose
    /// listing price has moved since is rejected with `InvalidInput`, and the
    /// whole checkout with it. Receipt totals are built from the placed
    /// orders, so the receipt is exactly what was charged.
    pub async fn checkout(
        &self,
        buyer_id: &str,
        cart: &Cart,
        details: &CheckoutDetails,
    ) -> EngineResult<CheckoutReceipt> {
        if cart.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "cart".to_string(),
            })
            .into());
        }

        let requests: Vec<NewOrderRequest> = cart
            .items()
            .iter()
            .map(|line| NewOrder {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                address: details.address.clone(),
                payment_method: details.payment_method.clone(),
                quoted_unit_price: Some(line.unit_price),
            })
            .collect();

        let repo = self.ctx.db.orders();
        let placed = self
            .ctx
            .bounded("checkout", repo.place_many(buyer_id, &requests, Utc::now()))
            .await;

        let orders = match placed {
            Ok(orders) => orders,
            Err(e) => {
                warn!(buyer_id = %buyer_id, lines = requests.len(), error = %e, "Checkout rejected");
                return Err(e);
            }
        };

        self.ctx
            .events
            .publish_all(orders.iter().map(DomainEvent::order_created));

        let commerce = &self.ctx.config.commerce;
        let lines: Vec<OrderPricing> = orders.iter().map(Order::pricing).collect();
        let totals = compute_checkout_totals(
            &lines,
            commerce.free_shipping_threshold,
            commerce.flat_shipping_fee,
        )?;

        info!(
            buyer_id = %buyer_id,
            orders = orders.len(),
            total = %totals.total,
            "Checkout complete"
        );
        Ok(CheckoutReceipt { orders, totals })
    }

    /// Moves an order to `target`.
    ///
    /// `tracking_id` is used on the move to in_transit; when absent one is
    /// derived from the order number.
    pub async fn transition(
        &self,
        order_id: &str,
        target: OrderStatus,
        tracking_id: Option<String>,
    ) -> EngineResult<Order> {
        let orders = self.ctx.db.orders();
        let moved = self
            .ctx
            .bounded(
                "transition_order",
                orders.transition_recorded(order_id, target, tracking_id, Utc::now()),
            )
            .await;

        match moved {
            Ok((order, event)) => {
                info!(
                    order_number = %order.order_number,
                    status = %order.status,
                    "Order status changed"
                );
                self.ctx.events.publish(event);
                Ok(order)
            }
            Err(e) => {
                warn!(order_id = %order_id, target = %target, error = %e, "Order transition rejected");
                Err(e)
            }
        }
    }

    pub async fn mark_shipped(&self, order_id: &str, tracking_id: Option<String>) -> EngineResult<Order> {
        self.transition(order_id, OrderStatus::InTransit, tracking_id).await
    }

    pub async fn mark_delivered(&self, order_id: &str) -> EngineResult<Order> {
        self.transition(order_id, OrderStatus::Delivered, None).await
    }

    /// Cancels a processing or in-transit order. Stock is not restored.
    pub async fn cancel(&self, order_id: &str) -> EngineResult<Order> {
        self.transition(order_id, OrderStatus::Cancelled, None).await
    }

    pub async fn get_order(&self, order_id: &str) -> EngineResult<Order> {
        let orders = self.ctx.db.orders();
        self.ctx
            .bounded("get_order", orders.get_by_id(order_id))
            .await?
            .ok_or_else(|| EngineError::from(CoreError::not_found("Order", order_id)))
    }

    /// Seller's orders, newest first.
    pub async fn list_seller_orders(&self, seller_id: &str, filter: &OrderFilter) -> EngineResult<Vec<Order>> {
        let orders = self.ctx.db.orders();
        self.ctx
            .bounded("list_seller_orders", orders.list_by_seller(seller_id, filter))
            .await
    }

    pub async fn list_buyer_orders(&self, buyer_id: &str) -> EngineResult<Vec<Order>> {
        let orders = self.ctx.db.orders();
        self.ctx
            .bounded("list_buyer_orders", orders.list_by_buyer(buyer_id))
            .await
    }
}
