//! # Orders
//!
//! The order record and its delivery state machine.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌────────────┐   ship    ┌────────────┐  deliver  ┌────────────┐     │
//! │   │ processing │──────────►│ in_transit │──────────►│ delivered  │     │
//! │   └─────┬──────┘           └─────┬──────┘           └────────────┘     │
//! │         │ cancel                 │ cancel             (terminal)       │
//! │         │                        │                                      │
//! │         │      ┌────────────┐    │                                      │
//! │         └─────►│ cancelled  │◄───┘                                      │
//! │                └────────────┘                                           │
//! │                  (terminal)                                             │
//! │                                                                         │
//! │  Side effects:                                                          │
//! │    → in_transit : tracking id assigned if absent, shipped_at = now      │
//! │    → delivered  : delivered_at = now                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Rate};
use crate::pricing::OrderPricing;

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Processing,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether `self → next` is an edge of the state machine.
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Processing, OrderStatus::InTransit)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
                | (OrderStatus::InTransit, OrderStatus::Delivered)
                | (OrderStatus::InTransit, OrderStatus::Cancelled)
        )
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Processing
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// Where the order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

/// A placed order: one product line bought by one buyer from one seller.
///
/// Pricing fields are snapshots taken at creation and are never recomputed
/// from the product's current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,

    /// Human-readable unique number, e.g. `ORD-20260309-000042`.
    pub order_number: String,

    pub seller_id: String,
    pub buyer_id: String,
    pub product_id: String,

    /// Product name when the order was placed.
    pub product_name: String,

    pub quantity: i64,

    /// Pre-tax unit price when the order was placed.
    pub unit_price: Money,

    /// Product tax rate when the order was placed.
    pub tax_rate: Rate,

    pub tax_amount: Money,

    /// `quantity × unit_price + tax_amount`. Fixed at creation.
    pub total_amount: Money,

    pub status: OrderStatus,

    /// Carrier tracking id, assigned on the move to in_transit.
    pub tracking_id: Option<String>,

    /// Informational label of how the buyer paid ("upi", "card", "cod").
    pub payment_method: Option<String>,

    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_pincode: Option<String>,

    #[ts(as = "Option<String>")]
    pub shipped_at: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The field changes of one legal status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub tracking_id: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Plans a move to `target` without mutating the order.
    ///
    /// `tracking_id` is only used on the move to in_transit and only when the
    /// order has none yet; if neither exists one is derived from the order
    /// number (`TRK-20260309-000042`).
    ///
    /// ## Errors
    /// `InvalidTransition` for any pair not in the state table, including
    /// same-state moves and anything out of a terminal state.
    pub fn plan_transition(
        &self,
        target: OrderStatus,
        tracking_id: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<OrderTransition> {
        if !self.status.can_transition_to(target) {
            return Err(CoreError::InvalidTransition {
                entity: "order",
                id: self.id.clone(),
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }

        let mut plan = OrderTransition {
            from: self.status,
            to: target,
            tracking_id: self.tracking_id.clone(),
            shipped_at: self.shipped_at,
            delivered_at: self.delivered_at,
        };

        match target {
            OrderStatus::InTransit => {
                if plan.tracking_id.is_none() {
                    plan.tracking_id = Some(
                        tracking_id
                            .filter(|t| !t.trim().is_empty())
                            .map(|t| t.trim().to_string())
                            .unwrap_or_else(|| self.default_tracking_id()),
                    );
                }
                plan.shipped_at = Some(now);
            }
            OrderStatus::Delivered => plan.delivered_at = Some(now),
            OrderStatus::Processing | OrderStatus::Cancelled => {}
        }

        Ok(plan)
    }

    /// Applies a planned transition to this in-memory copy.
    pub fn apply_transition(&mut self, plan: &OrderTransition, now: DateTime<Utc>) {
        self.status = plan.to;
        self.tracking_id = plan.tracking_id.clone();
        self.shipped_at = plan.shipped_at;
        self.delivered_at = plan.delivered_at;
        self.updated_at = now;
    }

    fn default_tracking_id(&self) -> String {
        match self.order_number.split_once('-') {
            Some((_, rest)) => format!("TRK-{}", rest),
            None => format!("TRK-{}", self.order_number),
        }
    }

    /// The amounts frozen on this order.
    pub fn pricing(&self) -> OrderPricing {
        OrderPricing {
            line_subtotal: self.total_amount - self.tax_amount,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
        }
    }

    pub fn delivery_address(&self) -> DeliveryAddress {
        DeliveryAddress {
            city: self.shipping_city.clone(),
            state: self.shipping_state.clone(),
            pincode: self.shipping_pincode.clone(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
