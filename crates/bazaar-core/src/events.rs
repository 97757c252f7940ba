//! # Domain Events
//!
//! Facts the engine publishes after a change commits. External notifiers
//! subscribe to them; the engine never waits on delivery.
//!
//! ```text
//! create_order ───────► OrderCreated
//! transition ─────────► OrderStatusChanged { from, to }
//! request_payout ─────► PayoutRequested
//! advance(completed) ─► PayoutCompleted
//! advance(failed) ────► PayoutFailed
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::order::{Order, OrderStatus};
use crate::payout::Payout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderCreated {
        order_id: String,
        order_number: String,
        seller_id: String,
        buyer_id: String,
        product_id: String,
        quantity: i64,
        total_amount: Money,
    },
    OrderStatusChanged {
        order_id: String,
        order_number: String,
        seller_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
    PayoutRequested {
        payout_id: String,
        payout_number: String,
        seller_id: String,
        amount: Money,
        net_amount: Money,
    },
    PayoutCompleted {
        payout_id: String,
        payout_number: String,
        seller_id: String,
        amount: Money,
        net_amount: Money,
    },
    PayoutFailed {
        payout_id: String,
        payout_number: String,
        seller_id: String,
        amount: Money,
    },
}

impl DomainEvent {
    pub fn order_created(order: &Order) -> Self {
        DomainEvent::OrderCreated {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            seller_id: order.seller_id.clone(),
            buyer_id: order.buyer_id.clone(),
            product_id: order.product_id.clone(),
            quantity: order.quantity,
            total_amount: order.total_amount,
        }
    }

    pub fn order_status_changed(order: &Order, from: OrderStatus) -> Self {
        DomainEvent::OrderStatusChanged {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            seller_id: order.seller_id.clone(),
            from,
            to: order.status,
        }
    }

    pub fn payout_requested(payout: &Payout) -> Self {
        DomainEvent::PayoutRequested {
            payout_id: payout.id.clone(),
            payout_number: payout.payout_number.clone(),
            seller_id: payout.seller_id.clone(),
            amount: payout.amount,
            net_amount: payout.net_amount,
        }
    }

    pub fn payout_completed(payout: &Payout) -> Self {
        DomainEvent::PayoutCompleted {
            payout_id: payout.id.clone(),
            payout_number: payout.payout_number.clone(),
            seller_id: payout.seller_id.clone(),
            amount: payout.amount,
            net_amount: payout.net_amount,
        }
    }

    pub fn payout_failed(payout: &Payout) -> Self {
        DomainEvent::PayoutFailed {
            payout_id: payout.id.clone(),
            payout_number: payout.payout_number.clone(),
            seller_id: payout.seller_id.clone(),
            amount: payout.amount,
        }
    }

    /// Dotted event name used as the outbox `event_type` column.
    pub const fn name(&self) -> &'static str {
        match self {
            DomainEvent::OrderCreated { .. } => "order.created",
            DomainEvent::OrderStatusChanged { .. } => "order.status_changed",
            DomainEvent::PayoutRequested { .. } => "payout.requested",
            DomainEvent::PayoutCompleted { .. } => "payout.completed",
            DomainEvent::PayoutFailed { .. } => "payout.failed",
        }
    }

    /// Id of the order or payout the event is about.
    pub fn aggregate_id(&self) -> &str {
        match self {
            DomainEvent::OrderCreated { order_id, .. }
            | DomainEvent::OrderStatusChanged { order_id, .. } => order_id,
            DomainEvent::PayoutRequested { payout_id, .. }
            | DomainEvent::PayoutCompleted { payout_id, .. }
            | DomainEvent::PayoutFailed { payout_id, .. } => payout_id,
        }
    }

    pub fn seller_id(&self) -> &str {
        match self {
            DomainEvent::OrderCreated { seller_id, .. }
            | DomainEvent::OrderStatusChanged { seller_id, .. }
            | DomainEvent::PayoutRequested { seller_id, .. }
            | DomainEvent::PayoutCompleted { seller_id, .. }
            | DomainEvent::PayoutFailed { seller_id, .. } => seller_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let event = DomainEvent::OrderStatusChanged {
            order_id: "o-1".into(),
            order_number: "ORD-20260309-000001".into(),
            seller_id: "s-1".into(),
            from: OrderStatus::Processing,
            to: OrderStatus::InTransit,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "order_status_changed");
        assert_eq!(json["from"], "processing");
        assert_eq!(json["to"], "in_transit");
        assert_eq!(event.name(), "order.status_changed");
        assert_eq!(event.aggregate_id(), "o-1");
        assert_eq!(event.seller_id(), "s-1");
    }
}
