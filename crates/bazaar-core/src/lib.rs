//! # bazaar-core: Pure Business Logic for the Bazaar Settlement Engine
//!
//! This crate holds every rule of the order and settlement engine as pure
//! functions and types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bazaar Settlement Engine                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Seller console / storefront (external)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bazaar-engine (services)                       │   │
//! │  │   orders, payouts, payment methods, reports, catalog            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │ pricing │ │  order  │ │ payout  │ │  cart   │  │   │
//! │  │   │  Money  │ │ totals  │ │ status  │ │ status  │ │  lines  │  │   │
//! │  │   │  Rate   │ │ sell    │ │ machine │ │ commiss.│ │  merge  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bazaar-db (Database Layer)                     │   │
//! │  │        SQLite queries, migrations, repositories, outbox         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` (integer paise) and `Rate` (basis points)
//! - [`pricing`] - Sell price derivation, cart totals, order line pricing
//! - [`cart`] - Ephemeral buyer cart with merge-on-add semantics
//! - [`types`] - Product records and enumerated updates
//! - [`order`] - Order record and its delivery state machine
//! - [`payout`] - Payout record, commission math, settlement state machine
//! - [`settlement`] - Payment methods and seller tax info
//! - [`events`] - Domain events emitted after each committed change
//! - [`error`] - Domain error types and error kinds
//! - [`validation`] - Field-level input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::money::{Money, Rate};
//! use bazaar_core::pricing::derive_sell_price;
//!
//! let cost = Money::from_rupees(100);
//! let sell = derive_sell_price(cost, Rate::from_percent(18)).unwrap();
//! assert_eq!(sell.to_string(), "118.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod events;
pub mod money;
pub mod order;
pub mod payout;
pub mod pricing;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLineItem};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use events::DomainEvent;
pub use money::{Money, Rate};
pub use order::{DeliveryAddress, Order, OrderStatus};
pub use payout::{Payout, PayoutAmounts, PayoutStatus};
pub use pricing::{CartTotals, OrderPricing};
pub use settlement::{AccountType, PaymentMethod, PaymentMethodDetails, TaxInfo, TaxInfoUpdate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product per order line.
///
/// Guards against typing 1000 instead of 10 at checkout.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Prefix of generated order numbers (`ORD-20260101-000001`).
pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Prefix of generated payout numbers (`PAY-20260101-000001`).
pub const PAYOUT_NUMBER_PREFIX: &str = "PAY";

/// Formats a human-readable document number from a prefix, the business
/// date and a store-issued sequence value.
///
/// ```rust
/// use chrono::NaiveDate;
/// use bazaar_core::format_document_number;
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
/// assert_eq!(format_document_number("ORD", date, 42), "ORD-20260309-000042");
/// ```
pub fn format_document_number(prefix: &str, date: chrono::NaiveDate, sequence: i64) -> String {
    format!("{}-{}-{:06}", prefix, date.format("%Y%m%d"), sequence)
}
