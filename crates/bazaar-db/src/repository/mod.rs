//! # Repository Module
//!
//! Database repository implementations for the settlement engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Engine service                                                        │
//! │       │                                                                 │
//! │       │  db.orders().place(buyer_id, &request, now)                    │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── place / place_many      (one transaction each)                   │
//! │  ├── transition              (compare-and-swap on status)             │
//! │  └── get_by_id / list_*                                                │
//! │       │                                                                 │
//! │       │  SQL + event_outbox row in the same transaction                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Business rules come from bazaar-core; repositories own the atomic     │
//! │  units and turn core rejections into DbError::Rejected.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog listings
//! - [`OrderRepository`](order::OrderRepository) - Order placement and lifecycle
//! - [`PayoutRepository`](payout::PayoutRepository) - Payouts and revenue sums
//! - [`PaymentMethodRepository`](payment_method::PaymentMethodRepository) - Payout destinations
//! - [`TaxInfoRepository`](tax_info::TaxInfoRepository) - Seller tax identity
//! - [`ReportRepository`](report::ReportRepository) - Dashboard aggregates
//! - [`EventOutboxRepository`](outbox::EventOutboxRepository) - Durable domain events

pub mod order;
pub mod outbox;
pub mod payment_method;
pub mod payout;
pub mod product;
pub mod report;
pub mod sequence;
pub mod tax_info;
