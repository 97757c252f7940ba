//! # bazaar-db: Database Layer for the Bazaar Settlement Engine
//!
//! SQLite persistence with sqlx: connection pool, embedded migrations,
//! repositories and the atomic units the engine is built from.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Data Flow                                 │
//! │                                                                         │
//! │  bazaar-engine service (create_order, request_payout, ...)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    bazaar-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ OrderRepo     │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ PayoutRepo    │    │ 002_outbox   │  │   │
//! │  │   │ WAL, busy     │    │ ReportRepo    │    │              │  │   │
//! │  │   │ timeout       │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (primary) or a read-only replica for reports              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_db::{Database, DbConfig, NewOrder};
//!
//! let db = Database::new(DbConfig::new("bazaar.db")).await?;
//! let order = db.orders().place("buyer-1", &request, Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::{NewOrder, OrderFilter, OrderRepository};
pub use repository::outbox::{EventOutboxRepository, OutboxEntry};
pub use repository::payment_method::PaymentMethodRepository;
pub use repository::payout::{payout_event, PayoutRepository};
pub use repository::product::{generate_product_id, ProductFilter, ProductRepository, ProductSort};
pub use repository::report::{DashboardStats, OrderStats, PayoutSummary, ReportRepository};
pub use repository::tax_info::TaxInfoRepository;
