//! # bazaar-engine: Order & Settlement Engine
//!
//! The service layer the storefront and seller console call: orders,
//! payouts, payment methods, catalog and reports, each operation one atomic
//! unit against the store and bounded by the configured timeout.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Engine Request Flow                              │
//! │                                                                         │
//! │  presentation layer ──► IdentityResolver ──► Principal                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Engine (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │  orders()  payouts()  payment_methods()  catalog()  reporting() │   │
//! │  │      │         │              │              │           │      │   │
//! │  │      └─────────┴──── tokio::time::timeout ───┴───────────┘      │   │
//! │  │                              │                                  │   │
//! │  └──────────────────────────────┼──────────────────────────────────┘   │
//! │                                 ▼                                       │
//! │          bazaar-db primary (writes)      replica (reports, optional)   │
//! │                                 │                                       │
//! │                          commit │                                       │
//! │                                 ▼                                       │
//! │                    EventBus ──► subscribers                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `EngineConfig` (commission, shipping, store settings)
//! - [`error`] - `EngineError` and its `ErrorKind` mapping
//! - [`events`] - In-process event bus and the outbox relay
//! - [`identity`] - Principal resolution seam
//! - [`orders`] - Order placement, checkout and lifecycle
//! - [`payouts`] - Payable revenue, payout requests and analytics
//! - [`payment_methods`] - Seller bank accounts and tax info
//! - [`catalog`] - Seller product listings
//! - [`reporting`] - Dashboard and order statistics
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_engine::{Engine, EngineConfig};
//!
//! let engine = Engine::open(EngineConfig::load_or_default(None)).await?;
//!
//! let order = engine.orders().create_order(&buyer_id, &request).await?;
//! engine.orders().mark_shipped(&order.id, None).await?;
//! engine.orders().mark_delivered(&order.id).await?;
//!
//! let payout = engine.payouts().request_payout(&seller_id, amount).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod config;
mod context;
pub mod error;
pub mod events;
pub mod identity;
pub mod orders;
pub mod payment_methods;
pub mod payouts;
pub mod reporting;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::CatalogService;
pub use config::{CommerceSettings, EngineConfig, StoreSettings};
pub use error::{EngineError, EngineResult};
pub use events::{EventBus, EventSink, OutboxRelay, RelayReport, MAX_DELIVERY_ATTEMPTS};
pub use identity::{IdentityResolver, Principal, StaticIdentity};
pub use orders::{CheckoutDetails, CheckoutReceipt, NewOrderRequest, OrderService};
pub use payment_methods::PaymentMethodService;
pub use payouts::{PayoutAnalytics, PayoutService};
pub use reporting::ReportingService;

// Records callers pass in or get back
pub use bazaar_db::{DashboardStats, OrderFilter, OrderStats, ProductFilter, ProductSort};

use std::sync::Arc;

use bazaar_core::DomainEvent;
use bazaar_db::Database;
use tokio::sync::broadcast;
use tracing::info;

use context::ServiceContext;

// =============================================================================
// Engine
// =============================================================================

/// Entry point: owns the store handles, the configuration and the event bus.
///
/// Cheap to clone; clones share the pool and the bus.
#[derive(Debug, Clone)]
pub struct Engine {
    ctx: ServiceContext,
    replica: Option<Database>,
}

impl Engine {
    /// Wraps an already opened database.
    pub fn new(config: EngineConfig, db: Database) -> Self {
        Engine {
            ctx: ServiceContext {
                db,
                config: Arc::new(config),
                events: EventBus::new(),
            },
            replica: None,
        }
    }

    /// Validates `config`, opens the primary database (running migrations)
    /// and the reporting replica if one is configured.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let db = Database::new(config.db_config()).await?;
        let replica = match config.replica_db_config() {
            Some(replica_config) => Some(Database::new(replica_config).await?),
            None => None,
        };

        info!(
            database = ?config.store.database_path,
            replica = replica.is_some(),
            commission_rate = %config.commission_rate(),
            "Engine opened"
        );

        let mut engine = Engine::new(config, db);
        engine.replica = replica;
        Ok(engine)
    }

    /// Serves reports from `replica` instead of the primary.
    pub fn with_reporting_replica(mut self, replica: Database) -> Self {
        self.replica = Some(replica);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    pub fn database(&self) -> &Database {
        &self.ctx.db
    }

    pub fn events(&self) -> &EventBus {
        &self.ctx.events
    }

    /// Receives every domain event committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.ctx.events.subscribe()
    }

    // =========================================================================
    // Services
    // =========================================================================

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.ctx.clone())
    }

    pub fn payouts(&self) -> PayoutService {
        PayoutService::new(self.ctx.clone())
    }

    pub fn payment_methods(&self) -> PaymentMethodService {
        PaymentMethodService::new(self.ctx.clone())
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.ctx.clone())
    }

    pub fn reporting(&self) -> ReportingService {
        match &self.replica {
            Some(replica) => ReportingService::new(
                ServiceContext {
                    db: replica.clone(),
                    ..self.ctx.clone()
                },
                true,
            ),
            None => ReportingService::new(self.ctx.clone(), false),
        }
    }

    /// A relay draining the durable outbox into `sink`.
    pub fn outbox_relay(&self, sink: Arc<dyn EventSink>) -> OutboxRelay {
        OutboxRelay::new(self.ctx.db.clone(), sink)
    }

    /// Closes the primary and replica pools.
    pub async fn close(&self) {
        self.ctx.db.close().await;
        if let Some(replica) = &self.replica {
            replica.close().await;
        }
    }
}
