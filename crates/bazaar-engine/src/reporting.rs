//! # Seller Reporting
//!
//! Dashboard figures for the seller console.
//!
//! Each report is a single SQL statement, so its numbers agree with each
//! other. When the engine is opened with a reporting replica
//! ([`Engine::with_reporting_replica`](crate::Engine::with_reporting_replica)),
//! reports are served from it and are eventually consistent: a freshly
//! delivered order may take the replication delay to show up.

use bazaar_db::{DashboardStats, OrderStats};
use tracing::debug;

use crate::context::ServiceContext;
use crate::error::EngineResult;

#[derive(Debug, Clone)]
pub struct ReportingService {
    ctx: ServiceContext,
    replica: bool,
}

impl ReportingService {
    pub(crate) fn new(ctx: ServiceContext, replica: bool) -> Self {
        ReportingService { ctx, replica }
    }

    /// Whether reports come from a read-only replica.
    pub fn is_replica(&self) -> bool {
        self.replica
    }

    /// Product and order counts, delivered revenue, pending orders and
    /// average rating. A seller with no data gets zeros.
    pub async fn dashboard(&self, seller_id: &str) -> EngineResult<DashboardStats> {
        debug!(seller_id = %seller_id, replica = self.replica, "Dashboard requested");
        let reports = self.ctx.db.reports();
        self.ctx
            .bounded("dashboard", reports.dashboard(seller_id))
            .await
    }

    /// Order counts per status plus delivered revenue.
    pub async fn order_stats(&self, seller_id: &str) -> EngineResult<OrderStats> {
        let reports = self.ctx.db.reports();
        self.ctx
            .bounded("order_stats", reports.order_stats(seller_id))
            .await
    }
}
