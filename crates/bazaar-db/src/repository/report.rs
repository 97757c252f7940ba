//! # Report Repository
//!
//! Seller aggregates for the console. Every report is one SELECT of scalar
//! subqueries, so all of its numbers come from the same snapshot.
//!
//! ## Replicas
//! Nothing here writes. A `Database` opened with `DbConfig::read_only` over
//! a replica copy serves these reports; figures then lag the primary by the
//! replication delay.

use bazaar_core::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use ts_rs::TS;

use crate::error::DbResult;

// =============================================================================
// Records
// =============================================================================

/// Headline numbers for the seller dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub product_count: i64,
    pub order_count: i64,
    /// Σ total_amount of delivered orders.
    pub delivered_revenue: Money,
    /// `₹1,23,456.00`
    pub delivered_revenue_formatted: String,
    /// Orders still in processing.
    pub pending_order_count: i64,
    /// Mean product rating, one decimal; 0.0 with no products.
    pub average_rating: f64,
}

/// Order counts per status for one seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, FromRow)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: i64,
    pub processing: i64,
    pub in_transit: i64,
    pub delivered: i64,
    pub cancelled: i64,
    pub delivered_revenue: Money,
}

/// Raw payout sums behind the payout analytics view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PayoutSummary {
    pub lifetime_revenue: Money,
    /// Σ amount of completed payouts.
    pub settled: Money,
    /// Σ amount of pending payouts.
    pub pending: Money,
    /// Σ net_amount of completed payouts.
    pub completed_net: Money,
    /// Mean total_amount over all of the seller's orders.
    pub average_order_value: Money,
}

#[derive(FromRow)]
struct DashboardRow {
    product_count: i64,
    order_count: i64,
    delivered_revenue: i64,
    pending_order_count: i64,
    average_rating: f64,
}

#[derive(FromRow)]
struct PayoutSummaryRow {
    lifetime_revenue: i64,
    settled: i64,
    pending: i64,
    completed_net: i64,
    average_order_value: f64,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    pub async fn dashboard(&self, seller_id: &str) -> DbResult<DashboardStats> {
        debug!(seller_id = %seller_id, "Computing dashboard stats");

        let row = sqlx::query_as::<_, DashboardRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE seller_id = ?1) AS product_count,
                (SELECT COUNT(*) FROM orders WHERE seller_id = ?1) AS order_count,
                (SELECT COALESCE(SUM(total_amount), 0) FROM orders
                 WHERE seller_id = ?1 AND status = 'delivered') AS delivered_revenue,
                (SELECT COUNT(*) FROM orders
                 WHERE seller_id = ?1 AND status = 'processing') AS pending_order_count,
                (SELECT COALESCE(AVG(rating), 0.0) FROM products
                 WHERE seller_id = ?1) AS average_rating
            "#,
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        let delivered_revenue = Money::from_paise(row.delivered_revenue);
        Ok(DashboardStats {
            product_count: row.product_count,
            order_count: row.order_count,
            delivered_revenue,
            delivered_revenue_formatted: delivered_revenue.format_inr(),
            pending_order_count: row.pending_order_count,
            average_rating: (row.average_rating * 10.0).round() / 10.0,
        })
    }

    pub async fn order_stats(&self, seller_id: &str) -> DbResult<OrderStats> {
        let stats = sqlx::query_as::<_, OrderStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(status = 'processing'), 0) AS processing,
                COALESCE(SUM(status = 'in_transit'), 0) AS in_transit,
                COALESCE(SUM(status = 'delivered'), 0) AS delivered,
                COALESCE(SUM(status = 'cancelled'), 0) AS cancelled,
                COALESCE(SUM(CASE WHEN status = 'delivered' THEN total_amount END), 0)
                    AS delivered_revenue
            FROM orders
            WHERE seller_id = ?1
            "#,
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    pub async fn payout_summary(&self, seller_id: &str) -> DbResult<PayoutSummary> {
        let row = sqlx::query_as::<_, PayoutSummaryRow>(
            r#"
            SELECT
                (SELECT COALESCE(SUM(total_amount), 0) FROM orders
                 WHERE seller_id = ?1 AND status = 'delivered') AS lifetime_revenue,
                (SELECT COALESCE(SUM(amount), 0) FROM payouts
                 WHERE seller_id = ?1 AND status = 'completed') AS settled,
                (SELECT COALESCE(SUM(amount), 0) FROM payouts
                 WHERE seller_id = ?1 AND status = 'pending') AS pending,
                (SELECT COALESCE(SUM(net_amount), 0) FROM payouts
                 WHERE seller_id = ?1 AND status = 'completed') AS completed_net,
                (SELECT COALESCE(AVG(total_amount), 0.0) FROM orders
                 WHERE seller_id = ?1) AS average_order_value
            "#,
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(PayoutSummary {
            lifetime_revenue: Money::from_paise(row.lifetime_revenue),
            settled: Money::from_paise(row.settled),
            pending: Money::from_paise(row.pending),
            completed_net: Money::from_paise(row.completed_net),
            average_order_value: Money::from_paise(row.average_order_value.round() as i64),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
