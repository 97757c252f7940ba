//! # Commission & Payout Engine
//!
//! Turns delivered-order revenue into seller payouts net of the platform
//! commission.
//!
//! ## Payout Lifecycle
//! ```text
//!   request ──► pending ──► processing ──► completed   (payout_date = now,
//!                  │             │                      revenue settled)
//!                  └─────────────┴───────► failed      (reservation released)
//! ```
//!
//! A pending or processing payout reserves its amount: two requests can
//! never together exceed the payable balance. The commission rate comes
//! from [`EngineConfig`](crate::config::EngineConfig) at request time and
//! stays with the payout afterwards.

use bazaar_core::{CoreError, DomainEvent, Money, Payout, PayoutStatus, Rate};
use bazaar_db::payout_event;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::context::ServiceContext;
use crate::error::{EngineError, EngineResult};

/// Seller-facing payout figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PayoutAnalytics {
    /// Σ total_amount of delivered orders.
    pub lifetime_revenue: Money,
    pub lifetime_revenue_formatted: String,
    /// Lifetime revenue not yet settled by a completed payout.
    pub payable_balance: Money,
    pub payable_balance_formatted: String,
    /// Σ amount of payouts still pending.
    pub pending_payouts: Money,
    pub pending_payouts_formatted: String,
    /// Σ net_amount the seller has actually received.
    pub completed_payouts_net: Money,
    pub completed_payouts_net_formatted: String,
    /// Rate applied to new requests.
    pub commission_rate: Rate,
    /// Lifetime revenue × the current rate.
    pub commission_on_revenue: Money,
    pub commission_on_revenue_formatted: String,
    pub average_order_value: Money,
    pub average_order_value_formatted: String,
}

#[derive(Debug, Clone)]
pub struct PayoutService {
    ctx: ServiceContext,
}

impl PayoutService {
    pub(crate) fn new(ctx: ServiceContext) -> Self {
        PayoutService { ctx }
    }

    /// Delivered revenue minus completed payouts.
    pub async fn aggregate_payable_revenue(&self, seller_id: &str) -> EngineResult<Money> {
        let payouts = self.ctx.db.payouts();
        self.ctx
            .bounded("aggregate_payable_revenue", payouts.payable_revenue(seller_id))
            .await
    }

    /// Delivered revenue regardless of payouts.
    pub async fn lifetime_revenue(&self, seller_id: &str) -> EngineResult<Money> {
        let payouts = self.ctx.db.payouts();
        self.ctx
            .bounded("lifetime_revenue", payouts.lifetime_revenue(seller_id))
            .await
    }

    /// Requests a payout at the configured commission rate.
    pub async fn request_payout(&self, seller_id: &str, amount: Money) -> EngineResult<Payout> {
        self.request(seller_id, amount, self.ctx.config.commission_rate(), None)
            .await
    }

    /// Requests a payout at the configured rate with a note for the finance team.
    pub async fn request_payout_with_notes(
        &self,
        seller_id: &str,
        amount: Money,
        notes: impl Into<String>,
    ) -> EngineResult<Payout> {
        self.request(seller_id, amount, self.ctx.config.commission_rate(), Some(notes.into()))
            .await
    }

    /// Requests a payout at an explicit commission rate.
    pub async fn request_payout_with_rate(
        &self,
        seller_id: &str,
        amount: Money,
        commission_rate: Rate,
    ) -> EngineResult<Payout> {
        self.request(seller_id, amount, commission_rate, None).await
    }

    async fn request(
        &self,
        seller_id: &str,
        amount: Money,
        commission_rate: Rate,
        notes: Option<String>,
    ) -> EngineResult<Payout> {
        let payouts = self.ctx.db.payouts();
        let requested = self
            .ctx
            .bounded(
                "request_payout",
                payouts.request(seller_id, amount, commission_rate, notes, Utc::now()),
            )
            .await;

        match requested {
            Ok(payout) => {
                info!(
                    payout_number = %payout.payout_number,
                    seller_id = %seller_id,
                    amount = %payout.amount,
                    commission = %payout.commission_amount,
                    net = %payout.net_amount,
                    "Payout requested"
                );
                self.ctx.events.publish(DomainEvent::payout_requested(&payout));
                Ok(payout)
            }
            Err(e) => {
                warn!(seller_id = %seller_id, amount = %amount, error = %e, "Payout request rejected");
                Err(e)
            }
        }
    }

    /// Advances a payout; completed and failed payouts are final.
    pub async fn advance_payout(&self, payout_id: &str, target: PayoutStatus) -> EngineResult<Payout> {
        let payouts = self.ctx.db.payouts();
        let advanced = self
            .ctx
            .bounded("advance_payout", payouts.advance(payout_id, target, Utc::now()))
            .await;

        match advanced {
            Ok(payout) => {
                info!(
                    payout_number = %payout.payout_number,
                    status = %payout.status,
                    "Payout status changed"
                );
                if let Some(event) = payout_event(&payout) {
                    self.ctx.events.publish(event);
                }
                Ok(payout)
            }
            Err(e) => {
                warn!(payout_id = %payout_id, target = %target, error = %e, "Payout transition rejected");
                Err(e)
            }
        }
    }

    /// Seller's payouts, newest first.
    pub async fn list_payouts(&self, seller_id: &str) -> EngineResult<Vec<Payout>> {
        let payouts = self.ctx.db.payouts();
        self.ctx
            .bounded("list_payouts", payouts.list_by_seller(seller_id))
            .await
    }

    pub async fn get_payout(&self, payout_id: &str) -> EngineResult<Payout> {
        let payouts = self.ctx.db.payouts();
        self.ctx
            .bounded("get_payout", payouts.get_by_id(payout_id))
            .await?
            .ok_or_else(|| EngineError::from(CoreError::not_found("Payout", payout_id)))
    }

    pub async fn payout_analytics(&self, seller_id: &str) -> EngineResult<PayoutAnalytics> {
        let reports = self.ctx.db.reports();
        let summary = self
            .ctx
            .bounded("payout_analytics", reports.payout_summary(seller_id))
            .await?;

        let commission_rate = self.ctx.config.commission_rate();
        let payable_balance = summary.lifetime_revenue - summary.settled;
        let commission_on_revenue = summary.lifetime_revenue.percentage_of(commission_rate);

        Ok(PayoutAnalytics {
            lifetime_revenue: summary.lifetime_revenue,
            lifetime_revenue_formatted: summary.lifetime_revenue.format_inr(),
            payable_balance,
            payable_balance_formatted: payable_balance.format_inr(),
            pending_payouts: summary.pending,
            pending_payouts_formatted: summary.pending.format_inr(),
            completed_payouts_net: summary.completed_net,
            completed_payouts_net_formatted: summary.completed_net.format_inr(),
            commission_rate,
            commission_on_revenue,
            commission_on_revenue_formatted: commission_on_revenue.format_inr(),
            average_order_value: summary.average_order_value,
            average_order_value_formatted: summary.average_order_value.format_inr(),
        })
    }
}
