//! # Payouts
//!
//! Commission math and the settlement state machine.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delivered orders ──► payable = Σ delivered − Σ completed payouts      │
//! │                                                                         │
//! │  request(amount) ──► commission = round_half_up(amount × rate)          │
//! │                      net        = amount − commission                   │
//! │                                                                         │
//! │   ┌─────────┐        ┌────────────┐        ┌───────────┐               │
//! │   │ pending │───────►│ processing │───────►│ completed │ (terminal)    │
//! │   └────┬────┘        └─────┬──────┘        └───────────┘               │
//! │        │                   │                 payout_date = now          │
//! │        │    ┌────────┐     │                 revenue settled            │
//! │        └───►│ failed │◄────┘                                            │
//! │             └────────┘ (terminal)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The commission rate is copied onto the payout when it is requested.
//! Changing the platform rate later never touches existing payouts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Rate};
use crate::validation::validate_rate;

// =============================================================================
// Payout Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub const ALL: [PayoutStatus; 4] = [
        PayoutStatus::Pending,
        PayoutStatus::Processing,
        PayoutStatus::Completed,
        PayoutStatus::Failed,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Completed | PayoutStatus::Failed)
    }

    /// Outstanding payouts reserve part of the payable balance.
    pub const fn is_outstanding(&self) -> bool {
        matches!(self, PayoutStatus::Pending | PayoutStatus::Processing)
    }

    pub const fn can_transition_to(&self, next: PayoutStatus) -> bool {
        matches!(
            (self, next),
            (PayoutStatus::Pending, PayoutStatus::Processing)
                | (PayoutStatus::Processing, PayoutStatus::Completed)
                | (PayoutStatus::Pending, PayoutStatus::Failed)
                | (PayoutStatus::Processing, PayoutStatus::Failed)
        )
    }
}

impl Default for PayoutStatus {
    fn default() -> Self {
        PayoutStatus::Pending
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Commission
// =============================================================================

/// Amount, commission and net of a payout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PayoutAmounts {
    pub amount: Money,
    pub commission_rate: Rate,
    pub commission_amount: Money,
    pub net_amount: Money,
}

impl PayoutAmounts {
    /// Splits a requested amount into platform commission and seller net.
    ///
    /// ## Errors
    /// - `InvalidAmount` if `amount` is zero or negative
    /// - `InvalidInput` if the rate exceeds 100 %
    ///
    /// ```rust
    /// use bazaar_core::money::{Money, Rate};
    /// use bazaar_core::payout::PayoutAmounts;
    ///
    /// let split = PayoutAmounts::compute(Money::from_rupees(4000), Rate::from_percent(10)).unwrap();
    /// assert_eq!(split.commission_amount, Money::from_rupees(400));
    /// assert_eq!(split.net_amount, Money::from_rupees(3600));
    /// ```
    pub fn compute(amount: Money, commission_rate: Rate) -> CoreResult<PayoutAmounts> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidAmount {
                reason: format!("payout amount must be greater than zero, got {}", amount),
            });
        }
        validate_rate("commission_rate", commission_rate)?;

        let commission_amount = amount.percentage_of(commission_rate);
        Ok(PayoutAmounts {
            amount,
            commission_rate,
            commission_amount,
            net_amount: amount - commission_amount,
        })
    }
}

/// Checks a request against what the seller can still withdraw.
///
/// `available` is the payable balance minus everything reserved by
/// outstanding payouts.
pub fn ensure_payable(requested: Money, available: Money) -> CoreResult<()> {
    if requested > available {
        return Err(CoreError::InsufficientPayableBalance {
            requested,
            available: if available.is_negative() {
                Money::zero()
            } else {
                available
            },
        });
    }
    Ok(())
}

// =============================================================================
// Payout
// =============================================================================

/// A seller payout request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub id: String,

    /// Human-readable unique number, e.g. `PAY-20260309-000007`.
    pub payout_number: String,

    pub seller_id: String,

    /// Gross amount withdrawn from payable revenue.
    pub amount: Money,

    /// Platform rate captured at request time.
    pub commission_rate: Rate,

    pub commission_amount: Money,

    /// What reaches the seller's account.
    pub net_amount: Money,

    pub status: PayoutStatus,

    /// Set when the payout completes.
    #[ts(as = "Option<String>")]
    pub payout_date: Option<DateTime<Utc>>,

    /// Destination snapshot taken from the seller's default payment method.
    pub payment_method_id: Option<String>,
    pub bank_name: Option<String>,
    /// Masked, e.g. `****4321`.
    pub account_number: Option<String>,
    pub routing_code: Option<String>,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Payout {
    /// Plans a move to `target`; returns the new payout date.
    ///
    /// ## Errors
    /// `InvalidTransition` for anything outside the state table, which
    /// includes every move out of completed or failed.
    pub fn plan_transition(
        &self,
        target: PayoutStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<DateTime<Utc>>> {
        if !self.status.can_transition_to(target) {
            return Err(CoreError::InvalidTransition {
                entity: "payout",
                id: self.id.clone(),
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(match target {
            PayoutStatus::Completed => Some(now),
            _ => self.payout_date,
        })
    }

    pub fn amounts(&self) -> PayoutAmounts {
        PayoutAmounts {
            amount: self.amount,
            commission_rate: self.commission_rate,
            commission_amount: self.commission_amount,
            net_amount: self.net_amount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
