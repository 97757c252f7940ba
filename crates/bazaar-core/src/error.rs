//! # Error Types
//!
//! Domain-specific error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  ├── ValidationError  - Field-level input failures                     │
//! │  └── ErrorKind        - Stable category shared by every layer          │
//! │                                                                         │
//! │  bazaar-db errors                                                      │
//! │  └── DbError          - Store failures + rejected atomic units         │
//! │                                                                         │
//! │  bazaar-engine errors                                                  │
//! │  └── EngineError      - What callers see (kind + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → EngineError → caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rejection carries an [`ErrorKind`] so the presentation layer can
//! translate it without parsing messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable error category surfaced to callers.
///
/// Only [`ErrorKind::StoreUnavailable`] is transient. Everything else is a
/// deterministic business-rule rejection: retrying returns the same answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or out-of-range numeric value, or a blank required field.
    InvalidInput,
    /// State machine violation.
    InvalidTransition,
    /// Payout request larger than the seller's payable balance.
    InsufficientPayableBalance,
    /// Order quantity larger than stock on hand.
    InsufficientStock,
    /// Entity does not exist.
    NotFound,
    /// Backing store failed or timed out.
    StoreUnavailable,
}

impl ErrorKind {
    /// Whether a caller may retry the same request with backoff.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::StoreUnavailable)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are returned to the
/// immediate caller and never retried internally.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity cannot be found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Insufficient stock to place an order.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Conditional decrement: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 left in stock"
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Product exists but is deactivated.
    #[error("Product {product_id} is inactive")]
    ProductInactive { product_id: String },

    /// The price a buyer was quoted no longer matches the listing.
    #[error("Price of product {product_id} changed from {quoted} to {current}")]
    PriceChanged {
        product_id: String,
        quoted: Money,
        current: Money,
    },

    /// Requested status change is not an edge of the state machine.
    ///
    /// ## When This Occurs
    /// - Shipping an order that is already delivered
    /// - Completing a payout that is already completed
    /// - Any same-state "transition"
    #[error("{entity} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// Payout request exceeds what the seller can withdraw.
    #[error("Payout of {requested} exceeds payable balance of {available}")]
    InsufficientPayableBalance { requested: Money, available: Money },

    /// Payout amount is zero or negative.
    #[error("Invalid payout amount: {reason}")]
    InvalidAmount { reason: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for a `NotFound` on a named entity.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Category of this rejection.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            CoreError::InsufficientPayableBalance { .. } => ErrorKind::InsufficientPayableBalance,
            CoreError::ProductInactive { .. }
            | CoreError::PriceChanged { .. }
            | CoreError::InvalidAmount { .. }
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::Validation(_) => ErrorKind::InvalidInput,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed amount, IFSC, UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
