//! # Engine Error Types
//!
//! The one error type every service returns.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Business      │  │     Store               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Rejected       │  │  Database               │ │
//! │  │  ConfigLoad     │  │  (CoreError)    │  │  Timeout                │ │
//! │  │  ConfigSave     │  │  Unauthorized   │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Every variant maps onto an ErrorKind; only StoreUnavailable retries.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use bazaar_core::{CoreError, ErrorKind};
use bazaar_db::DbError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type covering every service failure.
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A configuration value is out of range.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Config file could not be written.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Business Errors
    // =========================================================================
    /// A business rule rejected the request before it reached the store.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// The caller's principal may not perform the operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// Repository failure, including rejections raised inside a transaction.
    #[error(transparent)]
    Database(#[from] DbError),

    /// The store did not answer within the configured timeout.
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl EngineError {
    /// Category of this failure.
    ///
    /// ```text
    /// Rejected(core)                → core.kind()
    /// Database(db)                  → db.kind()
    /// Timeout                       → StoreUnavailable
    /// Config / Unauthorized         → InvalidInput
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Rejected(core) => core.kind(),
            EngineError::Database(db) => db.kind(),
            EngineError::Timeout { .. } => ErrorKind::StoreUnavailable,
            EngineError::InvalidConfig(_)
            | EngineError::ConfigLoadFailed(_)
            | EngineError::ConfigSaveFailed(_)
            | EngineError::Unauthorized(_) => ErrorKind::InvalidInput,
        }
    }

    /// Whether the caller may retry with backoff.
    ///
    /// A [`EngineError::Timeout`] is retryable but does not prove the unit
    /// rolled back: the deadline can fire while `COMMIT` is in flight. Before
    /// retrying a create (order, checkout, payout), look the record up first,
    /// e.g. with `list_buyer_orders` or `list_payouts`.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
