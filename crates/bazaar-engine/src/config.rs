//! # Engine Configuration
//!
//! Commercial parameters and store settings for the engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BAZAAR_COMMISSION_RATE=12.5                                        │
//! │     BAZAAR_DATABASE_PATH=/var/lib/bazaar/bazaar.db                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/bazaar/bazaar.toml (Linux)                               │
//! │     ~/Library/Application Support/in.bazaar.engine/bazaar.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     10% commission, free shipping above ₹500, ₹60 flat fee             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # bazaar.toml
//! [commerce]
//! commission_rate = "10%"
//! free_shipping_threshold = "500.00"
//! flat_shipping_fee = "60.00"
//!
//! [store]
//! database_path = "bazaar.db"
//! replica_path = "/mnt/replica/bazaar.db"  # optional, serves reports
//! max_connections = 5
//! timeout_ms = 5000
//! ```
//!
//! Amounts and rates are written as decimal strings so the file never
//! carries a binary float.

use bazaar_core::{Money, Rate};
use bazaar_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Commerce Settings
// =============================================================================

/// Pricing and settlement parameters.
///
/// Changing `commission_rate` only affects payouts requested afterwards;
/// every payout keeps the rate captured when it was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommerceSettings {
    /// Platform commission deducted from each payout.
    #[serde(with = "display_fromstr", default = "default_commission_rate")]
    pub commission_rate: Rate,

    /// Carts with a subtotal strictly above this ship free.
    #[serde(with = "display_fromstr", default = "default_free_shipping_threshold")]
    pub free_shipping_threshold: Money,

    /// Shipping charged below the threshold.
    #[serde(with = "display_fromstr", default = "default_flat_shipping_fee")]
    pub flat_shipping_fee: Money,
}

fn default_commission_rate() -> Rate {
    Rate::from_percent(10)
}

fn default_free_shipping_threshold() -> Money {
    Money::from_rupees(500)
}

fn default_flat_shipping_fee() -> Money {
    Money::from_rupees(60)
}

impl Default for CommerceSettings {
    fn default() -> Self {
        CommerceSettings {
            commission_rate: default_commission_rate(),
            free_shipping_threshold: default_free_shipping_threshold(),
            flat_shipping_fee: default_flat_shipping_fee(),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Where the data lives and how long the engine waits for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file of the primary database.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Read-only replica used for reports, if any.
    #[serde(default)]
    pub replica_path: Option<PathBuf>,

    /// Pool size of the primary.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Upper bound on any single engine operation (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("bazaar.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            database_path: default_database_path(),
            replica_path: None,
            max_connections: default_max_connections(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub commerce: CommerceSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (bazaar.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        let commerce = &self.commerce;

        if !commerce.commission_rate.is_valid_percentage() {
            return Err(EngineError::InvalidConfig(format!(
                "commission_rate must be between 0% and 100%, got {}",
                commerce.commission_rate
            )));
        }
        if commerce.free_shipping_threshold.is_negative() {
            return Err(EngineError::InvalidConfig(
                "free_shipping_threshold must not be negative".into(),
            ));
        }
        if commerce.flat_shipping_fee.is_negative() {
            return Err(EngineError::InvalidConfig(
                "flat_shipping_fee must not be negative".into(),
            ));
        }

        if self.store.database_path.as_os_str().is_empty() {
            return Err(EngineError::InvalidConfig("database_path is required".into()));
        }
        if self.store.max_connections == 0 {
            return Err(EngineError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.store.timeout_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "timeout_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `BAZAAR_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored; `validate` still runs
    /// on the result.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(rate) = lookup("BAZAAR_COMMISSION_RATE") {
            match rate.parse() {
                Ok(parsed) => {
                    debug!(rate = %rate, "Overriding commission rate from environment");
                    self.commerce.commission_rate = parsed;
                }
                Err(_) => warn!(rate = %rate, "Invalid BAZAAR_COMMISSION_RATE"),
            }
        }

        if let Some(amount) = lookup("BAZAAR_FREE_SHIPPING_THRESHOLD") {
            match amount.parse() {
                Ok(parsed) => self.commerce.free_shipping_threshold = parsed,
                Err(_) => warn!(amount = %amount, "Invalid BAZAAR_FREE_SHIPPING_THRESHOLD"),
            }
        }

        if let Some(amount) = lookup("BAZAAR_FLAT_SHIPPING_FEE") {
            match amount.parse() {
                Ok(parsed) => self.commerce.flat_shipping_fee = parsed,
                Err(_) => warn!(amount = %amount, "Invalid BAZAAR_FLAT_SHIPPING_FEE"),
            }
        }

        if let Some(path) = lookup("BAZAAR_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("BAZAAR_REPLICA_PATH") {
            self.store.replica_path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("BAZAAR_MAX_CONNECTIONS") {
            if let Ok(m) = max.parse::<u32>() {
                self.store.max_connections = m;
            }
        }

        if let Some(ms) = lookup("BAZAAR_STORE_TIMEOUT_MS") {
            if let Ok(t) = ms.parse::<u64>() {
                debug!(timeout_ms = t, "Overriding store timeout from environment");
                self.store.timeout_ms = t;
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("in", "bazaar", "engine")
            .map(|dirs| dirs.config_dir().join("bazaar.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn commission_rate(&self) -> Rate {
        self.commerce.commission_rate
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }

    /// Pool settings for the primary database.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.store.database_path).max_connections(self.store.max_connections)
    }

    /// Pool settings for the reporting replica, if one is configured.
    pub fn replica_db_config(&self) -> Option<DbConfig> {
        self.store
            .replica_path
            .as_ref()
            .map(|path| DbConfig::new(path).read_only())
    }
}

// =============================================================================
// Serde Helpers
// =============================================================================

/// (De)serializes through `Display`/`FromStr`, e.g. `"500.00"` or `"18%"`.
mod display_fromstr {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
