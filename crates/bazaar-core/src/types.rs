//! # Catalog Types
//!
//! The seller-owned product record and the only ways it may change.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Catalog Types                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   NewProduct    │   │    Product      │   │  ProductUpdate  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │──►│  cost_price     │◄──│  Option<...>    │       │
//! │  │  cost_price     │   │  tax_rate       │   │                 │       │
//! │  │  tax_rate       │   │  sell_price (*) │   │  per sanctioned │       │
//! │  │  quantity       │   │  quantity       │   │  field          │       │
//! │  └─────────────────┘   │  status         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                        (*) derived, never set directly                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4, immutable, used for relations
//! - `sku`: optional seller-facing business identifier

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::{Money, Rate};
use crate::pricing::derive_sell_price;
use crate::validation::{validate_money_non_negative, validate_product_name, validate_sku, validate_stock};

// =============================================================================
// Product Status
// =============================================================================

/// Listing status of a product. Inactive is the soft-deleted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl ProductStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Active
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product listed by a seller.
///
/// `sell_price` is a pure function of `cost_price` and `tax_rate`; the only
/// way to change it is through [`Product::apply`] with a new cost or rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Seller that owns this listing.
    pub seller_id: String,

    /// Display name shown on the storefront.
    pub name: String,

    pub description: Option<String>,

    /// Stock Keeping Unit, unique when present.
    pub sku: Option<String>,

    /// Pre-tax price the seller charges.
    pub cost_price: Money,

    /// GST-equivalent flat rate applied on top of cost price.
    pub tax_rate: Rate,

    /// Customer-facing price, `cost_price × (1 + tax_rate)`.
    pub sell_price: Money,

    /// Units on hand. Never negative.
    pub quantity: i64,

    pub status: ProductStatus,

    /// Average review rating (0.0-5.0), maintained by the review subsystem.
    pub rating: f64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a new active listing from seller input.
    ///
    /// ## Errors
    /// `InvalidInput` if the name is blank, cost is negative, the tax rate
    /// lies outside 0-100 %, or quantity is negative.
    pub fn create(
        id: String,
        seller_id: String,
        input: NewProduct,
        now: DateTime<Utc>,
    ) -> CoreResult<Product> {
        validate_product_name(&input.name)?;
        if let Some(sku) = &input.sku {
            validate_sku(sku)?;
        }
        validate_stock(input.quantity)?;
        let sell_price = derive_sell_price(input.cost_price, input.tax_rate)?;

        Ok(Product {
            id,
            seller_id,
            name: input.name.trim().to_string(),
            description: input.description,
            sku: input.sku.map(|s| s.trim().to_string()),
            cost_price: input.cost_price,
            tax_rate: input.tax_rate,
            sell_price,
            quantity: input.quantity,
            status: ProductStatus::Active,
            rating: 0.0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a seller edit in place.
    ///
    /// Validates every provided field first, so a rejected update leaves the
    /// product untouched. Sell price is re-derived whenever cost or rate is
    /// part of the update.
    pub fn apply(&mut self, update: &ProductUpdate, now: DateTime<Utc>) -> CoreResult<()> {
        if let Some(name) = &update.name {
            validate_product_name(name)?;
        }
        if let Some(quantity) = update.quantity {
            validate_stock(quantity)?;
        }
        let cost_price = update.cost_price.unwrap_or(self.cost_price);
        let tax_rate = update.tax_rate.unwrap_or(self.tax_rate);
        validate_money_non_negative("cost_price", cost_price)?;
        let sell_price = derive_sell_price(cost_price, tax_rate)?;

        if let Some(name) = &update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.cost_price = cost_price;
        self.tax_rate = tax_rate;
        self.sell_price = sell_price;
        self.updated_at = now;
        Ok(())
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Whether `quantity` units can be ordered right now.
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        self.is_active() && self.quantity >= quantity
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Seller input for a new listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub cost_price: Money,
    pub tax_rate: Rate,
    pub quantity: i64,
}

/// The sanctioned mutable fields of a product.
///
/// `None` leaves a field as is. `sell_price`, ids, rating and timestamps
/// cannot be written through an update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub cost_price: Option<Money>,
    pub tax_rate: Option<Rate>,
    pub quantity: Option<i64>,
    pub status: Option<ProductStatus>,
}

impl ProductUpdate {
    /// Whether the update changes anything at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.cost_price.is_none()
            && self.tax_rate.is_none()
            && self.quantity.is_none()
            && self.status.is_none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn sample() -> Product {
        Product::create(
            "p-1".into(),
            "s-1".into(),
            NewProduct {
                name: "Handloom Saree".into(),
                description: None,
                sku: Some("SAREE-01".into()),
                cost_price: Money::from_rupees(100),
                tax_rate: Rate::from_percent(18),
                quantity: 5,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_derives_sell_price() {
        let p = sample();
        assert_eq!(p.sell_price, Money::from_rupees(118));
        assert_eq!(p.status, ProductStatus::Active);
        assert!(p.can_fulfil(5));
        assert!(!p.can_fulfil(6));
    }

    #[test]
    fn test_create_rejects_negative_cost() {
        let err = Product::create(
            "p".into(),
            "s".into(),
            NewProduct {
                name: "x".into(),
                description: None,
                sku: None,
                cost_price: Money::from_paise(-1),
                tax_rate: Rate::zero(),
                quantity: 0,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_update_recomputes_sell_price() {
        let mut p = sample();
        p.apply(
            &ProductUpdate {
                cost_price: Some(Money::from_rupees(200)),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(p.sell_price, Money::from_rupees(236));

        p.apply(
            &ProductUpdate {
                tax_rate: Some(Rate::from_percent(5)),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(p.sell_price, Money::from_rupees(210));
    }

    #[test]
    fn test_rejected_update_leaves_product_untouched() {
        let mut p = sample();
        let before = p.clone();
        let result = p.apply(
            &ProductUpdate {
                name: Some("Renamed".into()),
                tax_rate: Some(Rate::from_bps(10_001)),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(result.is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn test_inactive_product_cannot_fulfil() {
        let mut p = sample();
        p.apply(
            &ProductUpdate {
                status: Some(ProductStatus::Inactive),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert!(!p.can_fulfil(1));
    }
}
