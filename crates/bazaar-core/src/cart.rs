//! # Cart
//!
//! The buyer's ephemeral cart. It is never persisted as its own entity: at
//! checkout each line becomes one order.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add(product, qty) ─────────► same product? quantity += qty            │
//! │                               new product?  push snapshot line         │
//! │                                                                         │
//! │  update_quantity(id, n) ────► n == 0 removes the line                  │
//! │                                                                         │
//! │  remove(id) / clear() ──────► drop lines                               │
//! │                                                                         │
//! │  totals(...) ───────────────► pricing::compute_cart_totals             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Rate};
use crate::pricing::{compute_cart_totals, CartTotals};
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the cart.
///
/// `name` and `unit_price` are frozen when the product is added, so the cart
/// keeps showing the price the buyer saw even if the seller edits it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: String,
    pub name: String,
    /// Pre-tax unit price at add time.
    pub unit_price: Money,
    pub quantity: i64,
}

impl CartLineItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.cost_price,
            quantity,
        }
    }

    /// `unit_price × quantity`, or `None` past the range of [`Money`].
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id`
/// - Every quantity is in 1..=999
/// - At most 100 lines
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Adds a product, or increases the quantity of its existing line.
    pub fn add(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if !product.is_active() {
            return Err(CoreError::ProductInactive {
                product_id: product.id.clone(),
            });
        }
        self.add_line(CartLineItem::from_product(product, quantity))
    }

    /// Adds a prepared line, merging with an existing line for the product.
    ///
    /// On merge the first snapshot's price is kept.
    pub fn add_line(&mut self, line: CartLineItem) -> CoreResult<()> {
        validate_quantity(line.quantity)?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == line.product_id)
        {
            let merged = existing.quantity + line.quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = merged;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(line);
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(product_id);
        }
        validate_quantity(quantity)?;

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::not_found("cart item", product_id)),
        }
    }

    pub fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(CoreError::not_found("cart item", product_id));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Prices the cart. See [`compute_cart_totals`].
    pub fn totals(
        &self,
        free_shipping_threshold: Money,
        flat_shipping_fee: Money,
        tax_rate: Rate,
    ) -> CoreResult<CartTotals> {
        compute_cart_totals(&self.items, free_shipping_threshold, flat_shipping_fee, tax_rate)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
