//! # Pricing Calculator
//!
//! Pure price math: sell price from cost and tax, cart totals, and the
//! frozen amounts of an order line.
//!
//! ## Checkout Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line items ──► subtotal = Σ unit_price × quantity                      │
//! │                    │                                                    │
//! │                    ├──► shipping = 0        if subtotal >  threshold    │
//! │                    │               flat fee if subtotal <= threshold    │
//! │                    │                                                    │
//! │                    └──► tax = round_half_up(subtotal × rate)            │
//! │                               (shipping is never taxed)                 │
//! │                                                                         │
//! │  total = subtotal + shipping + tax     (exact, integer paise)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartLineItem;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Rate};
use crate::validation::{validate_money_non_negative, validate_quantity, validate_rate};

// =============================================================================
// Sell Price
// =============================================================================

/// Derives the customer-facing sell price.
///
/// `cost_price × (1 + tax_rate/100)`, rounded half up to the paisa.
///
/// ## Errors
/// `InvalidInput` if `cost_price` is negative or `tax_rate` exceeds 100 %.
///
/// ```rust
/// use bazaar_core::money::{Money, Rate};
/// use bazaar_core::pricing::derive_sell_price;
///
/// let sell = derive_sell_price(Money::from_rupees(100), Rate::from_percent(18)).unwrap();
/// assert_eq!(sell, Money::from_rupees(118));
/// ```
pub fn derive_sell_price(cost_price: Money, tax_rate: Rate) -> CoreResult<Money> {
    validate_money_non_negative("cost_price", cost_price)?;
    validate_rate("tax_rate", tax_rate)?;
    cost_price
        .checked_add(cost_price.percentage_of(tax_rate))
        .ok_or_else(|| too_large("sell_price"))
}

/// Overflow past `i64` paise, reported as a range error on `field`.
fn too_large(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Subtotal, shipping, tax and grand total of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

/// Computes the checkout totals of a list of line items.
///
/// An empty list yields all zeros (no shipping is charged on nothing).
/// The free-shipping comparison is strict: a subtotal exactly equal to the
/// threshold still pays the flat fee.
///
/// ## Errors
/// `InvalidInput` for a negative unit price, a quantity below 1, a negative
/// threshold or fee, or a tax rate above 100 %.
pub fn compute_cart_totals(
    line_items: &[CartLineItem],
    free_shipping_threshold: Money,
    flat_shipping_fee: Money,
    tax_rate: Rate,
) -> CoreResult<CartTotals> {
    validate_money_non_negative("free_shipping_threshold", free_shipping_threshold)?;
    validate_money_non_negative("flat_shipping_fee", flat_shipping_fee)?;
    validate_rate("tax_rate", tax_rate)?;

    if line_items.is_empty() {
        return Ok(CartTotals::default());
    }

    let mut subtotal = Money::zero();
    for item in line_items {
        validate_money_non_negative("unit_price", item.unit_price)?;
        validate_quantity(item.quantity)?;
        subtotal = item
            .line_total()
            .and_then(|line| subtotal.checked_add(line))
            .ok_or_else(|| too_large("subtotal"))?;
    }

    let tax = subtotal.percentage_of(tax_rate);
    settle_totals(subtotal, tax, free_shipping_threshold, flat_shipping_fee)
}

/// Totals of lines that were already priced and recorded.
///
/// Unlike [`compute_cart_totals`] the tax is not recomputed: it is the sum of
/// each line's own `tax_amount`, so the result is what the orders charge.
/// Shipping follows the same strict free-shipping threshold.
pub fn compute_checkout_totals(
    lines: &[OrderPricing],
    free_shipping_threshold: Money,
    flat_shipping_fee: Money,
) -> CoreResult<CartTotals> {
    validate_money_non_negative("free_shipping_threshold", free_shipping_threshold)?;
    validate_money_non_negative("flat_shipping_fee", flat_shipping_fee)?;

    if lines.is_empty() {
        return Ok(CartTotals::default());
    }

    let mut subtotal = Money::zero();
    let mut tax = Money::zero();
    for line in lines {
        subtotal = subtotal
            .checked_add(line.line_subtotal)
            .ok_or_else(|| too_large("subtotal"))?;
        tax = tax
            .checked_add(line.tax_amount)
            .ok_or_else(|| too_large("tax"))?;
    }

    settle_totals(subtotal, tax, free_shipping_threshold, flat_shipping_fee)
}

fn settle_totals(
    subtotal: Money,
    tax: Money,
    free_shipping_threshold: Money,
    flat_shipping_fee: Money,
) -> CoreResult<CartTotals> {
    let shipping = if subtotal > free_shipping_threshold {
        Money::zero()
    } else {
        flat_shipping_fee
    };
    let total = subtotal
        .checked_add(shipping)
        .and_then(|t| t.checked_add(tax))
        .ok_or_else(|| too_large("total"))?;

    Ok(CartTotals {
        subtotal,
        shipping,
        tax,
        total,
    })
}

// =============================================================================
// Order Line Pricing
// =============================================================================

/// The amounts frozen onto an order at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderPricing {
    /// `unit_price × quantity`, before tax.
    pub line_subtotal: Money,
    pub tax_amount: Money,
    /// `line_subtotal + tax_amount`.
    pub total_amount: Money,
}

/// Prices one order line: `quantity × unit_price × (1 + tax_rate)`.
pub fn price_order_line(unit_price: Money, quantity: i64, tax_rate: Rate) -> CoreResult<OrderPricing> {
    validate_money_non_negative("unit_price", unit_price)?;
    validate_quantity(quantity)?;
    validate_rate("tax_rate", tax_rate)?;

    let line_subtotal = unit_price
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| too_large("line_subtotal"))?;
    let tax_amount = line_subtotal.percentage_of(tax_rate);
    let total_amount = line_subtotal
        .checked_add(tax_amount)
        .ok_or_else(|| too_large("total_amount"))?;
    Ok(OrderPricing {
        line_subtotal,
        tax_amount,
        total_amount,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
