//! # Validation Module
//!
//! Field-level input checks shared by every layer.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation (external)                                      │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Core (THIS MODULE + domain constructors)                     │
//! │  ├── Required fields, ranges, formats                                  │
//! │  └── Business rules (state machines, balances)                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity >= 0, amounts > 0)                    │
//! │  ├── UNIQUE constraints (order/payout numbers, single default)         │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::{Money, Rate, BPS_PER_WHOLE};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a product name: required, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name)?;
    if name.trim().chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }
    Ok(())
}

/// Validates a SKU.
///
/// ## Rules
/// - 1-50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use bazaar_core::validation::validate_sku;
///
/// assert!(validate_sku("SAREE-01").is_ok());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();
    validate_required("sku", sku)?;

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Trims a search term and caps it at 100 characters.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }
    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order or cart quantity: 1..=999.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates stock on hand: zero or more.
pub fn validate_stock(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Rejects negative amounts. Zero is allowed.
pub fn validate_money_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a percentage: 0 %..=100 %.
pub fn validate_rate(field: &str, rate: Rate) -> ValidationResult<()> {
    if !rate.is_valid_percentage() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: BPS_PER_WHOLE as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Banking & Tax Identifiers
// =============================================================================

/// Account numbers are 6-20 digits.
pub fn validate_account_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();
    let digits_only = number.chars().all(|c| c.is_ascii_digit());
    if !digits_only || !(6..=20).contains(&number.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "account_number".to_string(),
            reason: "must be 6 to 20 digits".to_string(),
        });
    }
    Ok(())
}

/// IFSC shape: four letters, a zero, six letters or digits (`SBIN0001234`).
pub fn validate_routing_code(code: &str) -> ValidationResult<()> {
    let code = code.trim().to_ascii_uppercase();
    let bytes = code.as_bytes();
    let ok = bytes.len() == 11
        && bytes[..4].iter().all(|b| b.is_ascii_uppercase())
        && bytes[4] == b'0'
        && bytes[5..].iter().all(|b| b.is_ascii_alphanumeric());
    if !ok {
        return Err(ValidationError::InvalidFormat {
            field: "routing_code".to_string(),
            reason: "expected an 11 character IFSC code like SBIN0001234".to_string(),
        });
    }
    Ok(())
}

/// PAN shape: five letters, four digits, one letter (`ABCDE1234F`).
pub fn validate_pan(pan: &str) -> ValidationResult<()> {
    let pan = pan.trim().to_ascii_uppercase();
    let bytes = pan.as_bytes();
    let ok = bytes.len() == 10
        && bytes[..5].iter().all(|b| b.is_ascii_uppercase())
        && bytes[5..9].iter().all(|b| b.is_ascii_digit())
        && bytes[9].is_ascii_uppercase();
    if !ok {
        return Err(ValidationError::InvalidFormat {
            field: "pan_number".to_string(),
            reason: "expected a PAN like ABCDE1234F".to_string(),
        });
    }
    Ok(())
}

/// GSTIN shape: 15 alphanumerics starting with a two-digit state code.
pub fn validate_gst_number(gst: &str) -> ValidationResult<()> {
    let gst = gst.trim();
    let bytes = gst.as_bytes();
    let ok = bytes.len() == 15
        && bytes[..2].iter().all(|b| b.is_ascii_digit())
        && bytes.iter().all(|b| b.is_ascii_alphanumeric());
    if !ok {
        return Err(ValidationError::InvalidFormat {
            field: "gst_number".to_string(),
            reason: "expected a 15 character GSTIN".to_string(),
        });
    }
    Ok(())
}

/// Indian postal code: six digits, not starting with zero.
pub fn validate_pincode(pincode: &str) -> ValidationResult<()> {
    let pincode = pincode.trim();
    let ok = pincode.len() == 6
        && pincode.chars().all(|c| c.is_ascii_digit())
        && !pincode.starts_with('0');
    if !ok {
        return Err(ValidationError::InvalidFormat {
            field: "pincode".to_string(),
            reason: "must be six digits".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    validate_required(field, id)?;
    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
