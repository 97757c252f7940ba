//! # Settlement Details
//!
//! Where a seller's payouts go (payment methods) and the tax identity that
//! goes with them.
//!
//! A seller may register many destination accounts but at most one is the
//! default. The store enforces that with a transactional swap backed by a
//! partial unique index; the types here only validate input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::validation::{
    validate_account_number, validate_gst_number, validate_money_non_negative, validate_pan,
    validate_required, validate_routing_code,
};

// =============================================================================
// Account Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Savings,
    Current,
}

impl Default for AccountType {
    fn default() -> Self {
        AccountType::Savings
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// A registered payout destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub seller_id: String,
    pub bank_name: String,
    pub account_type: AccountType,
    pub account_holder: String,
    pub account_number: String,
    /// IFSC code.
    pub routing_code: String,
    pub is_default: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    /// Account number with all but the last four digits hidden.
    pub fn masked_account_number(&self) -> String {
        mask_account_number(&self.account_number)
    }
}

/// Hides all but the last four characters: `1234567890` → `****7890`.
pub fn mask_account_number(account_number: &str) -> String {
    let chars: Vec<char> = account_number.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{}", tail)
}

/// Seller input for a new payment method.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodDetails {
    pub bank_name: String,
    pub account_type: AccountType,
    pub account_holder: String,
    pub account_number: String,
    pub routing_code: String,
}

impl PaymentMethodDetails {
    /// Checks required fields, then formats.
    pub fn validate(&self) -> CoreResult<()> {
        validate_required("bank_name", &self.bank_name)?;
        validate_required("account_holder", &self.account_holder)?;
        validate_required("account_number", &self.account_number)?;
        validate_required("routing_code", &self.routing_code)?;
        validate_account_number(&self.account_number)?;
        validate_routing_code(&self.routing_code)?;
        Ok(())
    }

    /// Trimmed copy, routing code upper-cased.
    pub fn normalized(&self) -> PaymentMethodDetails {
        PaymentMethodDetails {
            bank_name: self.bank_name.trim().to_string(),
            account_type: self.account_type,
            account_holder: self.account_holder.trim().to_string(),
            account_number: self.account_number.trim().to_string(),
            routing_code: self.routing_code.trim().to_ascii_uppercase(),
        }
    }
}

// =============================================================================
// Tax Info
// =============================================================================

/// A seller's tax identity; one row per seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxInfo {
    pub seller_id: String,
    pub pan_number: Option<String>,
    pub gst_number: Option<String>,
    /// e.g. `2025-26`.
    pub tax_year: Option<String>,
    pub filing_status: Option<String>,
    pub total_tax_paid: Money,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Fields a seller may change on their tax info. `None` keeps the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxInfoUpdate {
    pub pan_number: Option<String>,
    pub gst_number: Option<String>,
    pub tax_year: Option<String>,
    pub filing_status: Option<String>,
    pub total_tax_paid: Option<Money>,
}

impl TaxInfoUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(pan) = &self.pan_number {
            validate_pan(pan)?;
        }
        if let Some(gst) = &self.gst_number {
            validate_gst_number(gst)?;
        }
        if let Some(paid) = self.total_tax_paid {
            validate_money_non_negative("total_tax_paid", paid)?;
        }
        Ok(())
    }
}

impl TaxInfo {
    /// Empty tax info for a seller that has never saved one.
    pub fn empty(seller_id: impl Into<String>, now: DateTime<Utc>) -> TaxInfo {
        TaxInfo {
            seller_id: seller_id.into(),
            pan_number: None,
            gst_number: None,
            tax_year: None,
            filing_status: None,
            total_tax_paid: Money::zero(),
            updated_at: now,
        }
    }

    /// Merges an update onto the stored values.
    pub fn merge(mut self, update: &TaxInfoUpdate, now: DateTime<Utc>) -> CoreResult<TaxInfo> {
        update.validate()?;
        if let Some(pan) = &update.pan_number {
            self.pan_number = Some(pan.trim().to_ascii_uppercase());
        }
        if let Some(gst) = &update.gst_number {
            self.gst_number = Some(gst.trim().to_ascii_uppercase());
        }
        if let Some(year) = &update.tax_year {
            self.tax_year = Some(year.trim().to_string());
        }
        if let Some(status) = &update.filing_status {
            self.filing_status = Some(status.trim().to_string());
        }
        if let Some(paid) = update.total_tax_paid {
            self.total_tax_paid = paid;
        }
        self.updated_at = now;
        Ok(self)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};

    fn details() -> PaymentMethodDetails {
        PaymentMethodDetails {
            bank_name: "State Bank of India".into(),
            account_type: AccountType::Savings,
            account_holder: "Asha Traders".into(),
            account_number: "123456789012".into(),
            routing_code: "sbin0001234".into(),
        }
    }

    #[test]
    fn test_valid_details() {
        assert!(details().validate().is_ok());
        assert_eq!(details().normalized().routing_code, "SBIN0001234");
    }

    #[test]
    fn test_blank_fields_rejected() {
        for blank in ["bank_name", "account_holder", "account_number", "routing_code"] {
            let mut d = details();
            match blank {
                "bank_name" => d.bank_name = "  ".into(),
                "account_holder" => d.account_holder = String::new(),
                "account_number" => d.account_number = String::new(),
                _ => d.routing_code = " ".into(),
            }
            match d.validate() {
                Err(CoreError::Validation(ValidationError::Required { field })) => {
                    assert_eq!(field, blank)
                }
                other => panic!("{}: unexpected {:?}", blank, other),
            }
        }
    }

    #[test]
    fn test_mask_account_number() {
        assert_eq!(mask_account_number("123456789012"), "****9012");
        assert_eq!(mask_account_number("12"), "****12");
    }

    #[test]
    fn test_tax_info_merge() {
        let info = TaxInfo::empty("s-1", Utc::now());
        let merged = info
            .merge(
                &TaxInfoUpdate {
                    pan_number: Some("abcde1234f".into()),
                    total_tax_paid: Some(Money::from_rupees(1200)),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(merged.pan_number.as_deref(), Some("ABCDE1234F"));
        assert_eq!(merged.total_tax_paid, Money::from_rupees(1200));
        assert_eq!(merged.gst_number, None);
    }

    #[test]
    fn test_tax_info_rejects_bad_pan() {
        let info = TaxInfo::empty("s-1", Utc::now());
        let result = info.merge(
            &TaxInfoUpdate {
                pan_number: Some("123".into()),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
