//! # Payment Method Registry
//!
//! Seller bank accounts and tax details.
//!
//! A seller has at most one default method; making another one default
//! clears the old flag in the same transaction. Removing the default does
//! not promote a replacement: the seller has no default until they pick one.

use bazaar_core::{PaymentMethod, PaymentMethodDetails, TaxInfo, TaxInfoUpdate};
use chrono::Utc;
use tracing::{info, warn};

use crate::context::ServiceContext;
use crate::error::EngineResult;

#[derive(Debug, Clone)]
pub struct PaymentMethodService {
    ctx: ServiceContext,
}

impl PaymentMethodService {
    pub(crate) fn new(ctx: ServiceContext) -> Self {
        PaymentMethodService { ctx }
    }

    /// Validates and stores a bank account.
    ///
    /// ## Errors
    /// * `InvalidInput` - blank field, account number not 6-20 digits,
    ///   routing code not an IFSC
    pub async fn add_method(
        &self,
        seller_id: &str,
        details: &PaymentMethodDetails,
        is_default: bool,
    ) -> EngineResult<PaymentMethod> {
        let methods = self.ctx.db.payment_methods();
        let added = self
            .ctx
            .bounded("add_payment_method", methods.add(seller_id, details, is_default, Utc::now()))
            .await;

        match added {
            Ok(method) => {
                info!(
                    seller_id = %seller_id,
                    method_id = %method.id,
                    account = %method.masked_account_number(),
                    is_default,
                    "Payment method added"
                );
                Ok(method)
            }
            Err(e) => {
                warn!(seller_id = %seller_id, error = %e, "Payment method rejected");
                Err(e)
            }
        }
    }

    /// Makes `method_id` the seller's default. `NotFound` if it is not theirs.
    pub async fn set_default(&self, seller_id: &str, method_id: &str) -> EngineResult<PaymentMethod> {
        let methods = self.ctx.db.payment_methods();
        let method = self
            .ctx
            .bounded("set_default_payment_method", methods.set_default(seller_id, method_id))
            .await?;

        info!(seller_id = %seller_id, method_id = %method_id, "Default payment method changed");
        Ok(method)
    }

    pub async fn remove_method(&self, method_id: &str) -> EngineResult<()> {
        let methods = self.ctx.db.payment_methods();
        self.ctx
            .bounded("remove_payment_method", methods.remove(method_id))
            .await?;

        info!(method_id = %method_id, "Payment method removed");
        Ok(())
    }

    pub async fn get_default(&self, seller_id: &str) -> EngineResult<Option<PaymentMethod>> {
        let methods = self.ctx.db.payment_methods();
        self.ctx
            .bounded("get_default_payment_method", methods.get_default(seller_id))
            .await
    }

    /// Default first, then oldest first.
    pub async fn list_methods(&self, seller_id: &str) -> EngineResult<Vec<PaymentMethod>> {
        let methods = self.ctx.db.payment_methods();
        self.ctx
            .bounded("list_payment_methods", methods.list_by_seller(seller_id))
            .await
    }

    /// Merges `update` into the seller's tax info, creating it on first save.
    pub async fn upsert_tax_info(&self, seller_id: &str, update: &TaxInfoUpdate) -> EngineResult<TaxInfo> {
        let tax_info = self.ctx.db.tax_info();
        let info = self
            .ctx
            .bounded("upsert_tax_info", tax_info.upsert(seller_id, update, Utc::now()))
            .await?;

        info!(seller_id = %seller_id, "Tax info saved");
        Ok(info)
    }

    /// The seller's tax info; all fields empty if they never saved any.
    pub async fn get_tax_info(&self, seller_id: &str) -> EngineResult<TaxInfo> {
        let tax_info = self.ctx.db.tax_info();
        let stored = self
            .ctx
            .bounded("get_tax_info", tax_info.get(seller_id))
            .await?;

        Ok(stored.unwrap_or_else(|| TaxInfo::empty(seller_id, Utc::now())))
    }
}
