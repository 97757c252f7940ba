//! # Product Catalog
//!
//! Seller listings. The sell price is always derived from cost and tax
//! rate and cannot be set directly; "deleting" a listing deactivates it so
//! existing orders keep their product reference.

use bazaar_core::{CoreError, NewProduct, Product, ProductUpdate};
use bazaar_db::{generate_product_id, ProductFilter};
use chrono::Utc;
use tracing::{info, warn};

use crate::context::ServiceContext;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct CatalogService {
    ctx: ServiceContext,
}

impl CatalogService {
    pub(crate) fn new(ctx: ServiceContext) -> Self {
        CatalogService { ctx }
    }

    /// Creates an active listing.
    ///
    /// ## Errors
    /// * `InvalidInput` - blank name, bad SKU, negative cost or stock,
    ///   tax rate outside 0-100 %, or a SKU already in use
    pub async fn add_product(&self, seller_id: &str, input: NewProduct) -> EngineResult<Product> {
        let product = match Product::create(generate_product_id(), seller_id.to_string(), input, Utc::now()) {
            Ok(product) => product,
            Err(e) => {
                warn!(seller_id = %seller_id, error = %e, "Product rejected");
                return Err(e.into());
            }
        };

        let products = self.ctx.db.products();
        let stored = self
            .ctx
            .bounded("add_product", products.insert(&product))
            .await?;

        info!(
            product_id = %stored.id,
            seller_id = %seller_id,
            sell_price = %stored.sell_price,
            "Product added"
        );
        Ok(stored)
    }

    /// Applies a seller edit, re-deriving the sell price when cost or tax
    /// rate changes.
    pub async fn update_product(&self, product_id: &str, update: &ProductUpdate) -> EngineResult<Product> {
        let products = self.ctx.db.products();
        let updated = self
            .ctx
            .bounded("update_product", products.update(product_id, update, Utc::now()))
            .await?;

        info!(product_id = %product_id, sell_price = %updated.sell_price, "Product updated");
        Ok(updated)
    }

    pub async fn deactivate_product(&self, product_id: &str) -> EngineResult<()> {
        let products = self.ctx.db.products();
        self.ctx
            .bounded("deactivate_product", products.deactivate(product_id, Utc::now()))
            .await?;

        info!(product_id = %product_id, "Product deactivated");
        Ok(())
    }

    pub async fn get_product(&self, product_id: &str) -> EngineResult<Product> {
        let products = self.ctx.db.products();
        self.ctx
            .bounded("get_product", products.get_by_id(product_id))
            .await?
            .ok_or_else(|| EngineError::from(CoreError::not_found("Product", product_id)))
    }

    pub async fn list_seller_products(
        &self,
        seller_id: &str,
        filter: &ProductFilter,
    ) -> EngineResult<Vec<Product>> {
        let products = self.ctx.db.products();
        self.ctx
            .bounded("list_seller_products", products.list_by_seller(seller_id, filter))
            .await
    }
}
