//! # Payout Repository
//!
//! Payout requests, their lifecycle, and the revenue sums they draw on.
//!
//! ## Balance Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Seller Balance                                     │
//! │                                                                         │
//! │  lifetime revenue   = Σ total_amount of delivered orders               │
//! │  payable revenue    = lifetime revenue − Σ amount of completed payouts │
//! │  available          = payable revenue  − Σ amount of pending and       │
//! │                                           processing payouts           │
//! │                                                                         │
//! │  request(amount) succeeds iff amount ≤ available                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Request Flow
//! ```text
//! BEGIN
//!   next PAY number          ← first statement is a write: concurrent
//!   read default method        requests for one seller queue here
//!   INSERT INTO payouts
//!   available = payable − outstanding (excluding this row)
//!   amount > available ?  → drop tx (ROLLBACK), InsufficientPayableBalance
//!   INSERT INTO event_outbox (payout.requested)
//! COMMIT
//! ```

use bazaar_core::payout::ensure_payable;
use bazaar_core::settlement::mask_account_number;
use bazaar_core::{
    CoreError, DomainEvent, Money, PaymentMethod, Payout, PayoutAmounts, PayoutStatus, Rate,
    PAYOUT_NUMBER_PREFIX,
};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::outbox;
use crate::repository::sequence::{next_document_number, PAYOUT_SEQUENCE};

/// The event a payout's current status publishes, if any.
///
/// Pending publishes `payout.requested`; processing publishes nothing.
pub fn payout_event(payout: &Payout) -> Option<DomainEvent> {
    match payout.status {
        PayoutStatus::Pending => Some(DomainEvent::payout_requested(payout)),
        PayoutStatus::Processing => None,
        PayoutStatus::Completed => Some(DomainEvent::payout_completed(payout)),
        PayoutStatus::Failed => Some(DomainEvent::payout_failed(payout)),
    }
}

/// Repository for payout database operations.
#[derive(Debug, Clone)]
pub struct PayoutRepository {
    pool: SqlitePool,
}

impl PayoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PayoutRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payout>> {
        let payout = sqlx::query_as::<_, Payout>("SELECT * FROM payouts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payout)
    }

    /// A seller's payouts, newest first.
    pub async fn list_by_seller(&self, seller_id: &str) -> DbResult<Vec<Payout>> {
        let payouts = sqlx::query_as::<_, Payout>(
            "SELECT * FROM payouts WHERE seller_id = ?1 ORDER BY created_at DESC, payout_number DESC",
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payouts)
    }

    /// Creates a pending payout if the seller's available balance covers it.
    ///
    /// ## Returns
    /// * `Err(DbError::Rejected(InvalidAmount))` - amount ≤ 0
    /// * `Err(DbError::Rejected(InsufficientPayableBalance))` - over balance
    pub async fn request(
        &self,
        seller_id: &str,
        amount: Money,
        commission_rate: Rate,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DbResult<Payout> {
        let amounts = PayoutAmounts::compute(amount, commission_rate)?;

        let mut tx = self.pool.begin().await?;

        let payout_number =
            next_document_number(&mut tx, PAYOUT_SEQUENCE, PAYOUT_NUMBER_PREFIX, now).await?;

        let method = sqlx::query_as::<_, PaymentMethod>(
            "SELECT * FROM payment_methods WHERE seller_id = ?1 AND is_default = 1",
        )
        .bind(seller_id)
        .fetch_optional(&mut *tx)
        .await?;

        let payout = Payout {
            id: Uuid::new_v4().to_string(),
            payout_number,
            seller_id: seller_id.to_string(),
            amount: amounts.amount,
            commission_rate: amounts.commission_rate,
            commission_amount: amounts.commission_amount,
            net_amount: amounts.net_amount,
            status: PayoutStatus::Pending,
            payout_date: None,
            payment_method_id: method.as_ref().map(|m| m.id.clone()),
            bank_name: method.as_ref().map(|m| m.bank_name.clone()),
            account_number: method.as_ref().map(|m| mask_account_number(&m.account_number)),
            routing_code: method.as_ref().map(|m| m.routing_code.clone()),
            notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            created_at: now,
            updated_at: now,
        };

        debug!(
            payout_number = %payout.payout_number,
            seller_id = %seller_id,
            amount = %payout.amount,
            "Inserting payout"
        );

        sqlx::query(
            r#"
            INSERT INTO payouts (
                id, payout_number, seller_id,
                amount, commission_rate, commission_amount, net_amount,
                status, payout_date,
                payment_method_id, bank_name, account_number, routing_code,
                notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7,
                ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15, ?16
            )
            "#,
        )
        .bind(&payout.id)
        .bind(&payout.payout_number)
        .bind(&payout.seller_id)
        .bind(payout.amount)
        .bind(payout.commission_rate)
        .bind(payout.commission_amount)
        .bind(payout.net_amount)
        .bind(payout.status)
        .bind(payout.payout_date)
        .bind(&payout.payment_method_id)
        .bind(&payout.bank_name)
        .bind(&payout.account_number)
        .bind(&payout.routing_code)
        .bind(&payout.notes)
        .bind(payout.created_at)
        .bind(payout.updated_at)
        .execute(&mut *tx)
        .await?;

        let payable = payable_revenue_on(&mut tx, seller_id).await?;
        let reserved = outstanding_on(&mut tx, seller_id, Some(&payout.id)).await?;
        ensure_payable(payout.amount, payable - reserved)?;

        outbox::append(&mut tx, &DomainEvent::payout_requested(&payout), now).await?;

        tx.commit().await?;

        Ok(payout)
    }

    /// Advances a payout along its state table with a compare-and-swap.
    ///
    /// Completion stamps `payout_date`; completed and failed payouts never
    /// change again.
    pub async fn advance(
        &self,
        payout_id: &str,
        target: PayoutStatus,
        now: DateTime<Utc>,
    ) -> DbResult<Payout> {
        let mut payout = self
            .get_by_id(payout_id)
            .await?
            .ok_or_else(|| DbError::not_found("Payout", payout_id))?;

        let payout_date = payout.plan_transition(target, now)?;
        let from = payout.status;

        debug!(payout_id = %payout_id, from = %from, to = %target, "Advancing payout");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE payouts SET
                status = ?3,
                payout_date = ?4,
                updated_at = ?5
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(payout_id)
        .bind(from)
        .bind(target)
        .bind(payout_date)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            drop(tx);
            let current = self
                .get_by_id(payout_id)
                .await?
                .ok_or_else(|| DbError::not_found("Payout", payout_id))?;
            return Err(CoreError::InvalidTransition {
                entity: "payout",
                id: payout_id.to_string(),
                from: current.status.to_string(),
                to: target.to_string(),
            }
            .into());
        }

        payout.status = target;
        payout.payout_date = payout_date;
        payout.updated_at = now;

        if let Some(event) = payout_event(&payout) {
            outbox::append(&mut tx, &event, now).await?;
        }

        tx.commit().await?;

        Ok(payout)
    }

    /// Delivered revenue not yet settled by a completed payout.
    pub async fn payable_revenue(&self, seller_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        payable_revenue_on(&mut conn, seller_id).await
    }

    /// Delivered revenue regardless of payouts.
    pub async fn lifetime_revenue(&self, seller_id: &str) -> DbResult<Money> {
        let paise: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_amount), 0) FROM orders
            WHERE seller_id = ?1 AND status = 'delivered'
            "#,
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_paise(paise))
    }

    /// Sum of pending and processing payout amounts.
    pub async fn outstanding_total(&self, seller_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        outstanding_on(&mut conn, seller_id, None).await
    }
}

async fn payable_revenue_on(conn: &mut SqliteConnection, seller_id: &str) -> DbResult<Money> {
    let paise: i64 = sqlx::query_scalar(
        r#"
        SELECT
            (SELECT COALESCE(SUM(total_amount), 0) FROM orders
             WHERE seller_id = ?1 AND status = 'delivered')
          - (SELECT COALESCE(SUM(amount), 0) FROM payouts
             WHERE seller_id = ?1 AND status = 'completed')
        "#,
    )
    .bind(seller_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_paise(paise))
}

async fn outstanding_on(
    conn: &mut SqliteConnection,
    seller_id: &str,
    excluding: Option<&str>,
) -> DbResult<Money> {
    let paise: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(amount), 0) FROM payouts
        WHERE seller_id = ?1
        AND status IN ('pending', 'processing')
        AND (?2 IS NULL OR id != ?2)
        "#,
    )
    .bind(seller_id)
    .bind(excluding)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_paise(paise))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::order::NewOrder;
    use crate::repository::product::generate_product_id;
    use crate::{Database, DbConfig};
    use bazaar_core::{AccountType, ErrorKind, NewProduct, OrderStatus, PaymentMethodDetails, Product};

    const SELLER: &str = "seller-1";

    /// Seeds one delivered order worth exactly `rupees` (tax-free product).
    async fn deliver_revenue(db: &Database, rupees: i64) {
        let product = Product::create(
            generate_product_id(),
            SELLER.to_string(),
            NewProduct {
                name: "Handloom Saree".to_string(),
                description: None,
                sku: None,
                cost_price: Money::from_rupees(rupees),
                tax_rate: Rate::zero(),
                quantity: 1,
            },
            Utc::now(),
        )
        .unwrap();
        db.products().insert(&product).await.unwrap();

        let order = db
            .orders()
            .place(
                "buyer-1",
                &NewOrder {
                    product_id: product.id.clone(),
                    quantity: 1,
                    address: Default::default(),
                    payment_method: None,
                    quoted_unit_price: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        db.orders().transition(&order.id, OrderStatus::InTransit, None, Utc::now()).await.unwrap();
        db.orders().transition(&order.id, OrderStatus::Delivered, None, Utc::now()).await.unwrap();
    }

    #[tokio::test]
    async fn test_request_splits_commission() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        deliver_revenue(&db, 10_000).await;

        let payout = db
            .payouts()
            .request(SELLER, Money::from_rupees(4_000), Rate::from_percent(10), None, Utc::now())
            .await
            .unwrap();

        assert_eq!(payout.status, PayoutStatus::Pending);
        assert_eq!(payout.commission_amount, Money::from_rupees(400));
        assert_eq!(payout.net_amount, Money::from_rupees(3_600));
        assert!(payout.payment_method_id.is_none());

        assert_eq!(db.payouts().payable_revenue(SELLER).await.unwrap(), Money::from_rupees(10_000));
        assert_eq!(db.payouts().outstanding_total(SELLER).await.unwrap(), Money::from_rupees(4_000));
    }

    #[tokio::test]
    async fn test_request_rejections() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        deliver_revenue(&db, 1_000).await;
        let payouts = db.payouts();
        let rate = Rate::from_percent(10);

        let err = payouts.request(SELLER, Money::zero(), rate, None, Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = payouts
            .request(SELLER, Money::from_rupees(1_001), rate, None, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientPayableBalance);

        // Outstanding requests reserve balance.
        payouts.request(SELLER, Money::from_rupees(600), rate, None, Utc::now()).await.unwrap();
        let err = payouts
            .request(SELLER, Money::from_rupees(600), rate, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InsufficientPayableBalance { available, .. })
                if available == Money::from_rupees(400)
        ));

        assert_eq!(payouts.list_by_seller(SELLER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_request_snapshots_default_method() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        deliver_revenue(&db, 1_000).await;
        let method = db
            .payment_methods()
            .add(
                SELLER,
                &PaymentMethodDetails {
                    bank_name: "State Bank of India".to_string(),
                    account_type: AccountType::Savings,
                    account_holder: "Asha Devi".to_string(),
                    account_number: "123456789012".to_string(),
                    routing_code: "SBIN0001234".to_string(),
                },
                true,
                Utc::now(),
            )
            .await
            .unwrap();

        let payout = db
            .payouts()
            .request(SELLER, Money::from_rupees(500), Rate::from_percent(10), None, Utc::now())
            .await
            .unwrap();
        assert_eq!(payout.payment_method_id.as_deref(), Some(method.id.as_str()));
        assert_eq!(payout.account_number.as_deref(), Some("****9012"));
    }

    #[tokio::test]
    async fn test_completion_settles_revenue() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        deliver_revenue(&db, 10_000).await;
        let payouts = db.payouts();

        let payout = payouts
            .request(SELLER, Money::from_rupees(4_000), Rate::from_percent(10), None, Utc::now())
            .await
            .unwrap();
        payouts.advance(&payout.id, PayoutStatus::Processing, Utc::now()).await.unwrap();
        assert_eq!(payouts.payable_revenue(SELLER).await.unwrap(), Money::from_rupees(10_000));

        let completed = payouts.advance(&payout.id, PayoutStatus::Completed, Utc::now()).await.unwrap();
        assert!(completed.payout_date.is_some());
        assert_eq!(payouts.payable_revenue(SELLER).await.unwrap(), Money::from_rupees(6_000));
        assert_eq!(payouts.lifetime_revenue(SELLER).await.unwrap(), Money::from_rupees(10_000));

        let err = payouts
            .advance(&payout.id, PayoutStatus::Completed, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let stored = payouts.get_by_id(&payout.id).await.unwrap().unwrap();
        assert_eq!(stored.payout_date, completed.payout_date);
        assert_eq!(stored.net_amount, completed.net_amount);

        let events = db.outbox().for_aggregate(&payout.id).await.unwrap();
        let names: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(names, ["payout.requested", "payout.completed"]);
    }

    #[tokio::test]
    async fn test_failed_payout_releases_reservation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        deliver_revenue(&db, 1_000).await;
        let payouts = db.payouts();
        let rate = Rate::from_percent(10);

        let payout = payouts.request(SELLER, Money::from_rupees(1_000), rate, None, Utc::now()).await.unwrap();
        payouts.advance(&payout.id, PayoutStatus::Failed, Utc::now()).await.unwrap();

        assert_eq!(payouts.outstanding_total(SELLER).await.unwrap(), Money::zero());
        payouts.request(SELLER, Money::from_rupees(1_000), rate, None, Utc::now()).await.unwrap();
    }
}
