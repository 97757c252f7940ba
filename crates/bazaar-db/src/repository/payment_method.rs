//! # Payment Method Repository
//!
//! Seller bank accounts that payouts are sent to.
//!
//! ## Single Default
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    At Most One Default per Seller                       │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    UPDATE payment_methods SET is_default = 0                           │
//! │    WHERE seller_id = ? AND is_default = 1     ← write lock, clears     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │    INSERT ... is_default = 1   (add)                                   │
//! │    UPDATE ... is_default = 1   (set_default)                           │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Backstop: UNIQUE INDEX ... (seller_id) WHERE is_default = 1           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Removing the default leaves the seller without one; nothing is promoted.

use bazaar_core::{PaymentMethod, PaymentMethodDetails};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Repository for payment method database operations.
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    pool: SqlitePool,
}

impl PaymentMethodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentMethodRepository { pool }
    }

    /// Validates and stores a new method, swapping the default if asked.
    pub async fn add(
        &self,
        seller_id: &str,
        details: &PaymentMethodDetails,
        is_default: bool,
        now: DateTime<Utc>,
    ) -> DbResult<PaymentMethod> {
        let details = details.normalized();
        details.validate()?;

        let method = PaymentMethod {
            id: Uuid::new_v4().to_string(),
            seller_id: seller_id.to_string(),
            bank_name: details.bank_name,
            account_type: details.account_type,
            account_holder: details.account_holder,
            account_number: details.account_number,
            routing_code: details.routing_code,
            is_default,
            created_at: now,
        };

        debug!(
            id = %method.id,
            seller_id = %seller_id,
            is_default = is_default,
            "Adding payment method"
        );

        let mut tx = self.pool.begin().await?;

        if is_default {
            clear_default(&mut tx, seller_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO payment_methods (
                id, seller_id, bank_name, account_type, account_holder,
                account_number, routing_code, is_default, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&method.id)
        .bind(&method.seller_id)
        .bind(&method.bank_name)
        .bind(method.account_type)
        .bind(&method.account_holder)
        .bind(&method.account_number)
        .bind(&method.routing_code)
        .bind(method.is_default)
        .bind(method.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(method)
    }

    /// Makes `method_id` the seller's only default.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such method for this seller; the
    ///   previous default is kept
    pub async fn set_default(&self, seller_id: &str, method_id: &str) -> DbResult<PaymentMethod> {
        debug!(seller_id = %seller_id, method_id = %method_id, "Swapping default payment method");

        let mut tx = self.pool.begin().await?;

        clear_default(&mut tx, seller_id).await?;

        let result = sqlx::query(
            "UPDATE payment_methods SET is_default = 1 WHERE id = ?1 AND seller_id = ?2",
        )
        .bind(method_id)
        .bind(seller_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PaymentMethod", method_id));
        }

        let method = sqlx::query_as::<_, PaymentMethod>("SELECT * FROM payment_methods WHERE id = ?1")
            .bind(method_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(method)
    }

    /// Deletes a method. Past payouts keep their snapshot of it.
    pub async fn remove(&self, method_id: &str) -> DbResult<()> {
        debug!(method_id = %method_id, "Removing payment method");

        let result = sqlx::query("DELETE FROM payment_methods WHERE id = ?1")
            .bind(method_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PaymentMethod", method_id));
        }

        Ok(())
    }

    pub async fn get_by_id(&self, method_id: &str) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>("SELECT * FROM payment_methods WHERE id = ?1")
            .bind(method_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(method)
    }

    pub async fn get_default(&self, seller_id: &str) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>(
            "SELECT * FROM payment_methods WHERE seller_id = ?1 AND is_default = 1",
        )
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    /// A seller's methods, default first, then oldest first.
    pub async fn list_by_seller(&self, seller_id: &str) -> DbResult<Vec<PaymentMethod>> {
        let methods = sqlx::query_as::<_, PaymentMethod>(
            r#"
            SELECT * FROM payment_methods
            WHERE seller_id = ?1
            ORDER BY is_default DESC, created_at ASC, rowid ASC
            "#,
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }
}

async fn clear_default(conn: &mut SqliteConnection, seller_id: &str) -> DbResult<()> {
    sqlx::query("UPDATE payment_methods SET is_default = 0 WHERE seller_id = ?1 AND is_default = 1")
        .bind(seller_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bazaar_core::{AccountType, ErrorKind};

    fn details(bank: &str, account: &str) -> PaymentMethodDetails {
        PaymentMethodDetails {
            bank_name: bank.to_string(),
            account_type: AccountType::Current,
            account_holder: "Ravi Kumar".to_string(),
            account_number: account.to_string(),
            routing_code: "hdfc0000123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_normalizes_and_validates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.payment_methods();

        let method = repo.add("s1", &details(" HDFC ", "50100012345"), false, Utc::now()).await.unwrap();
        assert_eq!(method.bank_name, "HDFC");
        assert_eq!(method.routing_code, "HDFC0000123");

        let err = repo.add("s1", &details("", "50100012345"), false, Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = repo.add("s1", &details("HDFC", "12ab"), false, Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_single_default_after_any_sequence() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.payment_methods();

        let a = repo.add("s1", &details("A", "1000000001"), true, Utc::now()).await.unwrap();
        let b = repo.add("s1", &details("B", "1000000002"), true, Utc::now()).await.unwrap();
        repo.add("s1", &details("C", "1000000003"), false, Utc::now()).await.unwrap();
        repo.add("s2", &details("D", "1000000004"), true, Utc::now()).await.unwrap();

        let listed = repo.list_by_seller("s1").await.unwrap();
        assert_eq!(listed.iter().filter(|m| m.is_default).count(), 1);
        assert_eq!(listed[0].id, b.id);

        repo.set_default("s1", &a.id).await.unwrap();
        assert_eq!(repo.get_default("s1").await.unwrap().unwrap().id, a.id);
        assert_eq!(repo.get_default("s2").await.unwrap().unwrap().bank_name, "D");
    }

    #[tokio::test]
    async fn test_set_default_foreign_method_keeps_previous() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.payment_methods();

        let mine = repo.add("s1", &details("A", "1000000001"), true, Utc::now()).await.unwrap();
        let theirs = repo.add("s2", &details("B", "1000000002"), false, Utc::now()).await.unwrap();

        let err = repo.set_default("s1", &theirs.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(repo.get_default("s1").await.unwrap().unwrap().id, mine.id);
    }

    #[tokio::test]
    async fn test_remove_default_promotes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.payment_methods();

        let a = repo.add("s1", &details("A", "1000000001"), true, Utc::now()).await.unwrap();
        repo.add("s1", &details("B", "1000000002"), false, Utc::now()).await.unwrap();

        repo.remove(&a.id).await.unwrap();
        assert!(repo.get_default("s1").await.unwrap().is_none());

        let err = repo.remove(&a.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
