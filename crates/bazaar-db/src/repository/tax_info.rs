//! # Tax Info Repository
//!
//! One row per seller; created on first save and merged on every later one.

use bazaar_core::{TaxInfo, TaxInfoUpdate};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct TaxInfoRepository {
    pool: SqlitePool,
}

impl TaxInfoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TaxInfoRepository { pool }
    }

    pub async fn get(&self, seller_id: &str) -> DbResult<Option<TaxInfo>> {
        let info = sqlx::query_as::<_, TaxInfo>("SELECT * FROM seller_tax_info WHERE seller_id = ?1")
            .bind(seller_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(info)
    }

    /// Merges `update` into the seller's tax info, creating the row if needed.
    ///
    /// Fields absent from the update keep their stored values.
    pub async fn upsert(
        &self,
        seller_id: &str,
        update: &TaxInfoUpdate,
        now: DateTime<Utc>,
    ) -> DbResult<TaxInfo> {
        update.validate()?;

        debug!(seller_id = %seller_id, "Saving tax info");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO seller_tax_info (seller_id, updated_at) VALUES (?1, ?2)
            ON CONFLICT (seller_id) DO NOTHING
            "#,
        )
        .bind(seller_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let stored = sqlx::query_as::<_, TaxInfo>("SELECT * FROM seller_tax_info WHERE seller_id = ?1")
            .bind(seller_id)
            .fetch_one(&mut *tx)
            .await?;

        let info = stored.merge(update, now)?;

        sqlx::query(
            r#"
            UPDATE seller_tax_info SET
                pan_number = ?2,
                gst_number = ?3,
                tax_year = ?4,
                filing_status = ?5,
                total_tax_paid = ?6,
                updated_at = ?7
            WHERE seller_id = ?1
            "#,
        )
        .bind(&info.seller_id)
        .bind(&info.pan_number)
        .bind(&info.gst_number)
        .bind(&info.tax_year)
        .bind(&info.filing_status)
        .bind(info.total_tax_paid)
        .bind(info.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(info)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bazaar_core::{ErrorKind, Money};

    #[tokio::test]
    async fn test_upsert_creates_then_merges() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.tax_info();
        assert!(repo.get("s1").await.unwrap().is_none());

        let first = repo
            .upsert(
                "s1",
                &TaxInfoUpdate {
                    pan_number: Some("abcde1234f".to_string()),
                    tax_year: Some("2025-26".to_string()),
                    ..Default::default()
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(first.pan_number.as_deref(), Some("ABCDE1234F"));
        assert_eq!(first.total_tax_paid, Money::zero());

        let second = repo
            .upsert(
                "s1",
                &TaxInfoUpdate {
                    total_tax_paid: Some(Money::from_rupees(12_500)),
                    ..Default::default()
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(second.pan_number.as_deref(), Some("ABCDE1234F"));
        assert_eq!(second.tax_year.as_deref(), Some("2025-26"));

        let stored = repo.get("s1").await.unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_invalid_update_writes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.tax_info();

        let err = repo
            .upsert(
                "s1",
                &TaxInfoUpdate {
                    gst_number: Some("not-a-gstin".to_string()),
                    ..Default::default()
                },
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(repo.get("s1").await.unwrap().is_none());
    }
}
