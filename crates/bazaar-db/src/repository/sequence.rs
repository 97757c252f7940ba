//! # Document Number Sequences
//!
//! Store-side counters behind `ORD-YYYYMMDD-NNNNNN` and `PAY-YYYYMMDD-NNNNNN`.
//!
//! ```text
//! BEGIN
//!   UPDATE sequences SET value = value + 1 WHERE name = 'order' RETURNING value
//!        │                      (takes the write lock; a second checkout
//!        │                       waits here until this one commits)
//!        ▼
//!   ORD-20260309-000042
//! COMMIT / ROLLBACK (a rolled-back number is handed out again)
//! ```

use bazaar_core::format_document_number;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Sequence backing order numbers.
pub const ORDER_SEQUENCE: &str = "order";

/// Sequence backing payout numbers.
pub const PAYOUT_SEQUENCE: &str = "payout";

/// Bumps `sequence` and formats the next document number.
///
/// Must run inside the transaction that inserts the document.
pub async fn next_document_number(
    conn: &mut SqliteConnection,
    sequence: &str,
    prefix: &str,
    now: DateTime<Utc>,
) -> DbResult<String> {
    let value: Option<i64> =
        sqlx::query_scalar("UPDATE sequences SET value = value + 1 WHERE name = ?1 RETURNING value")
            .bind(sequence)
            .fetch_optional(&mut *conn)
            .await?;

    let value = value.ok_or_else(|| DbError::Internal(format!("sequence '{}' is missing", sequence)))?;

    let number = format_document_number(prefix, now.date_naive(), value);
    debug!(sequence = %sequence, number = %number, "Allocated document number");
    Ok(number)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_numbers_are_sequential() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let first = next_document_number(&mut conn, ORDER_SEQUENCE, "ORD", now).await.unwrap();
        let second = next_document_number(&mut conn, ORDER_SEQUENCE, "ORD", now).await.unwrap();
        let payout = next_document_number(&mut conn, PAYOUT_SEQUENCE, "PAY", now).await.unwrap();

        assert_eq!(first, "ORD-20260309-000001");
        assert_eq!(second, "ORD-20260309-000002");
        assert_eq!(payout, "PAY-20260309-000001");
    }

    #[tokio::test]
    async fn test_unknown_sequence_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let result = next_document_number(&mut conn, "invoice", "INV", Utc::now()).await;
        assert!(matches!(result, Err(DbError::Internal(_))));
    }
}
