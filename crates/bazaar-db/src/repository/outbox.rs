//! # Event Outbox Repository
//!
//! Durable record of every domain event, written in the same transaction as
//! the change it describes.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  ENGINE OPERATION (e.g., create_order)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. UPDATE products SET quantity = quantity - ? ...            │   │
//! │  │  2. INSERT INTO orders (...)                                   │   │
//! │  │  3. INSERT INTO event_outbox (event_type, payload)             │   │
//! │  │     VALUES ('order.created', <event JSON>)                     │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← Both succeed or both fail                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            NOTIFIER (outside this crate)                        │   │
//! │  │                                                                 │   │
//! │  │  1. pending(limit, max_attempts)                               │   │
//! │  │  2. For each entry:                                            │   │
//! │  │     a. Deliver (email, push, webhook)                          │   │
//! │  │     b. On success: mark_delivered(id)                          │   │
//! │  │     c. On failure: mark_failed(id, error)                      │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bazaar_core::DomainEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// One row of the `event_outbox` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub id: String,
    /// Dotted event name, e.g. `order.created`.
    pub event_type: String,
    pub aggregate_id: String,
    pub seller_id: String,
    /// JSON of the [`DomainEvent`].
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub attempted_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    /// Decodes the payload back into the event.
    pub fn event(&self) -> DbResult<DomainEvent> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

/// Appends `event` to the outbox on the caller's connection.
///
/// Call with the transaction that performs the change so the two commit or
/// roll back together.
pub async fn append(
    conn: &mut SqliteConnection,
    event: &DomainEvent,
    now: DateTime<Utc>,
) -> DbResult<OutboxEntry> {
    let entry = OutboxEntry {
        id: Uuid::new_v4().to_string(),
        event_type: event.name().to_string(),
        aggregate_id: event.aggregate_id().to_string(),
        seller_id: event.seller_id().to_string(),
        payload: serde_json::to_string(event)?,
        attempts: 0,
        last_error: None,
        created_at: now,
        attempted_at: None,
        delivered_at: None,
    };

    debug!(
        event_type = %entry.event_type,
        aggregate_id = %entry.aggregate_id,
        "Appending to event outbox"
    );

    sqlx::query(
        r#"
        INSERT INTO event_outbox (
            id, event_type, aggregate_id, seller_id, payload,
            attempts, last_error, created_at, attempted_at, delivered_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.event_type)
    .bind(&entry.aggregate_id)
    .bind(&entry.seller_id)
    .bind(&entry.payload)
    .bind(entry.attempts)
    .bind(&entry.last_error)
    .bind(entry.created_at)
    .bind(entry.attempted_at)
    .bind(entry.delivered_at)
    .execute(&mut *conn)
    .await?;

    Ok(entry)
}

/// Repository for draining the event outbox.
#[derive(Debug, Clone)]
pub struct EventOutboxRepository {
    pool: SqlitePool,
}

impl EventOutboxRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EventOutboxRepository { pool }
    }

    /// Undelivered entries with fewer than `max_attempts` failures, oldest
    /// first. Exhausted entries are excluded so they cannot fill the batch.
    pub async fn pending(&self, limit: u32, max_attempts: i64) -> DbResult<Vec<OutboxEntry>> {
        let entries = sqlx::query_as::<_, OutboxEntry>(
            r#"
            SELECT * FROM event_outbox
            WHERE delivered_at IS NULL AND attempts < ?2
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .bind(max_attempts)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Every entry recorded for one order or payout, oldest first.
    pub async fn for_aggregate(&self, aggregate_id: &str) -> DbResult<Vec<OutboxEntry>> {
        let entries = sqlx::query_as::<_, OutboxEntry>(
            "SELECT * FROM event_outbox WHERE aggregate_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn mark_delivered(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE event_outbox SET
                delivered_at = ?2,
                attempted_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a failed delivery attempt; the entry stays pending.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE event_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM event_outbox WHERE delivered_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Undelivered entries that have used up `max_attempts`.
    pub async fn count_exhausted(&self, max_attempts: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM event_outbox WHERE delivered_at IS NULL AND attempts >= ?1",
        )
        .bind(max_attempts)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Deletes entries delivered before `older_than`. Returns the number removed.
    pub async fn cleanup_delivered(&self, older_than: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM event_outbox WHERE delivered_at IS NOT NULL AND delivered_at < ?1",
        )
        .bind(older_than)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
