//! # Domain Event Fan-out
//!
//! Two delivery paths for the same events:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Event Delivery                                    │
//! │                                                                         │
//! │  service tx ──► event_outbox row (same transaction)                    │
//! │      │                    │                                             │
//! │      │ commit             │ OutboxRelay::relay_batch                    │
//! │      ▼                    ▼                                             │
//! │  EventBus::publish    EventSink::deliver ──► mark_delivered / failed   │
//! │  (in-process,         (durable, at least once)                         │
//! │   fire and forget)                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscribers that fall behind the bus capacity lose the oldest events
//! (`RecvError::Lagged`); the outbox is the path that never loses one.

use std::sync::Arc;

use bazaar_core::DomainEvent;
use bazaar_db::{Database, OutboxEntry};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::EngineResult;

// =============================================================================
// Constants
// =============================================================================

/// Events buffered per subscriber before the slowest one starts lagging.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Delivery attempts before the relay stops trying an outbox entry.
pub const MAX_DELIVERY_ATTEMPTS: i64 = 10;

// =============================================================================
// Event Bus
// =============================================================================

/// In-process broadcast of committed domain events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        EventBus { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Publishes without waiting; having no subscribers is not an error.
    pub fn publish(&self, event: DomainEvent) {
        debug!(event = event.name(), aggregate_id = %event.aggregate_id(), "Publishing event");
        let _ = self.tx.send(event);
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Outbox Relay
// =============================================================================

/// Destination for durable event delivery (webhook, mailer, queue, ...).
pub trait EventSink: Send + Sync {
    /// Delivers one event. An `Err` leaves the outbox entry pending.
    fn deliver(&self, event: &DomainEvent) -> Result<(), String>;
}

/// Replays outbox entries onto the in-process bus.
impl EventSink for EventBus {
    fn deliver(&self, event: &DomainEvent) -> Result<(), String> {
        self.publish(event.clone());
        Ok(())
    }
}

/// Outcome of one relay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub delivered: usize,
    pub failed: usize,
    /// Entries past [`MAX_DELIVERY_ATTEMPTS`], left in place for inspection
    /// and never fetched again.
    pub skipped: usize,
}

/// Drains the `event_outbox` table into an [`EventSink`].
///
/// Request-driven: the caller decides when to run a pass.
pub struct OutboxRelay {
    db: Database,
    sink: Arc<dyn EventSink>,
}

impl OutboxRelay {
    pub fn new(db: Database, sink: Arc<dyn EventSink>) -> Self {
        OutboxRelay { db, sink }
    }

    /// Delivers up to `limit` pending entries, oldest first.
    pub async fn relay_batch(&self, limit: u32) -> EngineResult<RelayReport> {
        let outbox = self.db.outbox();
        let entries = outbox.pending(limit, MAX_DELIVERY_ATTEMPTS).await?;
        let exhausted = outbox.count_exhausted(MAX_DELIVERY_ATTEMPTS).await?;

        if exhausted > 0 {
            warn!(
                count = exhausted,
                max_attempts = MAX_DELIVERY_ATTEMPTS,
                "Outbox entries exceeded max delivery attempts"
            );
        }

        let mut report = RelayReport {
            skipped: usize::try_from(exhausted).unwrap_or_default(),
            ..RelayReport::default()
        };

        if entries.is_empty() {
            debug!("No pending outbox entries");
            return Ok(report);
        }

        for entry in entries {
            match self.deliver(&entry) {
                Ok(()) => {
                    outbox.mark_delivered(&entry.id).await?;
                    report.delivered += 1;
                }
                Err(reason) => {
                    warn!(id = %entry.id, error = %reason, "Outbox delivery failed");
                    if let Err(e) = outbox.mark_failed(&entry.id, &reason).await {
                        error!(?e, id = %entry.id, "Failed to record delivery failure");
                    }
                    report.failed += 1;
                }
            }
        }

        info!(
            delivered = report.delivered,
            failed = report.failed,
            skipped = report.skipped,
            "Outbox relay pass finished"
        );
        Ok(report)
    }

    fn deliver(&self, entry: &OutboxEntry) -> Result<(), String> {
        let event = entry.event().map_err(|e| e.to_string())?;
        self.sink.deliver(&event)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
