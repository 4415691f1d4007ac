//! Outbox relay.
//!
//! One pass reads every unprocessed record (oldest first), publishes each one
//! independently, and marks the acknowledged ones processed. Records that
//! fail stay unprocessed and are picked up again by the next pass, so
//! delivery is at-least-once. Records whose payload can never be published
//! (poison) are logged and skipped on every pass without blocking others.

use crate::{EventEnvelope, EventPublisher, OutboxError, OutboxResult};
use catalog_database::{queries, AsyncDatabase, OutboxRecord};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub const DEFAULT_TOPIC: &str = "product-events";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Topic (stream / route) every event is published to.
    pub topic: String,
    /// Upper bound on records scanned per pass. `None` drains everything.
    pub batch_size: Option<usize>,
    /// Upper bound on a single publish call.
    pub publish_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            batch_size: None,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}

/// Counters for one relay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelayReport {
    pub scanned: usize,
    pub published: usize,
    pub failed: usize,
    pub invalid: usize,
}

impl RelayReport {
    pub fn is_empty(&self) -> bool {
        self.scanned == 0
    }
}

enum Outcome {
    Published,
    Failed,
    Invalid,
}

/// Polls the outbox and forwards records to an [`EventPublisher`].
pub struct OutboxRelay {
    db: AsyncDatabase,
    publisher: Arc<dyn EventPublisher>,
    config: RelayConfig,
    /// Held for the duration of a pass; a second caller backs off.
    pass_lock: Mutex<()>,
}

impl OutboxRelay {
    pub fn new(db: AsyncDatabase, publisher: Arc<dyn EventPublisher>, config: RelayConfig) -> Self {
        Self {
            db,
            publisher,
            config,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Run one relay pass.
    ///
    /// Only a failure to read the outbox aborts the pass. Per-record failures
    /// are counted in the report.
    pub async fn run_once(&self) -> OutboxResult<RelayReport> {
        let _guard = match self.pass_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Relay pass already running, skipping");
                return Ok(RelayReport::default());
            }
        };

        let limit = self.config.batch_size;
        let records = self
            .db
            .call(move |conn| queries::find_unprocessed_ordered_by_created_at(conn, limit))
            .await?;

        let mut report = RelayReport::default();
        if records.is_empty() {
            debug!("No unprocessed outbox records");
            return Ok(report);
        }

        for record in &records {
            report.scanned += 1;
            match self.relay_record(record).await {
                Outcome::Published => report.published += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Invalid => report.invalid += 1,
            }
        }

        info!(
            publisher = self.publisher.name(),
            scanned = report.scanned,
            published = report.published,
            failed = report.failed,
            invalid = report.invalid,
            "Relay pass complete"
        );
        Ok(report)
    }

    async fn relay_record(&self, record: &OutboxRecord) -> Outcome {
        let envelope = match EventEnvelope::parse(&record.event_payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    record_id = %record.id,
                    aggregate_id = %record.aggregate_id,
                    event_type = %record.event_type,
                    error = %e,
                    "Skipping outbox record with invalid payload"
                );
                return Outcome::Invalid;
            }
        };

        if let Err(e) = self.publish(&envelope).await {
            warn!(
                record_id = %record.id,
                event_id = %envelope.id,
                event_type = %record.event_type,
                error = %e,
                "Publish failed, will retry next pass"
            );
            return Outcome::Failed;
        }

        let id = record.id.clone();
        match self
            .db
            .call(move |conn| queries::mark_processed(conn, &id, Utc::now()))
            .await
        {
            Ok(true) => {
                debug!(record_id = %record.id, event_id = %envelope.id, "Outbox record processed");
                Outcome::Published
            }
            Ok(false) => {
                debug!(record_id = %record.id, "Outbox record already processed elsewhere");
                Outcome::Published
            }
            Err(e) => {
                error!(
                    record_id = %record.id,
                    event_id = %envelope.id,
                    error = %e,
                    "Published but failed to mark processed; event will be re-sent"
                );
                Outcome::Failed
            }
        }
    }

    async fn publish(&self, envelope: &EventEnvelope) -> OutboxResult<()> {
        let timeout = self.config.publish_timeout;
        tokio::time::timeout(timeout, self.publisher.publish(&self.config.topic, envelope))
            .await
            .map_err(|_| OutboxError::Timeout(timeout))?
    }
}
