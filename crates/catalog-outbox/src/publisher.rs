//! Event publisher port and the logging adapter.

use crate::{EventEnvelope, OutboxResult};
use async_trait::async_trait;
use tracing::info;

/// Hands an event to the message broker.
///
/// `Ok(())` means the broker acknowledged the event. Any error (rejection,
/// transport failure) leaves the outbox record unprocessed for the next pass.
/// Implementations may see the same event more than once.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, envelope: &EventEnvelope) -> OutboxResult<()>;

    /// Short adapter name for logs.
    fn name(&self) -> &'static str;
}

/// Publisher that logs each event and acknowledges it.
#[derive(Debug, Clone, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, topic: &str, envelope: &EventEnvelope) -> OutboxResult<()> {
        info!(
            topic = %topic,
            event_id = %envelope.id,
            event_type = %envelope.event_type,
            subject = %envelope.subject,
            "Event published"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
