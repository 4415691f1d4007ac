//! Transactional outbox for reliable event delivery.
//!
//! This crate provides:
//! - EventEnvelope / DomainEvent: the serialized form of product events
//! - OutboxWriter: appends events inside the caller's transaction
//! - EventPublisher: broker port, with log, Redis Streams and HTTP adapters
//! - OutboxRelay: polls unprocessed records and publishes them (at-least-once)
//! - RetentionSweeper: deletes processed records past the retention window
//! - OutboxScheduler: runs relay and sweeper as background tokio tasks

mod envelope;
mod error;
mod http_publisher;
mod publisher;
mod redis_publisher;
mod relay;
mod scheduler;
mod sweeper;
mod writer;

#[cfg(test)]
mod tests;

pub use envelope::{
    DomainEvent, EnvelopeSource, EventEnvelope, EventType, DATA_CONTENT_TYPE,
    DEFAULT_EVENT_SOURCE, SPEC_VERSION,
};
pub use error::{OutboxError, OutboxResult};
pub use http_publisher::{HttpPublisher, HttpPublisherConfig, CLOUDEVENTS_CONTENT_TYPE};
pub use publisher::{EventPublisher, LogPublisher};
pub use redis_publisher::{RedisPublisherConfig, RedisStreamPublisher};
pub use relay::{
    OutboxRelay, RelayConfig, RelayReport, DEFAULT_POLL_INTERVAL, DEFAULT_PUBLISH_TIMEOUT,
    DEFAULT_TOPIC,
};
pub use scheduler::{OutboxScheduler, SchedulerConfig, SchedulerHandle};
pub use sweeper::{
    retention_cutoff, RetentionConfig, RetentionSweeper, DEFAULT_RETENTION_CRON,
    DEFAULT_RETENTION_DAYS,
};
pub use writer::OutboxWriter;
