//! Redis Streams publisher.
//!
//! Each event becomes one stream entry on the key named by the topic:
//! `XADD <topic> [MAXLEN ~ n] * event_id <id> event_type <type> payload <json>`.

use crate::{EventEnvelope, EventPublisher, OutboxError, OutboxResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Redis publisher configuration.
#[derive(Debug, Clone)]
pub struct RedisPublisherConfig {
    pub redis_url: String,
    /// Approximate stream length cap (`MAXLEN ~`); `None` keeps everything.
    pub stream_max_len: Option<usize>,
    /// Upper bound on a single XADD round trip.
    pub timeout: Duration,
}

impl Default for RedisPublisherConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            stream_max_len: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Publishes envelopes to Redis Streams.
pub struct RedisStreamPublisher {
    conn: MultiplexedConnection,
    config: RedisPublisherConfig,
}

impl RedisStreamPublisher {
    /// Connect to Redis.
    pub async fn connect(config: RedisPublisherConfig) -> OutboxResult<Self> {
        let client = Client::open(config.redis_url.as_str())?;
        let conn = tokio::time::timeout(config.timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| OutboxError::Timeout(config.timeout))??;

        info!(max_len = ?config.stream_max_len, "Connected to Redis stream publisher");
        Ok(Self { conn, config })
    }

    fn xadd(&self, topic: &str, envelope: &EventEnvelope, payload: &str) -> redis::Cmd {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(topic);
        if let Some(max_len) = self.config.stream_max_len {
            cmd.arg("MAXLEN").arg("~").arg(max_len);
        }
        cmd.arg("*");
        for (field, value) in stream_fields(envelope, payload) {
            cmd.arg(field).arg(value);
        }
        cmd
    }
}

/// Field/value pairs stored in each stream entry.
pub(crate) fn stream_fields<'a>(
    envelope: &'a EventEnvelope,
    payload: &'a str,
) -> [(&'static str, &'a str); 3] {
    [
        ("event_id", envelope.id.as_str()),
        ("event_type", envelope.event_type.as_str()),
        ("payload", payload),
    ]
}

#[async_trait]
impl EventPublisher for RedisStreamPublisher {
    async fn publish(&self, topic: &str, envelope: &EventEnvelope) -> OutboxResult<()> {
        let payload = envelope.to_json()?;
        let cmd = self.xadd(topic, envelope, &payload);
        let mut conn = self.conn.clone();

        let entry_id: String = tokio::time::timeout(self.config.timeout, cmd.query_async(&mut conn))
            .await
            .map_err(|_| OutboxError::Timeout(self.config.timeout))??;

        debug!(
            stream = %topic,
            entry_id = %entry_id,
            event_id = %envelope.id,
            "Event appended to stream"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
