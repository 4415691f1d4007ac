//! Outbox error types.

use std::time::Duration;
use thiserror::Error;

/// Outbox error type.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] catalog_database::DatabaseError),

    /// Payload is not a usable event envelope (poison record).
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Broker rejected the event.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Broker did not acknowledge in time.
    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),

    /// Redis error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cron expression error
    #[error("Schedule error: {0}")]
    Schedule(String),

    /// Invalid outbox configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OutboxError {
    /// Whether this error came from the broker side of a publish.
    pub fn is_publish_failure(&self) -> bool {
        matches!(
            self,
            OutboxError::Publish(_)
                | OutboxError::Timeout(_)
                | OutboxError::Redis(_)
                | OutboxError::Http(_)
        )
    }
}

impl From<cron::error::Error> for OutboxError {
    fn from(e: cron::error::Error) -> Self {
        OutboxError::Schedule(e.to_string())
    }
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
