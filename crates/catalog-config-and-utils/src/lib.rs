//! Configuration, paths, and logging setup for the catalog service.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, OutboxSettings, OutboxStoreMode, PublisherKind, PublisherSettings, RetentionSettings,
    DEFAULT_EVENT_SOURCE, DEFAULT_LOG_LEVEL, DEFAULT_OUTBOX_TOPIC, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_RETENTION_CRON, DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, parse_level};
pub use paths::Paths;
