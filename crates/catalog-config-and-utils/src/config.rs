//! Configuration management for the catalog service.
//!
//! Configuration is loaded once at startup from `~/.catalog/config.json`
//! (every field optional), then selected values are overridden from the
//! environment. The resulting [`Config`] is passed by value into the
//! components that need it; nothing reads it globally afterwards.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default broker topic for product events.
pub const DEFAULT_OUTBOX_TOPIC: &str = "product-events";
/// Default envelope `source` attribute.
pub const DEFAULT_EVENT_SOURCE: &str = "/catalog/products";
/// Default relay poll interval.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
/// Default publish timeout.
pub const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 30;
/// Default retention window for processed outbox records.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;
/// Upper bound on the retention window (100 years).
pub const MAX_RETENTION_DAYS: u32 = 36_500;
/// Default sweeper schedule: every day at 03:00:00 UTC.
pub const DEFAULT_RETENTION_CRON: &str = "0 0 3 * * *";
/// Default Redis URL for the stream publisher.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Where outbox records are stored relative to products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStoreMode {
    /// Outbox table lives in the product database; one transaction covers
    /// both writes.
    #[default]
    Shared,
    /// Outbox table lives in its own database; the outbox append happens
    /// after the entity commit and may be lost if it fails.
    Separate,
}

impl OutboxStoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Separate => "separate",
        }
    }
}

/// Which Event Publisher adapter the relay uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    /// Log every event and acknowledge it.
    #[default]
    Log,
    /// XADD to a Redis stream named after the topic.
    Redis,
    /// POST the envelope to an HTTP endpoint.
    Http,
}

/// Outbox writer and relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboxSettings {
    /// When false, mutations write no outbox records and the relay is not
    /// started.
    pub enabled: bool,
    pub store: OutboxStoreMode,
    /// Broker topic the relay publishes to.
    pub topic: String,
    /// Envelope `source` attribute.
    pub event_source: String,
    pub poll_interval_secs: u64,
    pub publish_timeout_secs: u64,
    /// Maximum records scanned per relay pass; unlimited when absent.
    pub batch_size: Option<usize>,
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            store: OutboxStoreMode::Shared,
            topic: DEFAULT_OUTBOX_TOPIC.to_string(),
            event_source: DEFAULT_EVENT_SOURCE.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            publish_timeout_secs: DEFAULT_PUBLISH_TIMEOUT_SECS,
            batch_size: None,
        }
    }
}

/// Retention sweeper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    pub retention_days: u32,
    /// Six or seven field cron expression (seconds first), evaluated in UTC.
    pub cron: String,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            cron: DEFAULT_RETENTION_CRON.to_string(),
        }
    }
}

/// Event Publisher adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherSettings {
    pub kind: PublisherKind,
    pub redis_url: String,
    /// Approximate MAXLEN applied on XADD; untrimmed when absent.
    pub stream_max_len: Option<usize>,
    /// Base URL for the HTTP publisher, e.g. `https://events.internal`.
    pub http_url: Option<String>,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            kind: PublisherKind::Log,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            stream_max_len: None,
            http_url: None,
        }
    }
}

/// Main service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub outbox: OutboxSettings,
    #[serde(default)]
    pub retention: RetentionSettings,
    #[serde(default)]
    pub publisher: PublisherSettings,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            outbox: OutboxSettings::default(),
            retention: RetentionSettings::default(),
            publisher: PublisherSettings::default(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file if present, fall back to
    /// defaults, apply environment overrides, and validate.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(level) = get("CATALOG_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(enabled) = get("CATALOG_OUTBOX_ENABLED") {
            match enabled.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.outbox.enabled = true,
                "0" | "false" | "no" | "off" => self.outbox.enabled = false,
                other => tracing::warn!(value = %other, "Ignoring unrecognized CATALOG_OUTBOX_ENABLED"),
            }
        }
        if let Some(topic) = get("CATALOG_OUTBOX_TOPIC") {
            self.outbox.topic = topic;
        }
        if let Some(url) = get("REDIS_URL") {
            self.publisher.redis_url = url;
        }
        if let Some(url) = get("CATALOG_PUBLISHER_HTTP_URL") {
            self.publisher.http_url = Some(url);
        }
    }

    /// Reject configurations the relay and sweeper cannot run with.
    ///
    /// The cron expression is checked by the scheduler, which owns the
    /// parser.
    pub fn validate(&self) -> CoreResult<()> {
        if self.outbox.topic.trim().is_empty() {
            return Err(CoreError::Config("outbox.topic must not be empty".to_string()));
        }
        if self.outbox.poll_interval_secs == 0 {
            return Err(CoreError::Config(
                "outbox.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.outbox.publish_timeout_secs == 0 {
            return Err(CoreError::Config(
                "outbox.publish_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.outbox.batch_size == Some(0) {
            return Err(CoreError::Config(
                "outbox.batch_size must be greater than zero when set".to_string(),
            ));
        }
        if self.retention.retention_days == 0 {
            return Err(CoreError::Config(
                "retention.retention_days must be greater than zero".to_string(),
            ));
        }
        if self.retention.retention_days > MAX_RETENTION_DAYS {
            return Err(CoreError::Config(format!(
                "retention.retention_days must be at most {}",
                MAX_RETENTION_DAYS
            )));
        }
        if self.publisher.kind == PublisherKind::Http && self.publisher.http_url.is_none() {
            return Err(CoreError::Config(
                "publisher.http_url is required when publisher.kind is \"http\"".to_string(),
            ));
        }
        Ok(())
    }
}
