//! Event publisher selection.

use catalog_config_and_utils::{PublisherKind, PublisherSettings};
use catalog_outbox::{
    EventPublisher, HttpPublisher, HttpPublisherConfig, LogPublisher, OutboxError, OutboxResult,
    RedisPublisherConfig, RedisStreamPublisher,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the configured publisher adapter.
pub async fn build_publisher(
    settings: &PublisherSettings,
    timeout: Duration,
) -> OutboxResult<Arc<dyn EventPublisher>> {
    let publisher: Arc<dyn EventPublisher> = match settings.kind {
        PublisherKind::Log => Arc::new(LogPublisher),
        PublisherKind::Redis => Arc::new(
            RedisStreamPublisher::connect(RedisPublisherConfig {
                redis_url: settings.redis_url.clone(),
                stream_max_len: settings.stream_max_len,
                timeout,
            })
            .await?,
        ),
        PublisherKind::Http => {
            let base_url = settings.http_url.clone().ok_or_else(|| {
                OutboxError::Config("publisher.http_url is required for the http publisher".into())
            })?;
            Arc::new(HttpPublisher::new(HttpPublisherConfig {
                base_url,
                timeout_secs: timeout.as_secs().max(1),
            })?)
        }
    };

    info!(publisher = publisher.name(), "Event publisher ready");
    Ok(publisher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_is_log_publisher() {
        let publisher = build_publisher(&PublisherSettings::default(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(publisher.name(), "log");
    }

    #[tokio::test]
    async fn test_http_requires_url() {
        let settings = PublisherSettings {
            kind: PublisherKind::Http,
            ..Default::default()
        };
        let err = build_publisher(&settings, Duration::from_secs(1)).await.err().unwrap();
        assert!(matches!(err, OutboxError::Config(_)));

        let settings = PublisherSettings {
            kind: PublisherKind::Http,
            http_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let publisher = build_publisher(&settings, Duration::from_secs(1)).await.unwrap();
        assert_eq!(publisher.name(), "http");
    }
}
