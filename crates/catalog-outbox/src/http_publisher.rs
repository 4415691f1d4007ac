//! HTTP publisher for brokers fronted by a REST gateway.
//!
//! Sends one structured-mode CloudEvent per request:
//! `POST {base_url}/topics/{topic}` with `Content-Type: application/cloudevents+json`.
//! Any 2xx is an acknowledgment.

use crate::{EventEnvelope, EventPublisher, OutboxError, OutboxResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const CLOUDEVENTS_CONTENT_TYPE: &str = "application/cloudevents+json";

/// HTTP publisher configuration.
#[derive(Debug, Clone)]
pub struct HttpPublisherConfig {
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpPublisherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Publishes envelopes over HTTP.
pub struct HttpPublisher {
    config: HttpPublisherConfig,
    client: Client,
}

impl HttpPublisher {
    pub fn new(config: HttpPublisherConfig) -> OutboxResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(OutboxError::Config("HTTP publisher base_url is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/topics/{}", self.config.base_url.trim_end_matches('/'), topic)
    }
}

#[async_trait]
impl EventPublisher for HttpPublisher {
    async fn publish(&self, topic: &str, envelope: &EventEnvelope) -> OutboxResult<()> {
        let url = self.topic_url(topic);
        let body = serde_json::to_vec(envelope)?;

        debug!(url = %url, event_id = %envelope.id, "Posting event");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", CLOUDEVENTS_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OutboxError::Publish(format!("HTTP {}: {}", status, body)));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
