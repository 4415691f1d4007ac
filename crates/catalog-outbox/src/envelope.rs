//! Event envelope and domain events.
//!
//! Every outbox payload is a CloudEvents-style JSON document:
//!
//! ```json
//! {
//!   "specversion": "1.0",
//!   "id": "6f1c…",
//!   "type": "ProductCreated",
//!   "source": "/catalog/products",
//!   "subject": "<product id>",
//!   "time": "2026-01-15T10:30:00.000000Z",
//!   "datacontenttype": "application/json",
//!   "data": { … }
//! }
//! ```
//!
//! The relay only needs the envelope fields; `data` and any extension
//! attributes are opaque to it and published as stored.

use crate::{OutboxError, OutboxResult};
use catalog_database::Product;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const SPEC_VERSION: &str = "1.0";
pub const DATA_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_EVENT_SOURCE: &str = "/catalog/products";

/// Kind of domain event carried by an outbox record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductCreated => "ProductCreated",
            Self::ProductUpdated => "ProductUpdated",
            Self::ProductDeleted => "ProductDeleted",
        }
    }
}

impl FromStr for EventType {
    type Err = OutboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ProductCreated" => Ok(Self::ProductCreated),
            "ProductUpdated" => Ok(Self::ProductUpdated),
            "ProductDeleted" => Ok(Self::ProductDeleted),
            other => Err(OutboxError::InvalidPayload(format!(
                "unknown event type {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain event produced by a product mutation.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    ProductCreated(Product),
    ProductUpdated(Product),
    ProductDeleted {
        id: String,
        sku: String,
        deleted_at: DateTime<Utc>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeletedData<'a> {
    id: &'a str,
    sku: &'a str,
    deleted_at: String,
}

impl DomainEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::ProductCreated(_) => EventType::ProductCreated,
            Self::ProductUpdated(_) => EventType::ProductUpdated,
            Self::ProductDeleted { .. } => EventType::ProductDeleted,
        }
    }

    pub fn aggregate_id(&self) -> &str {
        match self {
            Self::ProductCreated(p) | Self::ProductUpdated(p) => &p.id,
            Self::ProductDeleted { id, .. } => id,
        }
    }

    /// The `data` member of the envelope.
    pub fn data(&self) -> OutboxResult<Value> {
        let value = match self {
            Self::ProductCreated(p) | Self::ProductUpdated(p) => serde_json::to_value(p)?,
            Self::ProductDeleted {
                id,
                sku,
                deleted_at,
            } => serde_json::to_value(DeletedData {
                id,
                sku,
                deleted_at: deleted_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            })?,
        };
        Ok(value)
    }
}

/// Value of the envelope's `source` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeSource(String);

impl EnvelopeSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EnvelopeSource {
    fn default() -> Self {
        Self(DEFAULT_EVENT_SOURCE.to_string())
    }
}

/// Serialized form of an outbox payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub specversion: String,
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub subject: String,
    pub time: DateTime<Utc>,
    pub datacontenttype: String,
    pub data: Value,
    /// Any further attributes (`traceparent`, …) carried through untouched.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl EventEnvelope {
    /// Wrap a domain event with a fresh event id, stamped now.
    pub fn from_event(event: &DomainEvent, source: &EnvelopeSource) -> OutboxResult<Self> {
        Ok(Self {
            specversion: SPEC_VERSION.to_string(),
            id: uuid::Uuid::new_v4().to_string(),
            event_type: event.event_type().as_str().to_string(),
            source: source.as_str().to_string(),
            subject: event.aggregate_id().to_string(),
            time: Utc::now(),
            datacontenttype: DATA_CONTENT_TYPE.to_string(),
            data: event.data()?,
            extensions: Map::new(),
        })
    }

    /// Parse and structurally validate a stored payload.
    ///
    /// Rejects blank text, non-JSON, non-object documents, and documents
    /// missing any of `specversion`, `id`, `type`, `source`, `time` (as
    /// non-empty strings) or `data`.
    pub fn parse(payload: &str) -> OutboxResult<Self> {
        if payload.trim().is_empty() {
            return Err(OutboxError::InvalidPayload("payload is empty".to_string()));
        }

        let value: Value = serde_json::from_str(payload)
            .map_err(|e| OutboxError::InvalidPayload(format!("payload is not JSON: {}", e)))?;

        let object = value
            .as_object()
            .ok_or_else(|| OutboxError::InvalidPayload("payload is not a JSON object".to_string()))?;

        for field in ["specversion", "id", "type", "source", "time"] {
            match object.get(field).and_then(Value::as_str) {
                Some(s) if !s.trim().is_empty() => {}
                _ => {
                    return Err(OutboxError::InvalidPayload(format!(
                        "missing envelope field `{}`",
                        field
                    )))
                }
            }
        }
        if !object.contains_key("data") {
            return Err(OutboxError::InvalidPayload(
                "missing envelope field `data`".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| OutboxError::InvalidPayload(format!("malformed envelope: {}", e)))
    }

    pub fn to_json(&self) -> OutboxResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
