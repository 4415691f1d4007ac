//! Database model types.

use crate::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Non-negative monetary amount with two decimal places, held in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    /// Build a price from minor units (cents). Negative amounts are rejected.
    pub fn from_cents(cents: i64) -> Option<Self> {
        (cents >= 0).then_some(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Parse decimal text such as `"12"`, `"12.5"` or `"12.50"`.
    pub fn parse(s: &str) -> DatabaseResult<Self> {
        let invalid = || DatabaseError::InvalidData(format!("Invalid price: {:?}", s));
        let s = s.trim();
        if s.starts_with('-') {
            return Err(DatabaseError::InvalidData(format!(
                "Price must not be negative: {}",
                s
            )));
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty()
            || fraction.len() > 2
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Price::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Price,
    pub brand: Option<String>,
    pub sku: String,
    pub specifications: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, +1 on every successful update.
    pub version: i64,
}

/// New product for insertion.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Price,
    pub brand: Option<String>,
    pub sku: String,
    pub specifications: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub created_by: Option<String>,
}

/// Outbox record - one domain event awaiting (or done with) relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxRecord {
    pub id: String,
    pub aggregate_id: String,
    pub event_type: String,
    /// Serialized event envelope (JSON).
    pub event_payload: String,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// New outbox record for insertion.
#[derive(Debug, Clone)]
pub struct NewOutboxRecord {
    pub id: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub event_payload: String,
    pub created_at: DateTime<Utc>,
}

impl NewOutboxRecord {
    /// New record with a fresh UUID, stamped now.
    pub fn new(
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        event_payload: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            aggregate_id: aggregate_id.into(),
            event_type: event_type.into(),
            event_payload: event_payload.into(),
            created_at: Utc::now(),
        }
    }
}
