//! Outbox writer.
//!
//! Appends outbox records on the caller's connection. Called from inside an
//! `AsyncDatabase::transaction` closure, the append shares the entity
//! mutation's transaction: an error here rolls back both.

use crate::{DomainEvent, EnvelopeSource, EventEnvelope, OutboxResult};
use catalog_database::{queries, Connection, NewOutboxRecord, OutboxRecord};
use tracing::debug;

/// Builds envelopes and appends them to `outbox_events`.
#[derive(Debug, Clone, Default)]
pub struct OutboxWriter {
    source: EnvelopeSource,
}

impl OutboxWriter {
    pub fn new(source: EnvelopeSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &EnvelopeSource {
        &self.source
    }

    /// Append a pre-serialized envelope.
    ///
    /// The payload is validated but its business fields are not interpreted.
    /// Returns `InvalidPayload` for a document the relay could never publish.
    pub fn append(
        &self,
        conn: &Connection,
        aggregate_id: &str,
        event_type: &str,
        event_payload: &str,
    ) -> OutboxResult<OutboxRecord> {
        EventEnvelope::parse(event_payload)?;

        let record = queries::insert_outbox_record(
            conn,
            &NewOutboxRecord::new(aggregate_id, event_type, event_payload),
        )?;
        Ok(record)
    }

    /// Serialize a domain event and append it.
    pub fn append_event(
        &self,
        conn: &Connection,
        event: &DomainEvent,
    ) -> OutboxResult<OutboxRecord> {
        let envelope = EventEnvelope::from_event(event, &self.source)?;
        let payload = envelope.to_json()?;

        let record = self.append(conn, event.aggregate_id(), envelope.event_type.as_str(), &payload)?;
        debug!(
            event_id = %envelope.id,
            record_id = %record.id,
            aggregate_id = %record.aggregate_id,
            event_type = %record.event_type,
            "Domain event recorded in outbox"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutboxError;
    use catalog_database::run_migrations;
    use chrono::Utc;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn deleted(id: &str) -> DomainEvent {
        DomainEvent::ProductDeleted {
            id: id.to_string(),
            sku: "SKU-1".to_string(),
            deleted_at: Utc::now(),
        }
    }

    #[test]
    fn test_append_event_writes_unprocessed_record() {
        let conn = setup();
        let writer = OutboxWriter::default();

        let record = writer.append_event(&conn, &deleted("p-1")).unwrap();
        assert_eq!(record.aggregate_id, "p-1");
        assert_eq!(record.event_type, "ProductDeleted");
        assert!(!record.processed);

        let envelope = EventEnvelope::parse(&record.event_payload).unwrap();
        assert_eq!(envelope.subject, "p-1");
        assert_eq!(envelope.source, "/catalog/products");

        let stored = queries::get_outbox_record(&conn, &record.id).unwrap().unwrap();
        assert_eq!(stored.event_payload, record.event_payload);
    }

    #[test]
    fn test_append_rejects_invalid_payload() {
        let conn = setup();
        let writer = OutboxWriter::default();

        let err = writer
            .append(&conn, "p-1", "ProductCreated", "{\"hello\":1}")
            .unwrap_err();
        assert!(matches!(err, OutboxError::InvalidPayload(_)));
        assert_eq!(queries::count_outbox_records(&conn, false).unwrap(), 0);
    }

    #[test]
    fn test_append_rolls_back_with_enclosing_transaction() {
        let mut conn = setup();
        let writer = OutboxWriter::new(EnvelopeSource::new("/tests"));

        {
            let tx = conn.transaction().unwrap();
            writer.append_event(&tx, &deleted("p-1")).unwrap();
            // Dropped without commit.
        }
        assert_eq!(queries::count_outbox_records(&conn, false).unwrap(), 0);

        let tx = conn.transaction().unwrap();
        writer.append_event(&tx, &deleted("p-2")).unwrap();
        tx.commit().unwrap();
        assert_eq!(queries::count_outbox_records(&conn, false).unwrap(), 1);
    }
}
