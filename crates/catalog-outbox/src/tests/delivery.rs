//! Delivery outcomes of a relay pass.

use super::harness::{MockPublisher, PublisherResponse, TestHarness};
use crate::RelayReport;

#[tokio::test]
async fn empty_outbox_is_a_no_op() {
    let harness = TestHarness::new().await;
    let publisher = MockPublisher::acking();
    let relay = harness.relay(publisher.clone());

    let report = relay.run_once().await.unwrap();

    assert_eq!(report, RelayReport::default());
    assert!(report.is_empty());
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn all_records_published_and_marked() {
    let harness = TestHarness::new().await;
    let records = harness.seed(5).await;
    let publisher = MockPublisher::acking();
    let relay = harness.relay(publisher.clone());

    let report = relay.run_once().await.unwrap();

    assert_eq!(report.scanned, 5);
    assert_eq!(report.published, 5);
    assert_eq!(report.failed, 0);
    assert_eq!(publisher.attempts(), 5);
    assert!(publisher
        .published()
        .iter()
        .all(|p| p.topic == "product-events"));

    for record in &records {
        let stored = harness.record(&record.id).await;
        assert!(stored.processed);
        assert!(stored.processed_at.is_some());
    }
    assert_eq!(harness.unprocessed_count().await, 0);
}

#[tokio::test]
async fn failing_publisher_leaves_everything_unprocessed() {
    let harness = TestHarness::new().await;
    let records = harness.seed(3).await;
    let publisher = MockPublisher::new(PublisherResponse::Reject);
    let relay = harness.relay(publisher.clone());

    let report = relay.run_once().await.unwrap();

    assert_eq!(report.failed, 3);
    assert_eq!(report.published, 0);
    // A failure never stops later records from being attempted.
    assert_eq!(publisher.attempts(), 3);
    for record in &records {
        let stored = harness.record(&record.id).await;
        assert!(!stored.processed);
        assert!(stored.processed_at.is_none());
    }
}

#[tokio::test]
async fn mixed_outcomes_only_transition_successes() {
    let harness = TestHarness::new().await;
    let records = harness.seed(4).await;
    let publisher = MockPublisher::acking();
    publisher.respond_for("p-1", PublisherResponse::Reject);
    publisher.respond_for("p-3", PublisherResponse::Reject);
    let relay = harness.relay(publisher.clone());

    let report = relay.run_once().await.unwrap();

    assert_eq!(report.published, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(publisher.published_subjects(), vec!["p-0", "p-2"]);

    let processed: Vec<bool> = {
        let mut v = Vec::new();
        for record in &records {
            v.push(harness.record(&record.id).await.processed);
        }
        v
    };
    assert_eq!(processed, vec![true, false, true, false]);
}

#[tokio::test]
async fn failed_records_are_retried_next_pass() {
    let harness = TestHarness::new().await;
    harness.seed(2).await;
    let publisher = MockPublisher::new(PublisherResponse::Reject);
    let relay = harness.relay(publisher.clone());

    relay.run_once().await.unwrap();
    assert_eq!(harness.unprocessed_count().await, 2);

    publisher.set_default_response(PublisherResponse::Ack);
    let report = relay.run_once().await.unwrap();

    assert_eq!(report.published, 2);
    assert_eq!(harness.unprocessed_count().await, 0);
    assert_eq!(publisher.attempts(), 4);
}

#[tokio::test]
async fn processed_records_are_never_republished() {
    let harness = TestHarness::new().await;
    let records = harness.seed(3).await;
    let publisher = MockPublisher::acking();
    let relay = harness.relay(publisher.clone());

    relay.run_once().await.unwrap();
    let first_processed_at = harness.record(&records[0].id).await.processed_at;

    let report = relay.run_once().await.unwrap();
    relay.run_once().await.unwrap();

    assert!(report.is_empty());
    assert_eq!(publisher.attempts(), 3);
    assert_eq!(
        harness.record(&records[0].id).await.processed_at,
        first_processed_at
    );
}

#[tokio::test]
async fn writer_appended_events_are_relayed_with_their_envelope() {
    let harness = TestHarness::new().await;
    let record = harness.append("p-42").await;
    let publisher = MockPublisher::acking();
    let relay = harness.relay(publisher.clone());

    relay.run_once().await.unwrap();

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    let envelope = &published[0].envelope;
    assert_eq!(envelope.subject, "p-42");
    assert_eq!(envelope.event_type, record.event_type);
    assert_eq!(envelope.source, "/tests/catalog");
    assert_eq!(envelope.data["sku"], "SKU-p-42");
}

#[tokio::test]
async fn extension_attributes_reach_the_publisher() {
    let harness = TestHarness::new().await;
    let writer = harness.writer.clone();
    let payload = r#"{"specversion":"1.0","id":"e-1","type":"ProductCreated","source":"/catalog/products","subject":"p-1","time":"2026-01-15T10:30:00Z","datacontenttype":"application/json","traceparent":"00-abc-def-01","data":{"a":1}}"#;
    harness
        .db
        .call(move |conn| {
            writer
                .append(conn, "p-1", "ProductCreated", payload)
                .map_err(|e| catalog_database::DatabaseError::InvalidData(e.to_string()))
        })
        .await
        .unwrap();

    let publisher = MockPublisher::acking();
    let report = harness.relay(publisher.clone()).run_once().await.unwrap();
    assert_eq!(report.published, 1);

    let published = publisher.published();
    let envelope = &published[0].envelope;
    assert_eq!(envelope.extensions["traceparent"], "00-abc-def-01");

    let wire: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
    assert_eq!(wire["traceparent"], "00-abc-def-01");
    assert_eq!(wire["id"], "e-1");
    assert_eq!(wire["data"]["a"], 1);
}
