//! Poison records: skipped every pass, never published, never block others.

use super::harness::{MockPublisher, TestHarness};
use chrono::{Duration, Utc};

#[tokio::test]
async fn invalid_payload_is_skipped_and_others_still_processed() {
    let harness = TestHarness::new().await;
    let base = Utc::now() - Duration::minutes(1);
    let good_before = harness.append_at("p-0", base).await;
    let poison = harness
        .insert_raw("p-bad", "{not json", base + Duration::seconds(1))
        .await;
    let good_after = harness.append_at("p-2", base + Duration::seconds(2)).await;

    let publisher = MockPublisher::acking();
    let relay = harness.relay(publisher.clone());
    let report = relay.run_once().await.unwrap();

    assert_eq!(report.scanned, 3);
    assert_eq!(report.published, 2);
    assert_eq!(report.invalid, 1);
    assert_eq!(publisher.published_subjects(), vec!["p-0", "p-2"]);

    assert!(harness.record(&good_before.id).await.processed);
    assert!(harness.record(&good_after.id).await.processed);
    let poison = harness.record(&poison.id).await;
    assert!(!poison.processed);
    assert!(poison.processed_at.is_none());
}

#[tokio::test]
async fn poison_record_stays_put_across_passes() {
    let harness = TestHarness::new().await;
    harness.insert_raw("p-bad", "   ", Utc::now()).await;
    harness
        .insert_raw("p-obj", r#"{"type":"ProductCreated"}"#, Utc::now())
        .await;

    let publisher = MockPublisher::acking();
    let relay = harness.relay(publisher.clone());

    for _ in 0..3 {
        let report = relay.run_once().await.unwrap();
        assert_eq!(report.invalid, 2);
    }

    assert_eq!(publisher.attempts(), 0);
    assert_eq!(harness.unprocessed_count().await, 2);
}
