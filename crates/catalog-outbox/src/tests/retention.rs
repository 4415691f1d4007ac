//! Retention sweeper behaviour.

use super::harness::TestHarness;
use crate::{retention_cutoff, OutboxError, RetentionConfig, RetentionSweeper};
use chrono::{Duration, TimeZone, Timelike, Utc};

fn sweeper(harness: &TestHarness) -> RetentionSweeper {
    RetentionSweeper::new(harness.db.clone(), &RetentionConfig::default()).unwrap()
}

#[tokio::test]
async fn cleanup_deletes_only_old_processed_records() {
    let harness = TestHarness::new().await;
    let now = Utc::now();
    let old = now - Duration::days(10);

    let old_done = harness.append_at("old-done", old).await;
    let old_pending = harness.append_at("old-pending", old).await;
    let fresh_done = harness.append_at("fresh-done", now - Duration::hours(1)).await;
    harness.mark_processed(&old_done.id, now).await;
    harness.mark_processed(&fresh_done.id, now).await;

    let deleted = sweeper(&harness).cleanup(now - Duration::days(7)).await.unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(harness.total_count().await, 2);
    let remaining_pending = harness.record(&old_pending.id).await;
    assert!(!remaining_pending.processed);
    harness.record(&fresh_done.id).await;
}

#[tokio::test]
async fn cleanup_on_empty_outbox_is_a_no_op() {
    let harness = TestHarness::new().await;
    let deleted = sweeper(&harness).cleanup(Utc::now()).await.unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn sweep_applies_retention_window() {
    let harness = TestHarness::new().await;
    let now = Utc::now();
    let eight_days = harness.append_at("eight", now - Duration::days(8)).await;
    let six_days = harness.append_at("six", now - Duration::days(6)).await;
    harness.mark_processed(&eight_days.id, now).await;
    harness.mark_processed(&six_days.id, now).await;

    let sweeper = sweeper(&harness);
    assert_eq!(sweeper.retention(), Duration::days(7));
    assert_eq!(sweeper.sweep(now).await.unwrap(), 1);
    assert_eq!(harness.total_count().await, 1);
}

#[tokio::test]
async fn invalid_cron_is_rejected() {
    let harness = TestHarness::new().await;
    let config = RetentionConfig {
        cron: "every day at three".to_string(),
        ..Default::default()
    };
    let err = RetentionSweeper::new(harness.db.clone(), &config).err().unwrap();
    assert!(matches!(err, OutboxError::Schedule(_)));
}

#[tokio::test]
async fn default_schedule_runs_daily_at_three_utc() {
    let harness = TestHarness::new().await;
    let sweeper = sweeper(&harness);

    let after = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
    let next = sweeper.next_run_after(after).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 11, 3, 0, 0).unwrap());

    let following = sweeper.next_run_after(next).unwrap();
    assert_eq!(following - next, Duration::days(1));
    assert_eq!(following.hour(), 3);
}

#[tokio::test]
async fn oversized_retention_window_errors_instead_of_panicking() {
    let harness = TestHarness::new().await;
    let now = Utc::now();
    let done = harness.append_at("old-done", now - Duration::days(30)).await;
    harness.mark_processed(&done.id, now).await;

    let config = RetentionConfig {
        retention_days: u32::MAX,
        ..Default::default()
    };
    let sweeper = RetentionSweeper::new(harness.db.clone(), &config).unwrap();

    let err = sweeper.sweep(now).await.unwrap_err();
    assert!(matches!(err, OutboxError::Config(_)));
    assert_eq!(harness.total_count().await, 1);
}

#[test]
fn retention_cutoff_subtracts_window() {
    let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
    assert_eq!(
        retention_cutoff(now, Duration::days(7)).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap()
    );
    assert!(retention_cutoff(now, Duration::days(i64::from(u32::MAX))).is_err());
}
