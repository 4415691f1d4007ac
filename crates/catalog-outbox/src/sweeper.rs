//! Retention sweeper: deletes processed outbox records past the retention window.

use crate::{OutboxError, OutboxResult};
use catalog_database::{queries, AsyncDatabase};
use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use std::str::FromStr;
use tracing::{debug, info};

/// Daily at 03:00 UTC (`sec min hour dom month dow`).
pub const DEFAULT_RETENTION_CRON: &str = "0 0 3 * * *";
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Retention configuration.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub retention_days: u32,
    pub cron: String,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            cron: DEFAULT_RETENTION_CRON.to_string(),
        }
    }
}

/// Subtract `window` from `now` without overflowing.
pub fn retention_cutoff(now: DateTime<Utc>, window: Duration) -> OutboxResult<DateTime<Utc>> {
    now.checked_sub_signed(window).ok_or_else(|| {
        OutboxError::Config(format!(
            "retention window of {} days reaches past the earliest representable time",
            window.num_days()
        ))
    })
}

pub struct RetentionSweeper {
    db: AsyncDatabase,
    retention: Duration,
    schedule: Schedule,
}

impl RetentionSweeper {
    /// Build a sweeper; fails on an unparseable cron expression.
    pub fn new(db: AsyncDatabase, config: &RetentionConfig) -> OutboxResult<Self> {
        let schedule = Schedule::from_str(&config.cron).map_err(|e| {
            OutboxError::Schedule(format!("invalid cron expression {:?}: {}", config.cron, e))
        })?;

        Ok(Self {
            db,
            retention: Duration::days(i64::from(config.retention_days)),
            schedule,
        })
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Delete processed records created before `older_than`.
    ///
    /// Unprocessed records are never removed regardless of age.
    pub async fn cleanup(&self, older_than: DateTime<Utc>) -> OutboxResult<usize> {
        let deleted = self
            .db
            .call(move |conn| queries::delete_processed_older_than(conn, older_than))
            .await?;

        if deleted > 0 {
            info!(deleted, older_than = %older_than, "Outbox retention cleanup");
        } else {
            debug!(older_than = %older_than, "Outbox retention cleanup: nothing to delete");
        }
        Ok(deleted)
    }

    /// Run one sweep relative to `now`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> OutboxResult<usize> {
        self.cleanup(self.cutoff(now)?).await
    }

    /// `now` minus the retention window; errors when that leaves chrono's range.
    pub fn cutoff(&self, now: DateTime<Utc>) -> OutboxResult<DateTime<Utc>> {
        retention_cutoff(now, self.retention)
    }

    /// Next scheduled sweep strictly after `after`.
    pub fn next_run_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}
