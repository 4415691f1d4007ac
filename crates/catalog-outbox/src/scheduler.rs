//! Background loops driving the relay and the retention sweeper.

use crate::{OutboxError, OutboxRelay, OutboxResult, RetentionSweeper, DEFAULT_POLL_INTERVAL};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Scheduler configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Handle to the running loops.
pub struct SchedulerHandle {
    relay_shutdown: oneshot::Sender<()>,
    relay_task: JoinHandle<()>,
    sweeper: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl SchedulerHandle {
    /// Signal both loops and wait for them to finish their current step.
    pub async fn shutdown(self) {
        let _ = self.relay_shutdown.send(());
        if let Some((tx, task)) = self.sweeper {
            let _ = tx.send(());
            if let Err(e) = task.await {
                warn!(error = %e, "Sweeper loop ended abnormally");
            }
        }
        if let Err(e) = self.relay_task.await {
            warn!(error = %e, "Relay loop ended abnormally");
        }
        info!("Outbox scheduler stopped");
    }
}

pub struct OutboxScheduler;

impl OutboxScheduler {
    /// Spawn the relay loop and, when a sweeper is given, the retention loop.
    ///
    /// A zero poll interval is rejected before anything is spawned.
    pub fn start(
        relay: Arc<OutboxRelay>,
        sweeper: Option<Arc<RetentionSweeper>>,
        config: SchedulerConfig,
    ) -> OutboxResult<SchedulerHandle> {
        if config.poll_interval.is_zero() {
            return Err(OutboxError::Config(
                "relay poll interval must be greater than zero".to_string(),
            ));
        }

        let (relay_shutdown, relay_rx) = oneshot::channel();
        let relay_task = tokio::spawn(run_relay_loop(relay, config.poll_interval, relay_rx));

        let sweeper = sweeper.map(|sweeper| {
            let (tx, rx) = oneshot::channel();
            (tx, tokio::spawn(run_sweeper_loop(sweeper, rx)))
        });

        info!(
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            retention = sweeper.is_some(),
            "Outbox scheduler started"
        );

        Ok(SchedulerHandle {
            relay_shutdown,
            relay_task,
            sweeper,
        })
    }
}

async fn run_relay_loop(
    relay: Arc<OutboxRelay>,
    poll_interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Relay loop received shutdown signal");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = relay.run_once().await {
                    warn!(error = %e, "Relay pass failed");
                }
            }
        }
    }
}

async fn run_sweeper_loop(sweeper: Arc<RetentionSweeper>, mut shutdown: oneshot::Receiver<()>) {
    loop {
        let now = Utc::now();
        let Some(next) = sweeper.next_run_after(now) else {
            warn!("Retention schedule has no upcoming runs; sweeper idle");
            let _ = (&mut shutdown).await;
            break;
        };
        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(next_run = %next, "Next retention sweep scheduled");

        tokio::select! {
            _ = &mut shutdown => {
                info!("Sweeper loop received shutdown signal");
                break;
            }
            _ = tokio::time::sleep(delay) => {
                if let Err(e) = sweeper.sweep(Utc::now()).await {
                    warn!(error = %e, "Retention sweep failed");
                }
            }
        }
    }
}
