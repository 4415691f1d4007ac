//! Long-running server mode.

use crate::app::publisher::build_publisher;
use crate::app::CatalogState;
use catalog_config_and_utils::{Config, Paths};
use catalog_outbox::{OutboxRelay, OutboxScheduler, RetentionSweeper};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run the relay and sweeper loops until Ctrl-C.
pub async fn run_server(config: Config, paths: Paths) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting catalog daemon");
    let state = CatalogState::open(config, paths).await?;

    info!(
        enabled = state.config.outbox.enabled,
        store = state.config.outbox.store.as_str(),
        topic = %state.config.outbox.topic,
        poll_interval_secs = state.config.outbox.poll_interval_secs,
        retention_days = state.config.retention.retention_days,
        retention_cron = %state.config.retention.cron,
        "Configuration loaded"
    );

    if !state.config.outbox.enabled {
        warn!("Outbox disabled; relay and sweeper not started");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
        state.close().await;
        return Ok(());
    }

    let publisher = build_publisher(
        &state.config.publisher,
        Duration::from_secs(state.config.outbox.publish_timeout_secs),
    )
    .await
    .map_err(|e| format!("Failed to initialize event publisher: {}", e))?;

    let relay = Arc::new(OutboxRelay::new(
        state.outbox_db.clone(),
        publisher,
        state.relay_config(),
    ));
    let sweeper = Arc::new(
        RetentionSweeper::new(state.outbox_db.clone(), &state.retention_config())
            .map_err(|e| format!("Failed to initialize retention sweeper: {}", e))?,
    );

    let scheduler = OutboxScheduler::start(relay, Some(sweeper), state.scheduler_config())
        .map_err(|e| format!("Failed to start outbox scheduler: {}", e))?;
    info!("Catalog daemon running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    scheduler.shutdown().await;
    state.close().await;
    info!("Catalog daemon stopped");
    Ok(())
}
