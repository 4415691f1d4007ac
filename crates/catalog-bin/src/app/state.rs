//! Shared application state: open stores and the product service.

use catalog_config_and_utils::{Config, OutboxStoreMode, Paths};
use catalog_database::AsyncDatabase;
use catalog_outbox::{
    EnvelopeSource, OutboxWriter, RelayConfig, RetentionConfig, SchedulerConfig,
};
use catalog_service::{OutboxMode, ProductService};
use std::time::Duration;
use tracing::{info, warn};

/// Everything a command needs, opened once per process.
pub struct CatalogState {
    pub config: Config,
    pub entity_db: AsyncDatabase,
    /// Database holding `outbox_events`; the entity database in shared mode.
    pub outbox_db: AsyncDatabase,
    pub service: ProductService,
}

impl CatalogState {
    pub async fn open(config: Config, paths: Paths) -> Result<Self, Box<dyn std::error::Error>> {
        let entity_db = AsyncDatabase::open(&paths.database_file())
            .await
            .map_err(|e| format!("Failed to open catalog database: {}", e))?;

        let outbox_db = match config.outbox.store {
            OutboxStoreMode::Shared => entity_db.clone(),
            OutboxStoreMode::Separate => AsyncDatabase::open(&paths.outbox_database_file())
                .await
                .map_err(|e| format!("Failed to open outbox database: {}", e))?,
        };

        let mode = if !config.outbox.enabled {
            warn!("Outbox disabled by configuration; mutations will not emit events");
            OutboxMode::Disabled
        } else {
            match config.outbox.store {
                OutboxStoreMode::Shared => OutboxMode::Shared,
                OutboxStoreMode::Separate => {
                    warn!("Outbox in a separate store; events may be lost if the append fails");
                    OutboxMode::Separate(outbox_db.clone())
                }
            }
        };

        let writer = OutboxWriter::new(EnvelopeSource::new(config.outbox.event_source.clone()));
        let service = ProductService::new(entity_db.clone(), writer, mode);

        info!(
            database = %entity_db.path(),
            outbox_database = %outbox_db.path(),
            store = config.outbox.store.as_str(),
            "Catalog state initialized"
        );

        Ok(Self {
            config,
            entity_db,
            outbox_db,
            service,
        })
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            topic: self.config.outbox.topic.clone(),
            batch_size: self.config.outbox.batch_size,
            publish_timeout: Duration::from_secs(self.config.outbox.publish_timeout_secs),
        }
    }

    pub fn retention_config(&self) -> RetentionConfig {
        RetentionConfig {
            retention_days: self.config.retention.retention_days,
            cron: self.config.retention.cron.clone(),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: Duration::from_secs(self.config.outbox.poll_interval_secs),
        }
    }

    /// Close the databases, logging rather than failing.
    pub async fn close(self) {
        let separate = self.config.outbox.store == OutboxStoreMode::Separate;
        if separate {
            if let Err(e) = self.outbox_db.close().await {
                warn!(error = %e, "Failed to close outbox database");
            }
        }
        if let Err(e) = self.entity_db.close().await {
            warn!(error = %e, "Failed to close catalog database");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_shared_store_uses_one_database() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let state = CatalogState::open(Config::default(), paths.clone()).await.unwrap();

        assert_eq!(state.outbox_db.path(), state.entity_db.path());
        assert_eq!(state.service.outbox_mode().as_str(), "shared");
        assert!(!paths.outbox_database_file().exists());
        state.close().await;
    }

    #[tokio::test]
    async fn test_separate_store_opens_outbox_database() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let mut config = Config::default();
        config.outbox.store = OutboxStoreMode::Separate;

        let state = CatalogState::open(config, paths.clone()).await.unwrap();

        assert_eq!(state.service.outbox_mode().as_str(), "separate");
        assert!(paths.outbox_database_file().exists());
        state.close().await;
    }

    #[tokio::test]
    async fn test_disabled_outbox() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.outbox.enabled = false;

        let state = CatalogState::open(config, Paths::with_base_dir(dir.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(state.service.outbox_mode().as_str(), "disabled");
    }

    #[tokio::test]
    async fn test_component_configs_follow_settings() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.outbox.topic = "catalog.v1".to_string();
        config.outbox.batch_size = Some(50);
        config.outbox.poll_interval_secs = 3;
        config.retention.retention_days = 14;

        let state = CatalogState::open(config, Paths::with_base_dir(dir.path().to_path_buf()))
            .await
            .unwrap();

        let relay = state.relay_config();
        assert_eq!(relay.topic, "catalog.v1");
        assert_eq!(relay.batch_size, Some(50));
        assert_eq!(relay.publish_timeout, Duration::from_secs(30));
        assert_eq!(state.scheduler_config().poll_interval, Duration::from_secs(3));
        assert_eq!(state.retention_config().retention_days, 14);
    }
}
