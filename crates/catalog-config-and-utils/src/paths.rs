//! File system paths for the catalog service.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name under the home directory.
const BASE_DIR_NAME: &str = ".catalog";
/// Entity (and, in shared mode, outbox) database filename.
const DATABASE_FILE_NAME: &str = "catalog.sqlite";
/// Outbox database filename, only used in separate-store mode.
const OUTBOX_DATABASE_FILE_NAME: &str = "outbox.sqlite";

/// Manages file system paths for the service.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.catalog)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.catalog`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.catalog).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.catalog/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the main database path (~/.catalog/catalog.sqlite).
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join(DATABASE_FILE_NAME)
    }

    /// Get the outbox database path used in separate-store mode
    /// (~/.catalog/outbox.sqlite).
    pub fn outbox_database_file(&self) -> PathBuf {
        self.base_dir.join(OUTBOX_DATABASE_FILE_NAME)
    }

    /// Get the logs directory (~/.catalog/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the central JSONL log file (~/.catalog/logs/dev.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("dev.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
