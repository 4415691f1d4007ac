//! Database migrations.
//!
//! Forward-only; each step is applied once and recorded in `migrations`.

use crate::DatabaseResult;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> DatabaseResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;

    if current_version >= CURRENT_VERSION {
        debug!(current_version, "Schema up to date");
        return Ok(());
    }

    info!(current_version, target_version = CURRENT_VERSION, "Running migrations");

    if current_version < 1 {
        migrate_v1_products(conn)?;
    }
    if current_version < 2 {
        migrate_v2_outbox_events(conn)?;
    }

    info!("Migrations complete");
    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> DatabaseResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

/// V1: products table.
fn migrate_v1_products(conn: &Connection) -> DatabaseResult<()> {
    info!("Applying migration v1: products");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            category TEXT,
            price TEXT NOT NULL,
            brand TEXT,
            sku TEXT NOT NULL UNIQUE,
            specifications TEXT NOT NULL DEFAULT '{}',
            tags TEXT NOT NULL DEFAULT '[]',
            created_by TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
        ",
    )?;

    record_migration(conn, 1, "products")?;
    Ok(())
}

/// V2: outbox_events table.
///
/// `(processed, created_at)` serves both the relay scan and the retention delete.
fn migrate_v2_outbox_events(conn: &Connection) -> DatabaseResult<()> {
    info!("Applying migration v2: outbox_events");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS outbox_events (
            id TEXT PRIMARY KEY,
            aggregate_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            event_payload TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            processed_at TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_outbox_events_processed_created_at
            ON outbox_events(processed, created_at);
        CREATE INDEX IF NOT EXISTS idx_outbox_events_aggregate_id
            ON outbox_events(aggregate_id);
        ",
    )?;

    record_migration(conn, 2, "outbox_events")?;
    Ok(())
}
