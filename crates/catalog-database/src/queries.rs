//! Standalone query functions that work with any Connection.
//!
//! Each function takes a `&Connection` as its first parameter, so it runs
//! equally on a bare connection or inside a `Transaction` (which derefs to
//! one). Composing several calls in one transaction is how a unit of work is
//! built.

use crate::{
    DatabaseError, DatabaseResult, NewOutboxRecord, NewProduct, OutboxRecord, Price, Product,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;
use tracing::debug;

// ==========================================
// Products
// ==========================================

const PRODUCT_COLUMNS: &str = "id, name, description, category, price, brand, sku, \
     specifications, tags, created_by, created_at, updated_at, version";

/// Insert a new product at version 0.
///
/// A duplicate id or sku yields `DatabaseError::UniqueViolation`.
pub fn insert_product(conn: &Connection, product: &NewProduct) -> DatabaseResult<Product> {
    let now = format_datetime(Utc::now());
    let specifications = serde_json::to_string(&product.specifications)?;
    let tags = serde_json::to_string(&product.tags)?;

    conn.execute(
        "INSERT INTO products (id, name, description, category, price, brand, sku, specifications, tags, created_by, created_at, updated_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11, 0)",
        params![
            product.id,
            product.name,
            product.description,
            product.category,
            product.price.to_string(),
            product.brand,
            product.sku,
            specifications,
            tags,
            product.created_by,
            now,
        ],
    )
    .map_err(DatabaseError::classify)?;

    debug!(product_id = %product.id, sku = %product.sku, "Product inserted");
    get_product(conn, &product.id)?
        .ok_or_else(|| DatabaseError::NotFound("Product not found after insert".to_string()))
}

/// Get a product by ID.
pub fn get_product(conn: &Connection, id: &str) -> DatabaseResult<Option<Product>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))?;

    match stmt.query_row(params![id], map_product) {
        Ok(product) => Ok(Some(product)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Get a product by SKU.
pub fn get_product_by_sku(conn: &Connection, sku: &str) -> DatabaseResult<Option<Product>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
    ))?;

    match stmt.query_row(params![sku], map_product) {
        Ok(product) => Ok(Some(product)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Check whether any live product uses the SKU.
pub fn sku_exists(conn: &Connection, sku: &str) -> DatabaseResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM products WHERE sku = ?1",
        params![sku],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// List all products ordered by creation time.
pub fn list_products(conn: &Connection) -> DatabaseResult<Vec<Product>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC, rowid ASC"
    ))?;
    let products = stmt
        .query_map([], map_product)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(products)
}

/// Write the mutable fields of `product`, guarded by `expected_version`.
///
/// On success the stored version becomes `expected_version + 1` and
/// `updated_at` is refreshed. When no row matches both the id and the
/// version, returns `VersionConflict`.
pub fn update_product(
    conn: &Connection,
    product: &Product,
    expected_version: i64,
) -> DatabaseResult<Product> {
    let now = format_datetime(Utc::now());
    let specifications = serde_json::to_string(&product.specifications)?;
    let tags = serde_json::to_string(&product.tags)?;

    let count = conn
        .execute(
            "UPDATE products
             SET name = ?1, description = ?2, category = ?3, price = ?4, brand = ?5, sku = ?6,
                 specifications = ?7, tags = ?8, updated_at = ?9, version = version + 1
             WHERE id = ?10 AND version = ?11",
            params![
                product.name,
                product.description,
                product.category,
                product.price.to_string(),
                product.brand,
                product.sku,
                specifications,
                tags,
                now,
                product.id,
                expected_version,
            ],
        )
        .map_err(DatabaseError::classify)?;

    if count == 0 {
        return Err(DatabaseError::VersionConflict {
            id: product.id.clone(),
            expected: expected_version,
        });
    }

    debug!(product_id = %product.id, version = expected_version + 1, "Product updated");
    get_product(conn, &product.id)?
        .ok_or_else(|| DatabaseError::NotFound("Product not found after update".to_string()))
}

/// Delete a product. Returns whether a row was removed.
pub fn delete_product(conn: &Connection, id: &str) -> DatabaseResult<bool> {
    let count = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn map_product(row: &Row<'_>) -> rusqlite::Result<Product> {
    let price: String = row.get(4)?;
    let specifications: String = row.get(7)?;
    let tags: String = row.get(8)?;

    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        price: Price::parse(&price).map_err(|e| conversion_error(4, e))?,
        brand: row.get(5)?,
        sku: row.get(6)?,
        specifications: serde_json::from_str::<BTreeMap<String, String>>(&specifications)
            .map_err(|e| conversion_error(7, e))?,
        tags: serde_json::from_str::<Vec<String>>(&tags).map_err(|e| conversion_error(8, e))?,
        created_by: row.get(9)?,
        created_at: parse_datetime(10, row.get(10)?)?,
        updated_at: parse_datetime(11, row.get(11)?)?,
        version: row.get(12)?,
    })
}

// ==========================================
// Outbox events
// ==========================================

const OUTBOX_COLUMNS: &str =
    "id, aggregate_id, event_type, event_payload, processed, processed_at, created_at";

/// Append an outbox record with `processed = false`.
pub fn insert_outbox_record(
    conn: &Connection,
    record: &NewOutboxRecord,
) -> DatabaseResult<OutboxRecord> {
    conn.execute(
        "INSERT INTO outbox_events (id, aggregate_id, event_type, event_payload, processed, processed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, NULL, ?5)",
        params![
            record.id,
            record.aggregate_id,
            record.event_type,
            record.event_payload,
            format_datetime(record.created_at),
        ],
    )
    .map_err(DatabaseError::classify)?;

    debug!(
        event_id = %record.id,
        aggregate_id = %record.aggregate_id,
        event_type = %record.event_type,
        "Outbox record appended"
    );

    Ok(OutboxRecord {
        id: record.id.clone(),
        aggregate_id: record.aggregate_id.clone(),
        event_type: record.event_type.clone(),
        event_payload: record.event_payload.clone(),
        processed: false,
        processed_at: None,
        created_at: record.created_at,
    })
}

/// Get an outbox record by ID.
pub fn get_outbox_record(conn: &Connection, id: &str) -> DatabaseResult<Option<OutboxRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {OUTBOX_COLUMNS} FROM outbox_events WHERE id = ?1"
    ))?;

    match stmt.query_row(params![id], map_outbox_record) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Unprocessed records, oldest first; insertion order breaks timestamp ties.
pub fn find_unprocessed_ordered_by_created_at(
    conn: &Connection,
    limit: Option<usize>,
) -> DatabaseResult<Vec<OutboxRecord>> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {OUTBOX_COLUMNS} FROM outbox_events
         WHERE processed = 0
         ORDER BY created_at ASC, rowid ASC
         LIMIT ?1"
    ))?;

    let records = stmt
        .query_map(params![limit], map_outbox_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Transition a record to processed.
///
/// Forward-only: returns `false` (and changes nothing) when the record is
/// missing or already processed.
pub fn mark_processed(
    conn: &Connection,
    id: &str,
    processed_at: DateTime<Utc>,
) -> DatabaseResult<bool> {
    let count = conn.execute(
        "UPDATE outbox_events SET processed = 1, processed_at = ?1
         WHERE id = ?2 AND processed = 0",
        params![format_datetime(processed_at), id],
    )?;
    Ok(count > 0)
}

/// Processed records created strictly before `cutoff`.
pub fn find_processed_older_than(
    conn: &Connection,
    cutoff: DateTime<Utc>,
) -> DatabaseResult<Vec<OutboxRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {OUTBOX_COLUMNS} FROM outbox_events
         WHERE processed = 1 AND created_at < ?1
         ORDER BY created_at ASC, rowid ASC"
    ))?;

    let records = stmt
        .query_map(params![format_datetime(cutoff)], map_outbox_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Delete processed records created strictly before `cutoff`. Unprocessed
/// records are never touched. Returns the number of rows removed.
pub fn delete_processed_older_than(
    conn: &Connection,
    cutoff: DateTime<Utc>,
) -> DatabaseResult<usize> {
    let count = conn.execute(
        "DELETE FROM outbox_events WHERE processed = 1 AND created_at < ?1",
        params![format_datetime(cutoff)],
    )?;
    Ok(count)
}

/// All outbox records for one aggregate, oldest first.
pub fn list_outbox_for_aggregate(
    conn: &Connection,
    aggregate_id: &str,
) -> DatabaseResult<Vec<OutboxRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {OUTBOX_COLUMNS} FROM outbox_events
         WHERE aggregate_id = ?1
         ORDER BY created_at ASC, rowid ASC"
    ))?;

    let records = stmt
        .query_map(params![aggregate_id], map_outbox_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Count outbox records, optionally only the unprocessed ones.
pub fn count_outbox_records(conn: &Connection, unprocessed_only: bool) -> DatabaseResult<i64> {
    let sql = if unprocessed_only {
        "SELECT COUNT(*) FROM outbox_events WHERE processed = 0"
    } else {
        "SELECT COUNT(*) FROM outbox_events"
    };
    Ok(conn.query_row(sql, [], |row| row.get(0))?)
}

fn map_outbox_record(row: &Row<'_>) -> rusqlite::Result<OutboxRecord> {
    let processed_at: Option<String> = row.get(5)?;
    Ok(OutboxRecord {
        id: row.get(0)?,
        aggregate_id: row.get(1)?,
        event_type: row.get(2)?,
        event_payload: row.get(3)?,
        processed: row.get::<_, i64>(4)? != 0,
        processed_at: processed_at.map(|s| parse_datetime(5, s)).transpose()?,
        created_at: parse_datetime(6, row.get(6)?)?,
    })
}

// ==========================================
// Helpers
// ==========================================

/// Render a timestamp the way every table stores it: RFC 3339, microseconds, `Z`.
///
/// Fixed width keeps lexical and chronological order identical.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}
