//! SQLite storage for the product catalog.
//!
//! This crate provides:
//! - Async SQLite executor with a dedicated thread per database
//! - Forward-only schema migrations (`products`, `outbox_events`)
//! - Model types for products and outbox records
//! - Query helpers for both tables
//!
//! # Units of work
//!
//! Query helpers take a plain `&Connection`. Running several of them inside
//! [`AsyncDatabase::transaction`] makes them one atomic unit:
//!
//! ```ignore
//! let db = AsyncDatabase::open(path).await?;
//! db.transaction(move |tx| {
//!     let product = queries::insert_product(tx, &new_product)?;
//!     queries::insert_outbox_record(tx, &record)?;
//!     Ok(product)
//! }).await?;
//! ```

mod error;
mod executor;
mod migrations;
mod models;
pub mod queries;

pub use error::{DatabaseError, DatabaseResult};
pub use executor::AsyncDatabase;
pub use migrations::{run_migrations, CURRENT_VERSION};
pub use models::*;
pub use rusqlite::{Connection, Transaction};
