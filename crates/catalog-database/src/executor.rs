//! Async SQLite executor using a dedicated background thread.
//!
//! Every `AsyncDatabase` owns one SQLite connection living on its own thread.
//! Closures passed to [`AsyncDatabase::call`] run there in FIFO order, so a
//! closure is also the natural boundary of a unit of work: wrap it in
//! [`AsyncDatabase::transaction`] and everything inside commits or rolls back
//! together.
//!
//! Only SQL and light row mapping belong inside a closure. Network calls
//! (publishing) and sleeps must stay outside or they stall every other query.
//!
//! ```ignore
//! let db = AsyncDatabase::open(path).await?;
//! let product = db.transaction(move |tx| {
//!     let product = queries::insert_product(tx, &new_product)?;
//!     queries::insert_outbox_record(tx, &record)?;
//!     Ok(product)
//! }).await?;
//! ```

use crate::{migrations, DatabaseError, DatabaseResult};
use rusqlite::{Transaction, TransactionBehavior};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

/// Convert a tokio_rusqlite::Error to DatabaseError.
fn from_tokio_rusqlite(e: tokio_rusqlite::Error) -> DatabaseError {
    match e {
        tokio_rusqlite::Error::Rusqlite(e) => DatabaseError::classify(e),
        tokio_rusqlite::Error::ConnectionClosed => {
            DatabaseError::Connection("Connection closed".to_string())
        }
        tokio_rusqlite::Error::Close(_) => {
            DatabaseError::Connection("Connection closed".to_string())
        }
        other => DatabaseError::Connection(other.to_string()),
    }
}

/// Async SQLite database with a dedicated executor thread.
#[derive(Clone)]
pub struct AsyncDatabase {
    conn: Connection,
    path: String,
}

impl AsyncDatabase {
    /// Open (or create) a database file, apply pragmas and run migrations.
    pub async fn open(path: &Path) -> DatabaseResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.to_string_lossy().to_string();
        info!(path = %path_str, "Opening async database");

        let conn = Connection::open(path_str.clone())
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let db = Self {
            conn,
            path: path_str,
        };

        db.call_sqlite(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                PRAGMA temp_store = MEMORY;
                PRAGMA busy_timeout = 5000;
                ",
            )
        })
        .await?;
        db.migrate().await?;

        info!(path = %db.path, "Async database initialized with WAL mode");
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied.
    pub async fn open_in_memory() -> DatabaseResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let db = Self {
            conn,
            path: ":memory:".to_string(),
        };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> DatabaseResult<()> {
        self.call(|conn| {
            migrations::run_migrations(conn).map_err(|e| match e {
                DatabaseError::Migration(_) => e,
                other => DatabaseError::Migration(other.to_string()),
            })
        })
        .await
    }

    /// Execute a closure on the database connection.
    ///
    /// The closure runs on the dedicated SQLite thread; the caller's task is
    /// parked until the result is ready.
    pub async fn call<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DatabaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        // Our result rides inside tokio_rusqlite's Ok so the error type survives.
        let outer_result = self.conn.call(move |conn| Ok(f(conn))).await;

        match outer_result {
            Ok(inner) => inner,
            Err(e) => Err(from_tokio_rusqlite(e)),
        }
    }

    /// Execute a closure that returns a rusqlite::Result.
    pub async fn call_sqlite<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| Ok(f(conn)?))
            .await
            .map_err(from_tokio_rusqlite)
    }

    /// Run a closure inside one `BEGIN IMMEDIATE` transaction.
    ///
    /// Commits when the closure returns `Ok`; any `Err` drops the transaction,
    /// which rolls it back.
    pub async fn transaction<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> DatabaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.unit_of_work(f).await
    }

    /// Like [`transaction`](Self::transaction), with the caller's error type.
    ///
    /// Lets a unit of work mix database calls with other fallible steps
    /// (such as building an outbox envelope) without flattening errors.
    pub async fn unit_of_work<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
    {
        let outer_result = self
            .conn
            .call(move |conn| {
                // The connection is exclusively ours for the duration of the closure.
                let tx = match Transaction::new_unchecked(conn, TransactionBehavior::Immediate) {
                    Ok(tx) => tx,
                    Err(e) => return Ok(Err(E::from(DatabaseError::classify(e)))),
                };
                let value = match f(&tx) {
                    Ok(value) => value,
                    Err(e) => return Ok(Err(e)),
                };
                Ok(tx
                    .commit()
                    .map(|()| value)
                    .map_err(|e| E::from(DatabaseError::classify(e))))
            })
            .await;

        match outer_result {
            Ok(inner) => inner,
            Err(e) => Err(E::from(from_tokio_rusqlite(e))),
        }
    }

    /// Get the database file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Check if the database is healthy by executing a simple query.
    pub async fn health_check(&self) -> DatabaseResult<()> {
        self.call_sqlite(|conn| conn.execute_batch("SELECT 1")).await?;
        debug!(path = %self.path, "Database health check passed");
        Ok(())
    }

    /// Close the database connection, waiting for queued work first.
    pub async fn close(self) -> DatabaseResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to close database: {:?}", e)))?;
        info!(path = %self.path, "Database closed");
        Ok(())
    }
}
