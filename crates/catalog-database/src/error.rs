//! Database error types.

use thiserror::Error;

/// Database error type.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Executor / connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data error
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Guarded update matched no row at the expected version.
    #[error("Version conflict for {id}: expected version {expected}")]
    VersionConflict { id: String, expected: i64 },
}

impl DatabaseError {
    /// Classify a rusqlite error, mapping uniqueness failures to `UniqueViolation`.
    pub fn classify(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                DatabaseError::UniqueViolation(
                    msg.clone().unwrap_or_else(|| e.to_string()),
                )
            }
            _ => DatabaseError::Sqlite(err),
        }
    }

    /// Whether this error is a uniqueness or version conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DatabaseError::UniqueViolation(_) | DatabaseError::VersionConflict { .. }
        )
    }
}

/// Result type alias using DatabaseError.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn classify_unique_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY, sku TEXT UNIQUE)")
            .unwrap();
        conn.execute("INSERT INTO t VALUES ('a', 'x')", []).unwrap();

        let err = conn.execute("INSERT INTO t VALUES ('b', 'x')", []).unwrap_err();
        assert!(matches!(
            DatabaseError::classify(err),
            DatabaseError::UniqueViolation(_)
        ));

        let err = conn.execute("INSERT INTO t VALUES ('a', 'y')", []).unwrap_err();
        assert!(DatabaseError::classify(err).is_conflict());
    }

    #[test]
    fn classify_other_errors_as_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
        let classified = DatabaseError::classify(err);
        assert!(matches!(classified, DatabaseError::Sqlite(_)));
        assert!(!classified.is_conflict());
    }
}
