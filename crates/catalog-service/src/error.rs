//! Service error types.
//!
//! Storage and outbox failures are translated into the domain taxonomy here,
//! so callers only ever match on `ServiceError`.

use catalog_database::DatabaseError;
use catalog_outbox::OutboxError;
use thiserror::Error;

/// Service error type.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Product does not exist.
    #[error("Product not found: {0}")]
    NotFound(String),

    /// Duplicate key or stale version.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Request rejected before touching storage.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Store unavailable or query failed.
    #[error("Storage error: {0}")]
    Storage(DatabaseError),

    /// Outbox append failed.
    #[error("Outbox error: {0}")]
    Outbox(OutboxError),

    /// Event could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ServiceError {
    /// HTTP-equivalent status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::ConcurrentModification(_) => 409,
            ServiceError::Validation(_) => 400,
            ServiceError::Storage(_)
            | ServiceError::Outbox(_)
            | ServiceError::Serialization(_) => 500,
        }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::UniqueViolation(msg) => ServiceError::ConcurrentModification(msg),
            DatabaseError::VersionConflict { id, expected } => ServiceError::ConcurrentModification(
                format!("product {} was modified (expected version {})", id, expected),
            ),
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            DatabaseError::Json(e) => ServiceError::Serialization(e.to_string()),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<OutboxError> for ServiceError {
    fn from(e: OutboxError) -> Self {
        match e {
            OutboxError::Database(e) => ServiceError::from(e),
            OutboxError::Json(e) => ServiceError::Serialization(e.to_string()),
            OutboxError::InvalidPayload(msg) => ServiceError::Serialization(msg),
            other => ServiceError::Outbox(other),
        }
    }
}

/// Result type alias using ServiceError.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_conflicts_become_concurrent_modification() {
        let unique: ServiceError = DatabaseError::UniqueViolation("products.sku".into()).into();
        assert!(matches!(unique, ServiceError::ConcurrentModification(_)));
        assert_eq!(unique.status_code(), 409);

        let stale: ServiceError = DatabaseError::VersionConflict {
            id: "p-1".into(),
            expected: 3,
        }
        .into();
        assert!(matches!(stale, ServiceError::ConcurrentModification(ref m) if m.contains("p-1")));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ServiceError::Validation("x".into()).status_code(), 400);
        assert_eq!(
            ServiceError::from(DatabaseError::Connection("down".into())).status_code(),
            500
        );
        assert_eq!(
            ServiceError::from(OutboxError::Publish("nope".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_outbox_database_errors_are_unwrapped() {
        let err: ServiceError =
            OutboxError::Database(DatabaseError::UniqueViolation("outbox_events.id".into())).into();
        assert!(matches!(err, ServiceError::ConcurrentModification(_)));

        let err: ServiceError = OutboxError::InvalidPayload("bad".into()).into();
        assert!(matches!(err, ServiceError::Serialization(_)));
    }
}
