//! Database-specific error types and conversions.

use shopfront_core::error::ShopError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}")]
    Duplicate { entity: String },

    #[error("Transaction aborted: {0}")]
    Aborted(String),

    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl DbError {
    /// Classify a failed statement: unique-index violations become
    /// [`DbError::Duplicate`], everything else [`DbError::Query`].
    pub(crate) fn from_check(entity: &str, err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        if msg.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
            }
        } else {
            DbError::Query(msg)
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for ShopError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ShopError::NotFound { entity, id },
            DbError::Duplicate { entity } => ShopError::AlreadyExists { entity },
            DbError::Aborted(reason) => ShopError::Conflict { reason },
            other => ShopError::Database(other.to_string()),
        }
    }
}
