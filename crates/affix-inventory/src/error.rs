//! Error types for the affix inventory store.

use affix_core::{PlatformError, ResourceKind};
use thiserror::Error;

/// Result type alias for inventory store operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Errors that can occur during inventory store operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: ResourceKind, name: String },

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("invalid seed: {0}")]
    Seed(String),
}

impl InventoryError {
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        InventoryError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

impl From<InventoryError> for PlatformError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound { kind, name } => PlatformError::NotFound { kind, name },
            InventoryError::Rejected(reason) => PlatformError::Rejected(reason),
            other => PlatformError::Backend(other.to_string()),
        }
    }
}
