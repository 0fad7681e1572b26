//! Error types shared across the designer core.

use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised while reading, importing or configuring a design.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error("Malformed design: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Import failed: {0}")]
    ImportFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for design operations.
pub type DesignResult<T> = Result<T, DesignError>;
