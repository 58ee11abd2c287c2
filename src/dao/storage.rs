//! Backend-agnostic storage error surfaced by every [`PoolStore`]
//! implementation.
//!
//! [`PoolStore`]: crate::dao::pool_store::PoolStore

use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not complete the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable summary of the failing operation.
        message: String,
        /// Backend-specific failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
