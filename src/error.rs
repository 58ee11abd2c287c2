//! Business-level error taxonomy shared by services and the command layer.

use thiserror::Error;

use crate::{dao::storage::StorageError, gateway::GatewayError};

/// Errors that can occur in service layer operations.
///
/// The payload of the business variants is a user-ready sentence: the command
/// layer renders it directly into the chat reply instead of exposing internal
/// error text.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed while executing an operation.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Messaging gateway call failed.
    #[error("messaging gateway unavailable")]
    Gateway(#[source] GatewayError),
    /// Caller is not allowed to run the command.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Malformed or out-of-range input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The target game is not open for the requested operation.
    #[error("game not open: {0}")]
    GameNotOpen(String),
    /// The guess deadline for the target game has passed.
    #[error("deadline passed: {0}")]
    DeadlinePassed(String),
    /// The target game was already settled; results are immutable.
    #[error("already settled: {0}")]
    AlreadySettled(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        ServiceError::Gateway(err)
    }
}
