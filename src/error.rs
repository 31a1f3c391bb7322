use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors surfaced by the document store and the game lifecycle.
///
/// None of them is fatal on its own: the in-memory document stays authoritative and callers
/// decide how to present the failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Durable medium could not be read or written (or held a corrupt document).
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StorageError),
    /// Lookup by name or by the active game resolved to nothing.
    #[error("not found: {0}")]
    RecordNotFound(String),
    /// A defensive check failed; the offending mutation was not applied.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::StoreUnavailable(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {}", err))
    }
}
