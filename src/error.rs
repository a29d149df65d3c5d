/// Error types for the social graph coordination layer.
use thiserror::Error;

/// Failures surfaced by the document store collaborator.
///
/// Clone-able so a single failed coalesced read can be fanned out to every
/// caller waiting on the same actor batch with the originating error intact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("id-membership query over limit: {got} ids (max {max})")]
    TooManyIds { got: usize, max: usize },
}

/// Errors returned by the public social graph operations.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
