//! Infrastructure error type.
//!
//! Per-request failures are expressed as HTTP responses (see
//! [`ApiError`](crate::handlers::ApiError)), not as `Error`s. This type covers
//! what can stop the process: binding the listener or opening the store.

use thiserror::Error;

use crate::storage::StorageError;

/// The error type returned by the server's fallible startup operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),
}
