//! Storage backends for the resource collection.
//!
//! Both backends implement [`Storage`] and are interchangeable at startup:
//!
//! - [`SqliteStorage`]: one `resources` table in a SQLite file (or in memory).
//!   Ids come from `AUTOINCREMENT`.
//! - [`MemoryStorage`]: an ordered `Vec` behind a mutex. Ids come from a
//!   monotonic counter.
//!
//! In both, ids are never reused after deletion, and `list` returns resources
//! in insertion order.

mod memory;
mod sqlite;
#[cfg(test)]
mod tests;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use thiserror::Error;

use crate::model::Resource;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of a storage operation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No resource has the requested id.
    #[error("resource not found: {0}")]
    NotFound(i64),

    /// The underlying store rejected the statement or is unreachable.
    #[error("persistence: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// A writer panicked while holding the store lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// The resource collection.
///
/// Operations are synchronous and short; each one is atomic with respect to
/// the others on the same backend.
pub trait Storage: Send + Sync {
    /// All resources, in insertion order. Empty when none exist.
    fn list(&self) -> StorageResult<Vec<Resource>>;

    /// Creates a resource and returns it with its assigned id.
    fn add(&self, name: &str) -> StorageResult<Resource>;

    /// Replaces the name of resource `id`.
    fn update(&self, id: i64, name: &str) -> StorageResult<()>;

    /// Removes resource `id`.
    fn delete(&self, id: i64) -> StorageResult<()>;
}
