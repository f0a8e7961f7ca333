//! Backing stores for job workspaces
//!
//! The workspace only needs flat keyed text artifacts, so the contract is a
//! small path-oriented trait implemented by a local filesystem store and an
//! in-memory blob store. Paths are composed by the store itself, since blob
//! stores join with `/` while the filesystem uses the platform separator.

pub mod in_memory;
pub mod local;

use async_trait::async_trait;
use thiserror::Error;

pub use in_memory::InMemoryFileStore;
pub use local::LocalFileStore;

/// Errors from the backing store. Lease failures are fatal storage errors,
/// not business errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unable to lease artifact: {0}")]
    Lease(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Other(String),
}

/// Keyed text storage for workspace artifacts.
///
/// `first_write` distinguishes creating an artifact from updating it, so
/// implementations can enforce or warn about not-exists-yet semantics.
/// This is best-effort, not a strict invariant.
#[async_trait]
pub trait FileStore: Send + Sync {
    fn combine_path(&self, base: &str, name: &str) -> String;

    /// Idempotent root/container creation
    async fn create_dir_if_not_exists(&self, path: &str) -> Result<(), StorageError>;

    async fn create_dir(&self, path: &str) -> Result<(), StorageError>;

    async fn write_all_text(
        &self,
        path: &str,
        content: &str,
        first_write: bool,
    ) -> Result<(), StorageError>;

    async fn read_all_text(&self, path: &str) -> Result<String, StorageError>;
}
