//! In-memory blob store
//!
//! Models the object-storage variant of the backing store: flat keyed blobs
//! (directories are only a naming convention) with an optional per-artifact
//! lease held around each write. A lease auto-expires after a fixed TTL so a
//! crashed writer cannot deadlock the artifact. Also used as the test store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::warn;

use super::{FileStore, StorageError};

const LEASE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct Inner {
    blobs: HashMap<String, String>,
    /// Artifact path -> lease expiry
    leases: HashMap<String, Instant>,
}

/// Blob-style store keeping everything in process memory
#[derive(Debug, Default)]
pub struct InMemoryFileStore {
    inner: Mutex<Inner>,
    lease_writes: bool,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize concurrent writers to the same artifact with a lease per write
    pub fn with_leases() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            lease_writes: true,
        }
    }

    /// Mark an artifact as leased by another writer, for tests
    #[cfg(test)]
    fn seed_lease(&self, path: &str, expiry: Instant) {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .leases
            .insert(path.to_string(), expiry);
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    fn combine_path(&self, base: &str, name: &str) -> String {
        format!("{}/{}", base, name)
    }

    async fn create_dir_if_not_exists(&self, _path: &str) -> Result<(), StorageError> {
        // Directories are just a blob-name detail
        Ok(())
    }

    async fn create_dir(&self, _path: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn write_all_text(
        &self,
        path: &str,
        content: &str,
        first_write: bool,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");

        let exists = inner.blobs.contains_key(path);
        if first_write && exists {
            warn!("Artifact {} should not exist yet, overwriting", path);
        }

        if self.lease_writes && exists {
            let now = Instant::now();
            if let Some(expiry) = inner.leases.get(path) {
                if *expiry > now {
                    return Err(StorageError::Lease(path.to_string()));
                }
            }
            // Held for the minimum time: acquired here, released after the write
            inner.leases.insert(path.to_string(), now + LEASE_TTL);
            inner.blobs.insert(path.to_string(), content.to_string());
            inner.leases.remove(path);
            return Ok(());
        }

        inner.blobs.insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn read_all_text(&self, path: &str) -> Result<String, StorageError> {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .blobs
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}
