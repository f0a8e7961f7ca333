//! Local filesystem backing store

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use super::{FileStore, StorageError};

/// Filesystem-backed store. No locking: jobs are isolated by directory and a
/// single process owns each job's flow of control.
#[derive(Debug, Default, Clone)]
pub struct LocalFileStore;

impl LocalFileStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    fn combine_path(&self, base: &str, name: &str) -> String {
        Path::new(base).join(name).to_string_lossy().into_owned()
    }

    async fn create_dir_if_not_exists(&self, path: &str) -> Result<(), StorageError> {
        fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn write_all_text(
        &self,
        path: &str,
        content: &str,
        _first_write: bool,
    ) -> Result<(), StorageError> {
        fs::write(path, content).await?;
        Ok(())
    }

    async fn read_all_text(&self, path: &str) -> Result<String, StorageError> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new();
        let path = store.combine_path(dir.path().to_str().unwrap(), "artifact.json");

        store.write_all_text(&path, "{\"a\":1}", true).await.unwrap();
        assert_eq!(store.read_all_text(&path).await.unwrap(), "{\"a\":1}");

        store.write_all_text(&path, "{\"a\":2}", false).await.unwrap();
        assert_eq!(store.read_all_text(&path).await.unwrap(), "{\"a\":2}");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new();
        let path = store.combine_path(dir.path().to_str().unwrap(), "missing.json");

        let err = store.read_all_text(&path).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new();
        let sub = store.combine_path(dir.path().to_str().unwrap(), "jobs");

        store.create_dir_if_not_exists(&sub).await.unwrap();
        store.create_dir_if_not_exists(&sub).await.unwrap();
        store.create_dir(&sub).await.unwrap();
    }
}
