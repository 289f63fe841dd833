//! In-memory [`ObjectStore`] for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{ObjectStore, StorageError};

/// Object store holding everything in a process-local map.
#[derive(Default)]
pub struct MemoryObjectStore {
    containers: Mutex<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object, creating its container if needed.
    pub async fn seed(&self, container: &str, path: &str, bytes: Vec<u8>) {
        let mut containers = self.containers.lock().await;
        containers
            .entry(container.to_string())
            .or_default()
            .insert(path.to_string(), bytes);
    }

    /// Names of all objects in a container, sorted.
    pub async fn object_names(&self, container: &str) -> Vec<String> {
        let containers = self.containers.lock().await;
        let mut names: Vec<String> = containers
            .get(container)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn container_exists(&self, container: &str) -> Result<bool, StorageError> {
        Ok(self.containers.lock().await.contains_key(container))
    }

    async fn create_container(&self, container: &str) -> Result<(), StorageError> {
        self.containers
            .lock()
            .await
            .entry(container.to_string())
            .or_default();
        Ok(())
    }

    async fn upload_object(
        &self,
        container: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        let mut containers = self.containers.lock().await;
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| StorageError::NotFound(container.to_string()))?;
        objects.insert(path.to_string(), bytes);
        Ok(())
    }

    async fn download_object(&self, container: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let containers = self.containers.lock().await;
        containers
            .get(container)
            .and_then(|objects| objects.get(path))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{container}/{path}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_container_creates_once() {
        let store = MemoryObjectStore::new();
        assert!(!store.container_exists("tiles").await.unwrap());
        store.ensure_container("tiles").await.unwrap();
        assert!(store.container_exists("tiles").await.unwrap());
        // Second call is a no-op.
        store.ensure_container("tiles").await.unwrap();
    }

    #[tokio::test]
    async fn upload_then_download_round_trip() {
        let store = MemoryObjectStore::new();
        store.ensure_container("tiles").await.unwrap();
        store
            .upload_object("tiles", "1/img_0_0.png", vec![1, 2, 3])
            .await
            .unwrap();
        let bytes = store.download_object("tiles", "1/img_0_0.png").await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn download_missing_object_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = store.download_object("tiles", "nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn upload_into_missing_container_fails() {
        let store = MemoryObjectStore::new();
        let err = store
            .upload_object("tiles", "x", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
