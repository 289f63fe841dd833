//! Object storage capability for tile containers.
//!
//! [`ObjectStore`] abstracts the blob store holding original uploads
//! and produced tiles so the pipeline can run against S3-compatible
//! storage in production and an in-memory store in tests.

use async_trait::async_trait;

pub mod memory;
pub mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Errors from the object storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested object or container does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Any other storage failure (network, auth, service errors).
    #[error("Storage error: {0}")]
    Transport(String),
}

/// Blob store operations the ingestion pipeline depends on.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether the named container exists.
    async fn container_exists(&self, container: &str) -> Result<bool, StorageError>;

    /// Create the named container.
    async fn create_container(&self, container: &str) -> Result<(), StorageError>;

    /// Store `bytes` at `path` inside `container`.
    async fn upload_object(
        &self,
        container: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError>;

    /// Fetch the object at `path` inside `container`.
    async fn download_object(&self, container: &str, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Create the container when it is absent. Called lazily before the
    /// first upload of a pipeline run.
    async fn ensure_container(&self, container: &str) -> Result<(), StorageError> {
        if !self.container_exists(container).await? {
            tracing::info!(container, "Creating missing object container");
            self.create_container(container).await?;
        }
        Ok(())
    }
}

/// Container names used by the ingestion pipeline, loaded from
/// environment variables.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Container holding the user-staged original images.
    pub original_container: String,
    /// Container receiving the produced tiles.
    pub public_container: String,
    /// Container holding exported training datasets.
    pub dataset_container: String,
    /// Container for imported model snapshots.
    pub import_model_container: String,
    /// Container for exported model snapshots.
    pub export_model_container: String,
    /// Optional custom endpoint (S3-compatible stores, local dev).
    pub endpoint_url: Option<String>,
}

impl StorageSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                   | Default            |
    /// |---------------------------|--------------------|
    /// | `S3_BUCKET_ORIGINAL`      | `sat-original`     |
    /// | `S3_BUCKET_PUBLIC`        | `sat-public`       |
    /// | `S3_BUCKET_DATASET`       | `sat-dataset`      |
    /// | `S3_BUCKET_IMPORT_MODEL`  | `sat-import-model` |
    /// | `S3_BUCKET_EXPORT_MODEL`  | `sat-export-model` |
    /// | `S3_ENDPOINT_URL`         | unset              |
    pub fn from_env() -> Self {
        let get = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self {
            original_container: get("S3_BUCKET_ORIGINAL", "sat-original"),
            public_container: get("S3_BUCKET_PUBLIC", "sat-public"),
            dataset_container: get("S3_BUCKET_DATASET", "sat-dataset"),
            import_model_container: get("S3_BUCKET_IMPORT_MODEL", "sat-import-model"),
            export_model_container: get("S3_BUCKET_EXPORT_MODEL", "sat-export-model"),
            endpoint_url: std::env::var("S3_ENDPOINT_URL").ok(),
        }
    }
}
