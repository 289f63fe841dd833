//! S3-compatible implementation of [`ObjectStore`].

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use crate::{ObjectStore, StorageError, StorageSettings};

/// Object store backed by an S3-compatible service.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Wrap an existing SDK client.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS environment, honouring the
    /// optional custom endpoint in `settings` (MinIO, Azurite-style
    /// gateways, localstack).
    pub async fn from_env(settings: &StorageSettings) -> Self {
        let base = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&base).force_path_style(true);
        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn container_exists(&self, container: &str) -> Result<bool, StorageError> {
        match self.client.head_bucket().bucket(container).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    Ok(false)
                } else {
                    Err(StorageError::Transport(
                        DisplayErrorContext(err).to_string(),
                    ))
                }
            }
        }
    }

    async fn create_container(&self, container: &str) -> Result<(), StorageError> {
        self.client
            .create_bucket()
            .bucket(container)
            .send()
            .await
            .map_err(|err| StorageError::Transport(DisplayErrorContext(err).to_string()))?;
        Ok(())
    }

    async fn upload_object(
        &self,
        container: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(container)
            .key(path)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| StorageError::Transport(DisplayErrorContext(err).to_string()))?;
        Ok(())
    }

    async fn download_object(&self, container: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let output = match self.client.get_object().bucket(container).key(path).send().await {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                {
                    return Err(StorageError::NotFound(format!("{container}/{path}")));
                }
                return Err(StorageError::Transport(
                    DisplayErrorContext(err).to_string(),
                ));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| StorageError::Transport(err.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }
}
