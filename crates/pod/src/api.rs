//! REST client for the pod control plane.
//!
//! Wraps the control plane's pod CRUD endpoints using [`reqwest`] and
//! assembles the pod manifest (GPU scheduling, training image,
//! environment vector) for creation requests.

use serde::{Deserialize, Serialize};

use satseg_storage::StorageSettings;

use crate::exec::{exec_in_pod, ExecEvent};
use crate::orchestrator::PodPlatform;
use crate::phase::PodPhase;

/// One entry of a pod's environment vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Pod resource as returned by the control plane.
#[derive(Debug, Clone, Deserialize)]
pub struct Pod {
    pub metadata: PodMetadata,
    #[serde(default)]
    pub status: PodStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PodMetadata {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub phase: PodPhase,
}

impl Pod {
    /// Current lifecycle phase.
    pub fn phase(&self) -> PodPhase {
        self.status.phase
    }
}

/// Errors from the pod control plane layer.
#[derive(Debug, thiserror::Error)]
pub enum PodApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The control plane returned a non-2xx status code.
    #[error("Pod platform error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A delete failed for a reason other than "not found".
    #[error("Pod delete failed: {0}")]
    Delete(String),

    /// The exec WebSocket channel failed.
    #[error("Exec channel error: {0}")]
    Exec(String),
}

/// Control plane connection settings plus everything that goes into a
/// training pod's environment vector.
#[derive(Debug, Clone)]
pub struct PodSettings {
    /// Base URL of the control plane REST API.
    pub api_url: String,
    /// Bearer token; the platform client is disabled when unset.
    pub token: Option<String>,
    /// Namespace pods are created in.
    pub namespace: String,
    /// Private training image reference.
    pub training_image: String,
    /// Pull secret for the training image.
    pub training_image_secret: String,
    /// Object storage connection string handed to the pod.
    pub storage_connection_string: String,
    /// Object storage connection timeout in seconds, as a string.
    pub storage_connection_timeout: String,
    /// Work queue connection string handed to the pod.
    pub queue_connection_string: String,
    /// Pub-sub connection string handed to the pod.
    pub pubsub_connection_string: String,
    /// Pub-sub hub name handed to the pod.
    pub pubsub_hub_name: String,
    /// URL the pod uses to call back into this backend.
    pub backend_url: String,
    /// Container names exported to the pod.
    pub containers: StorageSettings,
}

impl PodSettings {
    /// Load settings from environment variables.
    ///
    /// `POD_API_TOKEN` unset means no control plane is configured and
    /// [`RestPodPlatform::from_settings`] will return `None`.
    pub fn from_env(containers: StorageSettings) -> Self {
        let get = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self {
            api_url: get("POD_API_URL", "http://localhost:8001/api/v1"),
            token: std::env::var("POD_API_TOKEN").ok(),
            namespace: get("POD_NAMESPACE", "default"),
            training_image: get("TRAINING_IMAGE", ""),
            training_image_secret: get("TRAINING_IMAGE_SECRET", ""),
            storage_connection_string: get("STORAGE_CONNECTION_STRING", ""),
            storage_connection_timeout: get("STORAGE_CONNECTION_TIMEOUT", "600"),
            queue_connection_string: get("QUEUE_CONNECTION_STRING", ""),
            pubsub_connection_string: get("PUBSUB_CONNECTION_STRING", ""),
            pubsub_hub_name: get("PUBSUB_HUB_NAME", ""),
            backend_url: get("BACKEND_URL", ""),
            containers,
        }
    }
}

/// REST implementation of [`PodPlatform`].
pub struct RestPodPlatform {
    client: reqwest::Client,
    settings: PodSettings,
    token: String,
}

impl RestPodPlatform {
    /// Build the platform client, or `None` when no control plane token
    /// is configured. All orchestrator operations short-circuit to
    /// no-ops in that case.
    pub fn from_settings(settings: PodSettings) -> Option<Self> {
        let token = settings.token.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            settings,
            token,
        })
    }

    /// Environment vector every training pod receives, before
    /// caller-supplied extras.
    fn base_env(&self, project_id: &str) -> Vec<EnvVar> {
        let s = &self.settings;
        vec![
            EnvVar::new("STORAGE_CONNECTION_STRING", &*s.storage_connection_string),
            EnvVar::new("STORAGE_CONNECTION_TIMEOUT", &*s.storage_connection_timeout),
            EnvVar::new("DATASET_CONTAINER_NAME", &*s.containers.dataset_container),
            EnvVar::new("PUBLIC_CONTAINER_NAME", &*s.containers.public_container),
            EnvVar::new("ORIGINAL_CONTAINER_NAME", &*s.containers.original_container),
            EnvVar::new(
                "IMPORT_MODEL_CONTAINER_NAME",
                &*s.containers.import_model_container,
            ),
            EnvVar::new(
                "EXPORT_MODEL_CONTAINER_NAME",
                &*s.containers.export_model_container,
            ),
            EnvVar::new("QUEUE_CONNECTION_STRING", &*s.queue_connection_string),
            EnvVar::new("PUBSUB_CONNECTION_STRING", &*s.pubsub_connection_string),
            EnvVar::new("PUBSUB_HUB_NAME", &*s.pubsub_hub_name),
            EnvVar::new("PROJECT_ID", project_id),
            EnvVar::new("BACKEND_URL", &*s.backend_url),
        ]
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`PodApiError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, PodApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PodApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PodApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl PodPlatform for RestPodPlatform {
    /// Fetch a pod by name. A 404 means the pod is absent, not an
    /// error.
    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, PodApiError> {
        let response = self
            .client
            .get(format!("{}/pods/{}", self.settings.api_url, name))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::parse_response(response).await?))
    }

    /// Create a pod requesting GPU scheduling, the private training
    /// image, and a never-restart policy.
    async fn create_pod(
        &self,
        name: &str,
        project_id: &str,
        extra_env: &[EnvVar],
    ) -> Result<Pod, PodApiError> {
        let mut env = self.base_env(project_id);
        env.extend_from_slice(extra_env);

        let manifest = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": name },
            "spec": {
                "containers": [{
                    "name": name,
                    "image": self.settings.training_image,
                    "resources": { "requests": { "memory": "1Gi" } },
                    "env": env,
                }],
                "nodeSelector": { "type": "gpu" },
                "restartPolicy": "Never",
                "imagePullSecrets": [{ "name": self.settings.training_image_secret }],
            },
        });

        let response = self
            .client
            .post(format!("{}/pods", self.settings.api_url))
            .bearer_auth(&self.token)
            .json(&manifest)
            .send()
            .await?;

        let pod: Pod = Self::parse_response(response).await?;
        tracing::info!(pod = %pod.metadata.name, project_id, "Created training pod");
        Ok(pod)
    }

    /// Delete a pod by name; a 404 counts as success.
    async fn delete_pod(&self, name: &str) -> Result<(), PodApiError> {
        let response = self
            .client
            .delete(format!("{}/pods/{}", self.settings.api_url, name))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| PodApiError::Delete(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::ensure_success(response)
            .await
            .map_err(|e| PodApiError::Delete(e.to_string()))?;
        Ok(())
    }

    /// Run a command inside the pod over the exec WebSocket channel,
    /// forwarding output and the final status to `on_event`.
    async fn exec(
        &self,
        name: &str,
        command: &[String],
        on_event: &(dyn Fn(ExecEvent) + Send + Sync),
    ) -> Result<(), PodApiError> {
        exec_in_pod(
            &self.settings.api_url,
            &self.token,
            &self.settings.namespace,
            name,
            command,
            on_event,
        )
        .await
    }
}
