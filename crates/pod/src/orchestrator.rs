//! Pod lifecycle orchestration.
//!
//! [`PodOrchestrator`] guarantees at most one non-finished pod per
//! project: reconciliation fetches the current pod, reuses it while it
//! is alive, and replaces it once it has reached a terminal phase. The
//! platform client is optional -- when no control plane is configured
//! every operation short-circuits to a no-op result.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::api::{EnvVar, Pod, PodApiError};
use crate::exec::ExecEvent;
use crate::script::{build_command, InferenceAction, PodScript};

/// Prefix for all project pods.
pub const POD_NAME_PREFIX: &str = "sat-project-";

/// Derive the deterministic pod name for a project id.
///
/// Ids already carrying the prefix are left unchanged.
pub fn format_pod_name(id: &str) -> String {
    if id.starts_with(POD_NAME_PREFIX) {
        id.to_string()
    } else {
        format!("{POD_NAME_PREFIX}{id}")
    }
}

/// Pod control plane operations the orchestrator depends on.
#[async_trait::async_trait]
pub trait PodPlatform: Send + Sync {
    /// Fetch a pod by name; absent pods are `Ok(None)`, not errors.
    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, PodApiError>;

    /// Create a pod for `project_id` with the platform's base
    /// environment plus `extra_env`.
    async fn create_pod(
        &self,
        name: &str,
        project_id: &str,
        extra_env: &[EnvVar],
    ) -> Result<Pod, PodApiError>;

    /// Delete a pod by name; absence counts as success.
    async fn delete_pod(&self, name: &str) -> Result<(), PodApiError>;

    /// Execute a command inside the pod, streaming events to
    /// `on_event`.
    async fn exec(
        &self,
        name: &str,
        command: &[String],
        on_event: &(dyn Fn(ExecEvent) + Send + Sync),
    ) -> Result<(), PodApiError>;
}

/// Bounded readiness polling parameters.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Poll attempts after the initial check.
    pub limit: u32,
    /// Sleep between polls.
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            limit: 15,
            interval: Duration::from_secs(1),
        }
    }
}

/// Options for [`PodOrchestrator::exec_script`].
pub struct ExecOptions {
    /// Stand the pod up (reconcile + wait for Running) when it is not
    /// already running. Without this, a non-running pod makes the call
    /// a silent no-op.
    pub force_run_pod: bool,
    /// Value of the `INIT_TRAINING` flag passed when forcing.
    pub init_training: bool,
    /// Awaited after the command completes.
    pub on_finish: Option<BoxFuture<'static, ()>>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            force_run_pod: false,
            init_training: true,
            on_finish: None,
        }
    }
}

/// Reconciles and drives the per-project training pod.
pub struct PodOrchestrator {
    platform: Option<Arc<dyn PodPlatform>>,
    retry: RetryConfig,
}

impl PodOrchestrator {
    pub fn new(platform: Arc<dyn PodPlatform>, retry: RetryConfig) -> Self {
        Self {
            platform: Some(platform),
            retry,
        }
    }

    /// An orchestrator with no control plane; every operation is a
    /// no-op.
    pub fn disabled() -> Self {
        Self {
            platform: None,
            retry: RetryConfig::default(),
        }
    }

    /// Whether a control plane is configured.
    pub fn is_enabled(&self) -> bool {
        self.platform.is_some()
    }

    /// Fetch the project's pod, if any.
    pub async fn get_pod(&self, id: &str) -> Result<Option<Pod>, PodApiError> {
        let Some(platform) = &self.platform else {
            return Ok(None);
        };
        platform.get_pod(&format_pod_name(id)).await
    }

    /// Delete the project's pod; absence counts as success.
    pub async fn delete_pod(&self, id: &str) -> Result<(), PodApiError> {
        let Some(platform) = &self.platform else {
            return Ok(());
        };
        platform.delete_pod(&format_pod_name(id)).await
    }

    /// Idempotent reconciliation: reuse the current pod while it is
    /// not finished, replace it when it is, create it when absent.
    ///
    /// This is the central idempotency guarantee -- at most one
    /// non-finished pod per project at any time.
    pub async fn create_or_update_pod(
        &self,
        id: &str,
        extra_env: &[EnvVar],
    ) -> Result<Option<Pod>, PodApiError> {
        let Some(platform) = &self.platform else {
            return Ok(None);
        };
        let name = format_pod_name(id);

        if let Some(pod) = platform.get_pod(&name).await? {
            if !pod.phase().is_finished() {
                tracing::debug!(pod = %name, phase = ?pod.phase(), "Reusing existing pod");
                return Ok(Some(pod));
            }
            platform.delete_pod(&name).await?;
        }

        platform.create_pod(&name, id, extra_env).await.map(Some)
    }

    /// Run a script inside the project's pod.
    ///
    /// Non-forcing mode silently skips when the pod is absent or not
    /// Running. Forcing mode reconciles the pod with an
    /// `INIT_TRAINING` flag and polls until it is Running; exhausting
    /// the retry budget is logged and swallowed (the exec is skipped,
    /// no error is returned).
    pub async fn exec_script(
        &self,
        id: &str,
        script: PodScript,
        action: InferenceAction,
        args: &[String],
        on_event: &(dyn Fn(ExecEvent) + Send + Sync),
        options: ExecOptions,
    ) -> Result<(), PodApiError> {
        let Some(platform) = &self.platform else {
            return Ok(());
        };
        let name = format_pod_name(id);

        let pod = platform.get_pod(&name).await?;
        let running = pod.map(|p| p.phase().is_running()).unwrap_or(false);

        if !options.force_run_pod && !running {
            tracing::debug!(pod = %name, "Pod not running, skipping exec");
            return Ok(());
        }

        if options.force_run_pod && !running {
            let init_training = if options.init_training { "TRUE" } else { "FALSE" };
            self.create_or_update_pod(id, &[EnvVar::new("INIT_TRAINING", init_training)])
                .await?;

            if !self.wait_until_running(platform.as_ref(), &name).await? {
                tracing::warn!(
                    pod = %name,
                    attempts = self.retry.limit,
                    "Pod never reached Running, skipping exec",
                );
                return Ok(());
            }
        }

        let command = build_command(script, action, args);
        tracing::info!(pod = %name, action = action.as_str(), "Executing pod script");
        platform.exec(&name, &command, on_event).await?;

        if let Some(on_finish) = options.on_finish {
            on_finish.await;
        }
        Ok(())
    }

    /// Poll until the pod reports Running, up to the retry budget.
    /// Returns whether it got there.
    async fn wait_until_running(
        &self,
        platform: &dyn PodPlatform,
        name: &str,
    ) -> Result<bool, PodApiError> {
        let mut attempts_left = self.retry.limit;
        loop {
            match platform.get_pod(name).await? {
                Some(pod) if pod.phase().is_running() => return Ok(true),
                _ => {}
            }
            if attempts_left == 0 {
                return Ok(false);
            }
            attempts_left -= 1;
            tokio::time::sleep(self.retry.interval).await;
        }
    }
}
