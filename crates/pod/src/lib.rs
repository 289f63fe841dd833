//! Remote pod platform client and lifecycle orchestrator.
//!
//! Provides the pod phase model, a REST client for pod CRUD against
//! the control plane, a WebSocket exec channel, and the
//! [`orchestrator::PodOrchestrator`] that guarantees at most one
//! non-finished pod per project.

pub mod api;
pub mod exec;
pub mod orchestrator;
pub mod phase;
pub mod script;

pub use api::{EnvVar, Pod, PodApiError, PodSettings, RestPodPlatform};
pub use exec::ExecEvent;
pub use orchestrator::{ExecOptions, PodOrchestrator, PodPlatform, RetryConfig};
pub use phase::PodPhase;
pub use script::{InferenceAction, PodScript};
