//! Pod lifecycle phases as reported by the control plane.

use serde::{Deserialize, Serialize};

/// Phase of a remote pod.
///
/// Anything the control plane reports that we do not recognise maps to
/// [`PodPhase::Unknown`], which counts as finished (eligible for
/// replacement).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Completed,
    Failed,
    Error,
    Terminating,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PodPhase {
    /// Whether the pod has reached a terminal phase and must be
    /// replaced before it can be used again.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            Self::Succeeded
                | Self::Completed
                | Self::Failed
                | Self::Error
                | Self::Terminating
                | Self::Unknown
        )
    }

    /// Whether the pod can accept exec commands.
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}
