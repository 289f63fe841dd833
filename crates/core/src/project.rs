//! Project lifecycle enums and the annotation-class definition.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Ingestion lifecycle of a project.
///
/// Stored as TEXT in the `projects.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Draft,
    Uploading,
    InProgress,
    Completing,
    Completed,
}

impl ProjectStatus {
    /// Database column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Uploading => "UPLOADING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completing => "COMPLETING",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parse from the database column value.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "DRAFT" => Ok(Self::Draft),
            "UPLOADING" => Ok(Self::Uploading),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETING" => Ok(Self::Completing),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(CoreError::Validation(format!(
                "Unknown project status '{other}'"
            ))),
        }
    }
}

/// Training lifecycle of a project's pod workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingStatus {
    Stop,
    Initializing,
    Running,
}

impl TrainingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::Initializing => "INITIALIZING",
            Self::Running => "RUNNING",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "STOP" => Ok(Self::Stop),
            "INITIALIZING" => Ok(Self::Initializing),
            "RUNNING" => Ok(Self::Running),
            other => Err(CoreError::Validation(format!(
                "Unknown training status '{other}'"
            ))),
        }
    }
}

/// One entry of a project's ordered annotation-class list.
///
/// Persisted inside the `projects.annotation_classes` JSONB column; the
/// number of classes determines how many mask placeholders each new
/// annotation tile receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationClass {
    pub id: String,
    pub name: String,
    /// Display color, e.g. `#ff0000`.
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hot_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [
            ProjectStatus::Draft,
            ProjectStatus::Uploading,
            ProjectStatus::InProgress,
            ProjectStatus::Completing,
            ProjectStatus::Completed,
        ] {
            assert_eq!(ProjectStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(ProjectStatus::parse("ARCHIVED").is_err());
    }

    #[test]
    fn training_status_round_trip() {
        for status in [
            TrainingStatus::Stop,
            TrainingStatus::Initializing,
            TrainingStatus::Running,
        ] {
            assert_eq!(TrainingStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn annotation_class_serde_shape() {
        let class: AnnotationClass = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Water",
            "color": "#0000ff",
        }))
        .unwrap();
        assert_eq!(class.name, "Water");
        assert!(class.hot_key.is_none());
    }
}
