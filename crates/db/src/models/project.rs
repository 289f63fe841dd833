//! Project model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use satseg_core::project::AnnotationClass;
use satseg_core::types::{DbId, Timestamp};

/// A row from the `projects` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: String,
    /// TEXT column; parse with [`satseg_core::project::ProjectStatus::parse`].
    pub status: String,
    pub training_status: String,
    /// Authoritative count of persisted tiles.
    pub total_images: i64,
    pub suggest_image_indices: Vec<i64>,
    /// Ordered annotation-class list embedded as JSONB.
    pub annotation_classes: Json<Vec<AnnotationClass>>,
    pub training_progress: f64,
    pub avg_dice_score: f64,
    pub error_dice_score: f64,
    pub avg_precision: f64,
    pub avg_recall: f64,
    pub annotation_updated_at: Timestamp,
    pub metric_updated_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub annotation_classes: Vec<AnnotationClass>,
}
