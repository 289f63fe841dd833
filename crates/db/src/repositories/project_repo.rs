//! Repository for the `projects` table.

use sqlx::types::Json;
use sqlx::PgPool;

use satseg_core::project::{ProjectStatus, TrainingStatus};
use satseg_core::types::DbId;

use crate::models::project::{CreateProject, Project};

/// Column list for projects queries.
const COLUMNS: &str = "id, name, description, status, training_status, total_images, \
    suggest_image_indices, annotation_classes, training_progress, avg_dice_score, \
    error_dice_score, avg_precision, avg_recall, annotation_updated_at, \
    metric_updated_at, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Create a new project in DRAFT status, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, description, status, training_status, annotation_classes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(ProjectStatus::Draft.as_str())
            .bind(TrainingStatus::Stop.as_str())
            .bind(Json(&input.annotation_classes))
            .fetch_one(pool)
            .await
    }

    /// Find a project by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set a project's status, returning the updated row.
    ///
    /// Returns `None` when the project no longer exists (the caller
    /// decides whether that is a conflict).
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET status = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(status.as_str())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically increment `total_images`, returning the updated row.
    ///
    /// The counter is monotone: ingestion only ever adds tiles.
    pub async fn increment_total_images(
        pool: &PgPool,
        id: DbId,
        by: i64,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET total_images = total_images + $1, updated_at = NOW()
             WHERE id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(by)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
