//! Document-store seam for the pipeline.
//!
//! [`ProjectStore`] covers the handful of project/tile operations the
//! pipeline issues, so the coordinator and driver can run against
//! Postgres in production and an in-memory store in tests.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use satseg_core::error::CoreError;
use satseg_core::project::ProjectStatus;
use satseg_core::types::DbId;
use satseg_db::repositories::{AnnotationTileRepo, ProjectRepo};

use crate::PipelineError;

/// The slice of a project the pipeline needs.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub id: DbId,
    pub status: ProjectStatus,
    pub total_images: i64,
    /// Number of configured annotation classes, which sets the mask
    /// placeholder count on new tiles.
    pub annotation_class_count: usize,
}

/// Project and tile bookkeeping operations.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Fetch the pipeline-relevant slice of a project.
    async fn fetch_project(&self, id: DbId) -> Result<Option<ProjectSnapshot>, PipelineError>;

    /// Upsert one annotation-tile row per index in `[start, end)`,
    /// leaving existing rows untouched.
    async fn register_tiles(
        &self,
        project_id: DbId,
        start_index: i64,
        end_index: i64,
        class_count: usize,
    ) -> Result<(), PipelineError>;

    /// Add `by` to the project's tile counter. Targeting a missing
    /// project is a conflict.
    async fn increment_total_images(&self, project_id: DbId, by: i64)
        -> Result<(), PipelineError>;

    /// Set the project status. Targeting a missing project is a
    /// conflict.
    async fn set_status(
        &self,
        project_id: DbId,
        status: ProjectStatus,
    ) -> Result<(), PipelineError>;
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

/// [`ProjectStore`] backed by the satseg database.
#[derive(Clone)]
pub struct PgProjectStore {
    pool: sqlx::PgPool,
}

impl PgProjectStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn fetch_project(&self, id: DbId) -> Result<Option<ProjectSnapshot>, PipelineError> {
        let Some(project) = ProjectRepo::find_by_id(&self.pool, id).await? else {
            return Ok(None);
        };
        Ok(Some(ProjectSnapshot {
            id: project.id,
            status: ProjectStatus::parse(&project.status)?,
            total_images: project.total_images,
            annotation_class_count: project.annotation_classes.0.len(),
        }))
    }

    async fn register_tiles(
        &self,
        project_id: DbId,
        start_index: i64,
        end_index: i64,
        class_count: usize,
    ) -> Result<(), PipelineError> {
        AnnotationTileRepo::bulk_register(&self.pool, project_id, start_index, end_index, class_count)
            .await?;
        Ok(())
    }

    async fn increment_total_images(
        &self,
        project_id: DbId,
        by: i64,
    ) -> Result<(), PipelineError> {
        ProjectRepo::increment_total_images(&self.pool, project_id, by)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "Tile counter update targeted missing project {project_id}"
                ))
            })?;
        Ok(())
    }

    async fn set_status(
        &self,
        project_id: DbId,
        status: ProjectStatus,
    ) -> Result<(), PipelineError> {
        ProjectRepo::update_status(&self.pool, project_id, status)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "Status update targeted missing project {project_id}"
                ))
            })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (tests, local development)
// ---------------------------------------------------------------------------

/// In-memory state of one project.
#[derive(Debug, Clone)]
pub struct MemoryProject {
    pub status: ProjectStatus,
    pub total_images: i64,
    pub annotation_class_count: usize,
    /// Registered tile indices.
    pub tiles: BTreeSet<i64>,
    /// Every `[start, end)` range passed to `register_tiles`, in call
    /// order.
    pub registered_ranges: Vec<(i64, i64)>,
}

/// [`ProjectStore`] holding everything in a process-local map.
#[derive(Default)]
pub struct MemoryProjectStore {
    projects: Mutex<HashMap<DbId, MemoryProject>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project in DRAFT status with no tiles.
    pub async fn seed_project(&self, id: DbId, annotation_class_count: usize) {
        self.projects.lock().await.insert(
            id,
            MemoryProject {
                status: ProjectStatus::Draft,
                total_images: 0,
                annotation_class_count,
                tiles: BTreeSet::new(),
                registered_ranges: Vec::new(),
            },
        );
    }

    /// Current state of a project, for assertions.
    pub async fn project(&self, id: DbId) -> Option<MemoryProject> {
        self.projects.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn fetch_project(&self, id: DbId) -> Result<Option<ProjectSnapshot>, PipelineError> {
        Ok(self.projects.lock().await.get(&id).map(|p| ProjectSnapshot {
            id,
            status: p.status,
            total_images: p.total_images,
            annotation_class_count: p.annotation_class_count,
        }))
    }

    async fn register_tiles(
        &self,
        project_id: DbId,
        start_index: i64,
        end_index: i64,
        _class_count: usize,
    ) -> Result<(), PipelineError> {
        let mut projects = self.projects.lock().await;
        let project = projects.get_mut(&project_id).ok_or_else(|| {
            CoreError::Conflict(format!(
                "Tile registration targeted missing project {project_id}"
            ))
        })?;
        project.registered_ranges.push((start_index, end_index));
        // Insert-only: indices already present keep their content.
        for index in start_index..end_index {
            project.tiles.insert(index);
        }
        Ok(())
    }

    async fn increment_total_images(
        &self,
        project_id: DbId,
        by: i64,
    ) -> Result<(), PipelineError> {
        let mut projects = self.projects.lock().await;
        let project = projects.get_mut(&project_id).ok_or_else(|| {
            CoreError::Conflict(format!(
                "Tile counter update targeted missing project {project_id}"
            ))
        })?;
        project.total_images += by;
        Ok(())
    }

    async fn set_status(
        &self,
        project_id: DbId,
        status: ProjectStatus,
    ) -> Result<(), PipelineError> {
        let mut projects = self.projects.lock().await;
        let project = projects.get_mut(&project_id).ok_or_else(|| {
            CoreError::Conflict(format!(
                "Status update targeted missing project {project_id}"
            ))
        })?;
        project.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_tiles_is_idempotent() {
        let store = MemoryProjectStore::new();
        store.seed_project(1, 2).await;

        store.register_tiles(1, 0, 5, 2).await.unwrap();
        store.register_tiles(1, 0, 5, 2).await.unwrap();

        let project = store.project(1).await.unwrap();
        assert_eq!(project.tiles.len(), 5);
        assert_eq!(project.registered_ranges, vec![(0, 5), (0, 5)]);
    }

    #[tokio::test]
    async fn increment_on_missing_project_is_a_conflict() {
        let store = MemoryProjectStore::new();
        let err = store.increment_total_images(99, 3).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Core(CoreError::Conflict(_))
        ));
    }
}
