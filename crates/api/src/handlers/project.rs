//! Handlers for project CRUD and the tile ingestion trigger.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use satseg_core::error::CoreError;
use satseg_core::types::DbId;
use satseg_db::models::project::CreateProject;
use satseg_db::repositories::{AnnotationTileRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Verify that a project exists, returning the full row.
async fn ensure_project_exists(
    pool: &sqlx::PgPool,
    id: DbId,
) -> AppResult<satseg_db::models::project::Project> {
    ProjectRepo::find_by_id(pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        })
    })
}

// ---------------------------------------------------------------------------
// POST /projects
// ---------------------------------------------------------------------------

/// Create a new project in DRAFT status.
pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Project name must not be empty".to_string(),
        )));
    }
    let project = ProjectRepo::create(&state.pool, &input).await?;
    Ok(Json(DataResponse { data: project }))
}

// ---------------------------------------------------------------------------
// GET /projects/{id}
// ---------------------------------------------------------------------------

/// Fetch a project by ID.
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = ensure_project_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: project }))
}

// ---------------------------------------------------------------------------
// POST /projects/{id}/split-images
// ---------------------------------------------------------------------------

/// Request body for the ingestion trigger: file names already staged in
/// the originals container under `{project_id}/`.
#[derive(Debug, Deserialize, Validate)]
pub struct SplitImagesRequest {
    #[validate(length(min = 1, message = "file_names must not be empty"))]
    pub file_names: Vec<String>,
}

/// Split every staged file into tiles, persist them, and provision the
/// training pod on the project's first upload.
///
/// Responds with a plain status message; errors surface as the standard
/// envelope with a string rendering only.
pub async fn split_images(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SplitImagesRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .pipeline
        .split_and_upload_images(id, &input.file_names)
        .await?;

    Ok(Json(DataResponse {
        data: format!(
            "Project {id}: split and uploaded {} file(s)",
            input.file_names.len()
        ),
    }))
}

// ---------------------------------------------------------------------------
// GET /projects/{id}/tiles
// ---------------------------------------------------------------------------

/// List the annotation tiles registered for a project.
pub async fn list_tiles(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_project_exists(&state.pool, id).await?;
    let tiles = AnnotationTileRepo::list_by_project(&state.pool, id).await?;
    Ok(Json(DataResponse { data: tiles }))
}

// ---------------------------------------------------------------------------
// GET /projects/{id}/tiles/{index}
// ---------------------------------------------------------------------------

/// Fetch one annotation tile by its index within the project.
pub async fn get_tile(
    State(state): State<AppState>,
    Path((id, index)): Path<(DbId, i64)>,
) -> AppResult<impl IntoResponse> {
    let tile = AnnotationTileRepo::find_by_index(&state.pool, id, index)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "AnnotationTile",
                id: index,
            })
        })?;
    Ok(Json(DataResponse { data: tile }))
}
