//! Repository for the `annotation_tiles` table.

use sqlx::PgPool;

use satseg_core::types::DbId;

use crate::models::annotation_tile::AnnotationTile;

/// Column list for annotation_tiles queries.
const COLUMNS: &str = "id, project_id, image_index, masks, strokes, created_at, updated_at";

/// Provides CRUD operations for annotation tiles.
pub struct AnnotationTileRepo;

impl AnnotationTileRepo {
    /// Bulk-register annotation tiles for indices `[start, end)`.
    ///
    /// Each inserted row gets `class_count` empty mask placeholders and
    /// an empty stroke list. Rows whose `(project_id, image_index)` key
    /// already exists are left untouched, so re-running the same range
    /// is safe. Returns the number of rows actually inserted.
    pub async fn bulk_register(
        pool: &PgPool,
        project_id: DbId,
        start_index: i64,
        end_index: i64,
        class_count: usize,
    ) -> Result<u64, sqlx::Error> {
        if start_index >= end_index {
            return Ok(0);
        }

        let empty_masks: Vec<Vec<u8>> = vec![Vec::new(); class_count];
        let result = sqlx::query(
            "INSERT INTO annotation_tiles (project_id, image_index, masks, strokes)
             SELECT $1::bigint, idx, $4::bytea[], '[]'::jsonb
             FROM generate_series($2::bigint, $3::bigint - 1) AS idx
             ON CONFLICT (project_id, image_index) DO NOTHING",
        )
        .bind(project_id)
        .bind(start_index)
        .bind(end_index)
        .bind(&empty_masks)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Find one tile by its composite key.
    pub async fn find_by_index(
        pool: &PgPool,
        project_id: DbId,
        image_index: i64,
    ) -> Result<Option<AnnotationTile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotation_tiles
             WHERE project_id = $1 AND image_index = $2"
        );
        sqlx::query_as::<_, AnnotationTile>(&query)
            .bind(project_id)
            .bind(image_index)
            .fetch_optional(pool)
            .await
    }

    /// List all tiles for a project, ordered by image index ascending.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<AnnotationTile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotation_tiles
             WHERE project_id = $1
             ORDER BY image_index ASC"
        );
        sqlx::query_as::<_, AnnotationTile>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
