//! Annotation tile model.

use serde::Serialize;
use sqlx::FromRow;

use satseg_core::types::{DbId, Timestamp};

/// A row from the `annotation_tiles` table, keyed by
/// `(project_id, image_index)`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnnotationTile {
    pub id: DbId,
    pub project_id: DbId,
    /// Position of the tile in the project's global tile sequence.
    pub image_index: i64,
    /// One raster mask per annotation class; empty placeholders at
    /// creation.
    pub masks: Vec<Vec<u8>>,
    /// Freehand stroke list; see [`satseg_core::annotation::Stroke`].
    pub strokes: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
