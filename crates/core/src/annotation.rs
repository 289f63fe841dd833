//! Freehand annotation primitives stored on annotation tiles.
//!
//! The ingestion core only ever creates empty stroke lists; downstream
//! annotation editing fills them in. The shapes live here so the db
//! crate and any future editor share one definition.

use serde::{Deserialize, Serialize};

/// Drawing tool used for a freehand stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tool {
    Pen,
    Eraser,
}

/// One freehand stroke on a tile, referencing the annotation class it
/// belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    pub tool: Tool,
    /// Stroke width in pixels.
    pub size: f64,
    pub annotation_class_id: String,
    /// Flat `[x0, y0, x1, y1, ...]` point list in tile coordinates.
    pub points: Vec<f64>,
}
