//! Tile grid planner.
//!
//! Pure arithmetic that splits a `W x H` raster into a grid of
//! fixed-size cells. Each cell carries its source rectangle plus the
//! right/bottom padding needed to reach a full tile, so the renderer
//! never has to re-derive geometry.

use crate::error::CoreError;
use crate::naming::{split_base_ext, tile_file_name};

/// One cell of the tile grid.
///
/// The source rectangle always lies inside the image; `pad_right` /
/// `pad_bottom` are non-zero only for edge cells whose rectangle falls
/// short of a full tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub row: u32,
    pub column: u32,
    /// Left edge of the source rectangle, in pixels.
    pub left: u32,
    /// Top edge of the source rectangle, in pixels.
    pub top: u32,
    /// Source rectangle width; equals the tile size except on the right edge.
    pub width: u32,
    /// Source rectangle height; equals the tile size except on the bottom edge.
    pub height: u32,
    /// Transparent padding to append on the right (0 if none).
    pub pad_right: u32,
    /// Transparent padding to append on the bottom (0 if none).
    pub pad_bottom: u32,
    /// Output object name, e.g. `img_1_2.png`.
    pub file_name: String,
}

impl PlanEntry {
    /// Whether this cell needs padding to reach a full tile.
    pub fn needs_padding(&self) -> bool {
        self.pad_right > 0 || self.pad_bottom > 0
    }
}

/// Complete tiling plan for one source image.
#[derive(Debug, Clone)]
pub struct TilePlan {
    pub num_rows: u32,
    pub num_columns: u32,
    pub tile_size: u32,
    /// Entries in generation order: row-major, top-left to bottom-right.
    pub entries: Vec<PlanEntry>,
}

impl TilePlan {
    /// Total number of tiles in the plan.
    pub fn tile_count(&self) -> usize {
        self.entries.len()
    }
}

/// Plan the tile grid for an image of `width x height` pixels.
///
/// `source_name` is the original file name; tile names derive from it
/// by splitting on the last `.` and appending zero-padded row/column
/// indices.
pub fn plan_tiles(
    width: u32,
    height: u32,
    tile_size: u32,
    source_name: &str,
) -> Result<TilePlan, CoreError> {
    if width == 0 || height == 0 {
        return Err(CoreError::Validation(
            "Cannot calculate the tile grid: image has zero width or height".to_string(),
        ));
    }
    if tile_size == 0 {
        return Err(CoreError::Validation(
            "Tile size must be greater than zero".to_string(),
        ));
    }

    let num_columns = width.div_ceil(tile_size);
    let num_rows = height.div_ceil(tile_size);
    let (base, ext) = split_base_ext(source_name);

    let mut entries = Vec::with_capacity((num_rows * num_columns) as usize);
    for row in 0..num_rows {
        for column in 0..num_columns {
            let left = column * tile_size;
            let top = row * tile_size;
            let end_x = ((column + 1) * tile_size).min(width);
            let end_y = ((row + 1) * tile_size).min(height);
            let rect_width = end_x - left;
            let rect_height = end_y - top;

            entries.push(PlanEntry {
                row,
                column,
                left,
                top,
                width: rect_width,
                height: rect_height,
                pad_right: tile_size - rect_width,
                pad_bottom: tile_size - rect_height,
                file_name: tile_file_name(base, ext, row, column, num_rows, num_columns),
            });
        }
    }

    Ok(TilePlan {
        num_rows,
        num_columns,
        tile_size,
        entries,
    })
}
