//! Tile naming convention engine.
//!
//! Generates deterministic object names for tiles cut from a source
//! image: `{base}_{row}_{column}.{ext}` with both indices zero-padded
//! to the width of the largest index in their dimension.

/// Zero-pad `index` to the width of the largest valid index, i.e.
/// `count - 1`.
///
/// # Examples
///
/// ```
/// use satseg_core::naming::pad_index;
///
/// assert_eq!(pad_index(3, 10), "3");
/// assert_eq!(pad_index(3, 11), "03");
/// assert_eq!(pad_index(0, 1), "0");
/// ```
pub fn pad_index(index: u32, count: u32) -> String {
    let width = count.saturating_sub(1).to_string().len();
    format!("{index:0width$}")
}

/// Split a file name on its last `.` into `(base, extension)`.
///
/// Returns `None` for the extension when the name has no dot.
pub fn split_base_ext(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((base, ext)) => (base, Some(ext)),
        None => (name, None),
    }
}

/// Build the output name for the tile at `(row, column)`.
pub fn tile_file_name(
    base: &str,
    ext: Option<&str>,
    row: u32,
    column: u32,
    num_rows: u32,
    num_columns: u32,
) -> String {
    let row_part = pad_index(row, num_rows);
    let col_part = pad_index(column, num_columns);
    match ext {
        Some(ext) => format!("{base}_{row_part}_{col_part}.{ext}"),
        None => format!("{base}_{row_part}_{col_part}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_width_tracks_largest_index() {
        // 10 rows -> largest index 9 -> width 1
        assert_eq!(pad_index(3, 10), "3");
        // 11 rows -> largest index 10 -> width 2
        assert_eq!(pad_index(3, 11), "03");
        assert_eq!(pad_index(10, 11), "10");
        // 101 rows -> width 3
        assert_eq!(pad_index(7, 101), "007");
    }

    #[test]
    fn pad_single_cell() {
        assert_eq!(pad_index(0, 1), "0");
    }

    #[test]
    fn split_simple_extension() {
        assert_eq!(split_base_ext("img.png"), ("img", Some("png")));
    }

    #[test]
    fn split_keeps_earlier_dots_in_base() {
        assert_eq!(
            split_base_ext("survey.2024.tiff"),
            ("survey.2024", Some("tiff"))
        );
    }

    #[test]
    fn split_without_extension() {
        assert_eq!(split_base_ext("rawdump"), ("rawdump", None));
    }

    #[test]
    fn tile_name_example() {
        assert_eq!(tile_file_name("img", Some("png"), 1, 2, 2, 3), "img_1_2.png");
    }

    #[test]
    fn tile_name_padded_grid() {
        // 12 rows x 3 columns: rows pad to 2 digits, columns to 1.
        assert_eq!(
            tile_file_name("img", Some("png"), 4, 2, 12, 3),
            "img_04_2.png"
        );
    }

    #[test]
    fn tile_name_without_extension() {
        assert_eq!(tile_file_name("img", None, 0, 0, 1, 1), "img_0_0");
    }
}
