//! Tile renderer.
//!
//! Decodes the staged source image (with transparent support for the
//! legacy bitmap container), extracts each planned rectangle, and pads
//! edge tiles with transparent pixels so every produced tile is exactly
//! tile-size square. Decoded pixel buffers live only as long as the
//! renderer borrowing them, so per-image memory is released when the
//! driver moves to the next file, on success and error paths alike.

use std::io::Cursor;

use image::codecs::bmp::BmpDecoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

use satseg_core::error::CoreError;
use satseg_core::naming::split_base_ext;
use satseg_core::tiling::PlanEntry;

use crate::PipelineError;

/// `BM` file signature of the legacy bitmap container.
const BMP_SIGNATURE: [u8; 2] = [0x42, 0x4D];

/// One encoded tile, paired with its planned object name.
#[derive(Debug, Clone)]
pub struct RenderedTile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Whether the buffer starts with the legacy bitmap signature.
pub fn is_bitmap(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[..2] == BMP_SIGNATURE
}

/// Decode a source buffer into pixels.
///
/// Legacy bitmap containers are routed through the dedicated BMP
/// decoder; everything else goes through format sniffing and the
/// general decode path. An undeterminable format is a validation
/// error, not a decode error.
pub fn decode_source(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if is_bitmap(bytes) {
        let decoder = BmpDecoder::new(Cursor::new(bytes))?;
        return Ok(DynamicImage::from_decoder(decoder)?);
    }

    let format = image::guess_format(bytes).map_err(|_| {
        PipelineError::Core(CoreError::Validation(
            "Missing image format: cannot determine source encoding".to_string(),
        ))
    })?;
    Ok(image::load_from_memory_with_format(bytes, format)?)
}

/// Renders plan entries against one decoded source image.
pub struct TileRenderer<'a> {
    source: &'a DynamicImage,
    tile_size: u32,
}

impl<'a> TileRenderer<'a> {
    pub fn new(source: &'a DynamicImage, tile_size: u32) -> Self {
        Self { source, tile_size }
    }

    /// Produce the encoded tile for one plan entry.
    ///
    /// Padded cells are composited onto a transparent canvas of exactly
    /// `tile_size x tile_size`; full cells are used unmodified.
    pub fn render(&self, entry: &PlanEntry) -> Result<RenderedTile, PipelineError> {
        let region = self
            .source
            .crop_imm(entry.left, entry.top, entry.width, entry.height);

        let tile = if entry.needs_padding() {
            let mut canvas = RgbaImage::new(self.tile_size, self.tile_size);
            image::imageops::replace(&mut canvas, &region.to_rgba8(), 0, 0);
            DynamicImage::ImageRgba8(canvas)
        } else {
            region
        };

        Ok(RenderedTile {
            file_name: entry.file_name.clone(),
            bytes: encode_tile(tile, target_format(&entry.file_name))?,
        })
    }
}

/// Pick the output encoding from the planned file extension, falling
/// back to PNG for unknown extensions.
fn target_format(file_name: &str) -> ImageFormat {
    match split_base_ext(file_name) {
        (_, Some(ext)) => ImageFormat::from_extension(ext).unwrap_or(ImageFormat::Png),
        (_, None) => ImageFormat::Png,
    }
}

/// Encode a tile into the target format.
fn encode_tile(tile: DynamicImage, format: ImageFormat) -> Result<Vec<u8>, PipelineError> {
    // JPEG carries no alpha channel.
    let tile = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(tile.to_rgb8()),
        _ => tile,
    };
    let mut buffer = Cursor::new(Vec::new());
    tile.write_to(&mut buffer, format)?;
    Ok(buffer.into_inner())
}
