//! PNG tile codec.
//!
//! Tiles are stored losslessly so that transparent padding on edge tiles
//! survives a round trip through a persisted tile set.
//!
//! # Design Decisions
//!
//! - **Fixed tile size**: every encoded tile is exactly `TILE_SIZE x TILE_SIZE`.
//!   Edge tiles are cropped to their true extent and placed on a transparent
//!   canvas at (0, 0), so consumers never need per-tile sizes.
//!
//! - **RGBA only**: the builder converts sources to RGBA8 before tiling, and the
//!   decoder always hands back RGBA8 whatever the stored color type is.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{imageops, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbaImage};

use crate::error::{BuildError, TileError};

use super::layout::TILE_SIZE;

// =============================================================================
// Tile Extraction
// =============================================================================

/// Cut one tile out of a level bitmap and pad it to `TILE_SIZE x TILE_SIZE`.
///
/// `x`/`y` are the tile's top-left corner in level pixels; `width`/`height`
/// are its true extent (at most `TILE_SIZE`).
pub fn extract_tile(level: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    let cropped = imageops::crop_imm(level, x, y, width, height).to_image();
    if width == TILE_SIZE && height == TILE_SIZE {
        return cropped;
    }

    let mut canvas = RgbaImage::new(TILE_SIZE, TILE_SIZE);
    imageops::replace(&mut canvas, &cropped, 0, 0);
    canvas
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a tile as PNG.
pub fn encode_tile(tile: &RgbaImage) -> Result<Bytes, BuildError> {
    let mut output = Vec::new();
    PngEncoder::new(&mut output)
        .write_image(
            tile.as_raw(),
            tile.width(),
            tile.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| BuildError::Encode {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output))
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode tile bytes to RGBA and check they are `TILE_SIZE x TILE_SIZE`.
///
/// # Errors
///
/// Returns an error if:
/// - The data is not a valid PNG
/// - The decoded image is not exactly one tile in size
pub fn decode_tile(data: &[u8]) -> Result<RgbaImage, TileError> {
    let reader = ImageReader::with_format(Cursor::new(data), ImageFormat::Png);
    let img = reader.decode().map_err(|e| TileError::Decode {
        message: e.to_string(),
    })?;

    if img.width() != TILE_SIZE || img.height() != TILE_SIZE {
        return Err(TileError::InvalidDimensions {
            width: img.width(),
            height: img.height(),
            expected: TILE_SIZE,
        });
    }

    Ok(img.into_rgba8())
}

/// Read the stored dimensions of an encoded tile without decoding pixels.
pub fn tile_dimensions(data: &[u8]) -> Result<(u32, u32), TileError> {
    let reader = ImageReader::with_format(Cursor::new(data), ImageFormat::Png);
    reader.into_dimensions().map_err(|e| TileError::Decode {
        message: e.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
