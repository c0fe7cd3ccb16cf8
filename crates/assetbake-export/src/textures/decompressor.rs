//! Decoding cells back to RGBA8
//!
//! Decompresses BC1-BC5 cells using the texpresso library and widens raw
//! cells to RGBA8 for previews.

use assetbake_format::{Compression, ImageBuffer, PixelType};

use crate::textures::compressor::BlockCompressor;
use crate::textures::{TextureError, TextureResult};

/// Decompress block-compressed data to RGBA8
pub fn decompress_bc(compression: Compression, data: &[u8], width: u32, height: u32) -> TextureResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(TextureError::InvalidDimensions { width, height });
    }
    let format = BlockCompressor::texpresso_format(compression)
        .ok_or(TextureError::UnsupportedCompression { compression })?;

    let (w, h) = (width as usize, height as usize);
    let expected = format.compressed_size(w, h);
    if data.len() != expected {
        return Err(TextureError::DecompressionFailed(format!(
            "{} data size mismatch: expected {}, got {}",
            compression,
            expected,
            data.len()
        )));
    }

    let mut output = vec![0u8; w * h * 4]; // RGBA8
    format.decompress(data, w, h, &mut output);
    Ok(output)
}

/// Decode one cell of any supported image to RGBA8 bytes.
///
/// Float cells are clamped to [0, 1]. Half-float cells are not decoded.
pub fn decode_cell_rgba8(image: &ImageBuffer, slice: usize, mip: usize) -> TextureResult<Vec<u8>> {
    let cell = image.cell(slice, mip)?;
    if image.compression().is_compressed() {
        return decompress_bc(image.compression(), cell.data(), cell.width(), cell.height());
    }

    match image.pixel_type() {
        PixelType::Unorm8 => {
            let mut target = ImageBuffer::allocated(
                image.name(),
                PixelType::Unorm8,
                cell.width(),
                cell.height(),
                4,
                1,
                1,
            )?;
            let single = ImageBuffer::from_cells(
                image.name(),
                PixelType::Unorm8,
                image.components(),
                Compression::None,
                1,
                1,
                vec![cell.clone()],
            )?;
            single.to_rgba(&mut target, 0, 0)?;
            Ok(target.cell(0, 0)?.data().to_vec())
        }
        PixelType::Float32 => {
            let components = image.components() as usize;
            let mut output = Vec::with_capacity(cell.data().len() / components);
            for pixel in cell.data().chunks_exact(components * 4) {
                let mut rgba = [0u8, 0, 0, 255];
                for (slot, value) in pixel.chunks_exact(4).enumerate() {
                    let v = f32::from_le_bytes([value[0], value[1], value[2], value[3]]);
                    rgba[slot] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                }
                output.extend_from_slice(&rgba);
            }
            Ok(output)
        }
        PixelType::Half16 => Err(TextureError::UnsupportedFormat(
            "half-float cells have no RGBA8 preview".to_string(),
        )),
    }
}
