//! Decoding source images into image buffers

use std::path::Path;

use assetbake_format::{ImageBuffer, PixelType};
use image::{DynamicImage, ImageBuffer as RasterBuffer};

use crate::textures::{TextureError, TextureResult};

/// Decode an image file into a single-slice, single-mip buffer named after
/// the file stem
pub fn load_image(path: &Path) -> TextureResult<ImageBuffer> {
    let decoded = image::open(path)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::debug!(
        path = %path.display(),
        width = decoded.width(),
        height = decoded.height(),
        color = ?decoded.color(),
        "Decoded source image"
    );
    image_from_dynamic(name, &decoded)
}

/// Copy a decoded image into a buffer, keeping its channel count.
///
/// 8-bit gray, gray-alpha, RGB and RGBA map to `Unorm8`; 32-bit float RGB
/// and RGBA map to `Float32`. Every other layout is converted to RGBA8.
pub fn image_from_dynamic(name: impl Into<String>, source: &DynamicImage) -> TextureResult<ImageBuffer> {
    let (pixel_type, components, bytes) = raw_pixels(source);
    let mut buffer = ImageBuffer::allocated(name, pixel_type, source.width(), source.height(), components, 1, 1)?;
    buffer.cell_mut(0, 0)?.data_mut().copy_from_slice(&bytes);
    Ok(buffer)
}

/// Pixel type, component count and little-endian bytes of a decoded image
pub(crate) fn raw_pixels(source: &DynamicImage) -> (PixelType, u8, Vec<u8>) {
    match source {
        DynamicImage::ImageLuma8(img) => (PixelType::Unorm8, 1, img.as_raw().clone()),
        DynamicImage::ImageLumaA8(img) => (PixelType::Unorm8, 2, img.as_raw().clone()),
        DynamicImage::ImageRgb8(img) => (PixelType::Unorm8, 3, img.as_raw().clone()),
        DynamicImage::ImageRgba8(img) => (PixelType::Unorm8, 4, img.as_raw().clone()),
        DynamicImage::ImageRgb32F(img) => (PixelType::Float32, 3, float_bytes(img.as_raw())),
        DynamicImage::ImageRgba32F(img) => (PixelType::Float32, 4, float_bytes(img.as_raw())),
        other => (PixelType::Unorm8, 4, other.to_rgba8().into_raw()),
    }
}

/// Wrap one uncompressed cell as a decoded image
pub(crate) fn cell_to_dynamic(
    pixel_type: PixelType,
    components: u8,
    width: u32,
    height: u32,
    bytes: &[u8],
) -> TextureResult<DynamicImage> {
    let unsupported = || TextureError::UnsupportedFormat(format!("{} with {} components", pixel_type, components));
    let image = match (pixel_type, components) {
        (PixelType::Unorm8, 1) => RasterBuffer::from_raw(width, height, bytes.to_vec()).map(DynamicImage::ImageLuma8),
        (PixelType::Unorm8, 2) => RasterBuffer::from_raw(width, height, bytes.to_vec()).map(DynamicImage::ImageLumaA8),
        (PixelType::Unorm8, 3) => RasterBuffer::from_raw(width, height, bytes.to_vec()).map(DynamicImage::ImageRgb8),
        (PixelType::Unorm8, 4) => RasterBuffer::from_raw(width, height, bytes.to_vec()).map(DynamicImage::ImageRgba8),
        (PixelType::Float32, 3) => RasterBuffer::from_raw(width, height, float_values(bytes)).map(DynamicImage::ImageRgb32F),
        (PixelType::Float32, 4) => RasterBuffer::from_raw(width, height, float_values(bytes)).map(DynamicImage::ImageRgba32F),
        _ => return Err(unsupported()),
    };
    image.ok_or(TextureError::InvalidDimensions { width, height })
}

fn float_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn float_values(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
