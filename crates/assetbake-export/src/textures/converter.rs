//! Texture preview writer
//!
//! Converts baked images to PNG, TGA, and BMP for inspection.

use std::path::{Path, PathBuf};

use assetbake_format::ImageBuffer;
use image::{DynamicImage, ImageFormat as ImgFormat, RgbaImage};

use crate::textures::{decompressor, TextureError, TextureResult};

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format (lossless, good compression)
    Png,
    /// TGA format (lossless, simple)
    Tga,
    /// BMP format (lossless, no compression)
    Bmp,
}

impl ImageFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Tga => "tga",
            ImageFormat::Bmp => "bmp",
        }
    }

    /// Parse a format name or extension
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "tga" => Some(ImageFormat::Tga),
            "bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    /// Convert to image crate's format
    fn to_img_format(self) -> ImgFormat {
        match self {
            ImageFormat::Png => ImgFormat::Png,
            ImageFormat::Tga => ImgFormat::Tga,
            ImageFormat::Bmp => ImgFormat::Bmp,
        }
    }
}

/// Texture conversion options
#[derive(Debug, Clone)]
pub struct TextureConvertOptions {
    /// Output format
    pub format: ImageFormat,

    /// Array slice to export
    pub slice: usize,

    /// Include mipmaps (export multiple files)
    pub include_mipmaps: bool,

    /// Flip Y axis (useful for normal maps)
    pub flip_y: bool,

    /// Maximum mipmap level to export (0 = only main texture)
    pub max_mip_level: Option<usize>,

    /// Handle normal maps (convert from DX to OpenGL format)
    pub convert_normal_map: bool,
}

impl Default for TextureConvertOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            slice: 0,
            include_mipmaps: false,
            flip_y: false,
            max_mip_level: None,
            convert_normal_map: false,
        }
    }
}

/// Texture converter
#[derive(Debug, Clone, Default)]
pub struct TextureConverter {
    options: TextureConvertOptions,
}

impl TextureConverter {
    /// Create new converter with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create converter with custom options
    pub fn with_options(options: TextureConvertOptions) -> Self {
        Self { options }
    }

    /// Write previews of one array slice
    ///
    /// # Arguments
    ///
    /// * `image` - Baked image to convert
    /// * `output_path` - Output file path (extension will be replaced)
    ///
    /// # Returns
    ///
    /// Paths written (one for the main level, more if mipmaps included)
    pub fn convert(&self, image: &ImageBuffer, output_path: impl AsRef<Path>) -> TextureResult<Vec<PathBuf>> {
        let output_path = output_path.as_ref();
        let last = image.mip_slices().saturating_sub(1);

        // Determine how many mip levels to export
        let max_level = if self.options.include_mipmaps {
            self.options.max_mip_level.map(|limit| limit.min(last)).unwrap_or(last)
        } else {
            0
        };

        let mut written = Vec::with_capacity(max_level + 1);
        for level in 0..=max_level {
            let output_file = if level == 0 {
                output_path.with_extension(self.options.format.extension())
            } else {
                let stem = output_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("texture");
                let parent = output_path.parent().unwrap_or(Path::new("."));
                parent.join(format!("{}_mip{}.{}", stem, level, self.options.format.extension()))
            };

            self.extract_mipmap(image, level, &output_file)?;
            written.push(output_file);
        }

        tracing::info!(image = %image.name(), files = written.len(), "Wrote previews");
        Ok(written)
    }

    /// Extract specific mipmap level as standalone image
    pub fn extract_mipmap(&self, image: &ImageBuffer, level: usize, output_path: impl AsRef<Path>) -> TextureResult<()> {
        if level >= image.mip_slices() {
            return Err(TextureError::InvalidMipLevel {
                level,
                max: image.mip_slices().saturating_sub(1),
            });
        }
        let (width, height) = image.dimensions(self.options.slice, level)?;
        let rgba = decompressor::decode_cell_rgba8(image, self.options.slice, level)?;

        let mut img = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            TextureError::DecompressionFailed("Failed to create image from decoded data".to_string())
        })?;

        // Apply transformations
        if self.options.flip_y {
            image::imageops::flip_vertical_in_place(&mut img);
        }

        if self.options.convert_normal_map {
            convert_normal_map_format(&mut img);
        }

        DynamicImage::ImageRgba8(img).save_with_format(output_path.as_ref(), self.options.format.to_img_format())?;
        Ok(())
    }
}

/// Convert normal map from DirectX format (Y+) to OpenGL format (Y-)
///
/// In DirectX, green channel points up (+Y), in OpenGL it points down (-Y)
fn convert_normal_map_format(img: &mut RgbaImage) {
    for pixel in img.pixels_mut() {
        pixel[1] = 255 - pixel[1];
    }
}
