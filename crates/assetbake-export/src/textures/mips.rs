//! Mip chain generation

use assetbake_format::image::{max_mip_levels, mip_dimensions};
use assetbake_format::{ImageBuffer, MipCell};
use image::imageops::FilterType;

use crate::textures::import::{cell_to_dynamic, raw_pixels};
use crate::textures::{TextureError, TextureResult};

/// Produces a full mip grid from an image's base level
pub trait MipGenerator {
    /// Build a new image with `mip_count` levels per slice, where level 0
    /// is copied from `image`. A `mip_count` of 0 means the full chain.
    fn generate(&self, image: &ImageBuffer, mip_count: usize) -> TextureResult<ImageBuffer>;
}

/// Resamples each level from the base level with an `image` crate filter
#[derive(Debug, Clone, Copy)]
pub struct ResampleMipGenerator {
    pub filter: FilterType,
}

impl Default for ResampleMipGenerator {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl MipGenerator for ResampleMipGenerator {
    fn generate(&self, image: &ImageBuffer, mip_count: usize) -> TextureResult<ImageBuffer> {
        if image.compression().is_compressed() {
            return Err(TextureError::UnsupportedFormat(format!(
                "cannot resample {} compressed data",
                image.compression()
            )));
        }
        let (width, height) = image.base_dimensions();
        let max = max_mip_levels(width, height);
        let levels = if mip_count == 0 { max } else { mip_count };
        if levels > max {
            return Err(TextureError::InvalidMipLevel { level: levels - 1, max: max.saturating_sub(1) });
        }

        let mut cells = Vec::with_capacity(image.array_slices() * levels);
        for slice in 0..image.array_slices() {
            let base = image.cell(slice, 0)?;
            let source = cell_to_dynamic(image.pixel_type(), image.components(), width, height, base.data())?;
            cells.push(base.clone());

            for level in 1..levels {
                let (w, h) = mip_dimensions(width, height, level);
                let resized = source.resize_exact(w, h, self.filter);
                let (_, _, bytes) = raw_pixels(&resized);
                cells.push(MipCell::new(w, h, bytes));
            }
        }

        tracing::debug!(
            image = %image.name(),
            slices = image.array_slices(),
            levels,
            "Generated mip chain"
        );
        Ok(ImageBuffer::from_cells(
            image.name(),
            image.pixel_type(),
            image.components(),
            image.compression(),
            image.array_slices(),
            levels,
            cells,
        )?)
    }
}
