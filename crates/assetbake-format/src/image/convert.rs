//! Pixel format conversion engine
//!
//! Cell bytes are viewed as fixed-stride pixel records whose channel width
//! follows the image's [`PixelType`]. Half-float data is never decoded; a
//! 16-bit channel is moved around as its raw bit pattern.

use assetbake_core::{Error, Result};
use bytemuck::Pod;

use super::{ImageBuffer, MipCell, PixelType};

/// A channel storage type the conversion engine can move around
pub trait Channel: Pod {
    /// Value written into a synthesized alpha channel
    const MAX: Self;
}

impl Channel for u8 {
    const MAX: Self = u8::MAX;
}

impl Channel for u16 {
    const MAX: Self = u16::MAX;
}

impl Channel for u32 {
    const MAX: Self = u32::MAX;
}

/// Reorder the four channels of every pixel: `out[i] = in[map[i]]`
fn permute_pixels<T: Channel>(bytes: &mut [u8], map: [usize; 4]) {
    let width = std::mem::size_of::<T>();
    for pixel in bytes.chunks_exact_mut(width * 4) {
        let src: [T; 4] = std::array::from_fn(|i| {
            bytemuck::pod_read_unaligned(&pixel[i * width..(i + 1) * width])
        });
        for (i, &from) in map.iter().enumerate() {
            pixel[i * width..(i + 1) * width].copy_from_slice(bytemuck::bytes_of(&src[from]));
        }
    }
}

/// Widen `components`-channel pixels to four channels
fn expand_to_rgba<T: Channel>(bytes: &[u8], components: usize) -> Vec<u8> {
    let width = std::mem::size_of::<T>();
    let pixel_count = bytes.len() / (width * components);
    let mut out = Vec::with_capacity(pixel_count * width * 4);
    let zero = T::zeroed();

    for pixel in bytes.chunks_exact(width * components) {
        out.extend_from_slice(pixel);
        for _ in components..3 {
            out.extend_from_slice(bytemuck::bytes_of(&zero));
        }
        out.extend_from_slice(bytemuck::bytes_of(&T::MAX));
    }
    out
}

fn permute_for(pixel_type: PixelType, bytes: &mut [u8], map: [usize; 4]) {
    match pixel_type {
        PixelType::Unorm8 => permute_pixels::<u8>(bytes, map),
        PixelType::Half16 => permute_pixels::<u16>(bytes, map),
        PixelType::Float32 => permute_pixels::<u32>(bytes, map),
    }
}

impl ImageBuffer {
    /// Swap channels 0 and 2 of every pixel in one cell
    pub fn to_bgra(&mut self, slice: usize, mip: usize) -> Result<()> {
        self.check_four_component("to_bgra")?;
        let pixel_type = self.pixel_type;
        let cell = self.cell_mut(slice, mip)?;
        permute_for(pixel_type, cell.data_mut(), [2, 1, 0, 3]);
        tracing::trace!(slice, mip, "swizzled cell to BGRA");
        Ok(())
    }

    /// Rotate ARGB pixels into RGBA order in one cell
    pub fn argb_to_rgba(&mut self, slice: usize, mip: usize) -> Result<()> {
        self.check_four_component("argb_to_rgba")?;
        let pixel_type = self.pixel_type;
        let cell = self.cell_mut(slice, mip)?;
        permute_for(pixel_type, cell.data_mut(), [1, 2, 3, 0]);
        tracing::trace!(slice, mip, "rotated cell from ARGB");
        Ok(())
    }

    /// Write a four-component version of one cell into `target`.
    ///
    /// `target` must already be allocated with four components, the same
    /// pixel type, and a cell of matching dimensions at `(slice, mip)`. Its
    /// cell is replaced wholesale. Missing color channels are zero and
    /// alpha is set to the channel type's maximum. A cell that already has
    /// four components is copied without conversion.
    pub fn to_rgba(&self, target: &mut ImageBuffer, slice: usize, mip: usize) -> Result<()> {
        if self.compression.is_compressed() {
            return Err(Error::unsupported_conversion(format!(
                "to_rgba on {} compressed data",
                self.compression
            )));
        }
        if target.compression.is_compressed() || target.components != 4 {
            return Err(Error::unsupported_conversion(format!(
                "to_rgba target must be uncompressed with 4 components, got {} with {}",
                target.compression, target.components
            )));
        }
        if target.pixel_type != self.pixel_type {
            return Err(Error::unsupported_conversion(format!(
                "to_rgba cannot change pixel type ({} -> {})",
                self.pixel_type, target.pixel_type
            )));
        }

        let source = self.cell(slice, mip)?;
        let data = match self.components {
            4 => source.data().to_vec(),
            components @ 1..=3 => {
                let components = components as usize;
                match self.pixel_type {
                    PixelType::Unorm8 => expand_to_rgba::<u8>(source.data(), components),
                    PixelType::Half16 => expand_to_rgba::<u16>(source.data(), components),
                    PixelType::Float32 => expand_to_rgba::<u32>(source.data(), components),
                }
            }
            other => {
                return Err(Error::unsupported_conversion(format!(
                    "to_rgba with {} components",
                    other
                )))
            }
        };

        target.replace_cell(slice, mip, MipCell::new(source.width(), source.height(), data))
    }

    /// Build a four-component copy of the whole image
    pub fn to_rgba_image(&self) -> Result<ImageBuffer> {
        let (width, height) = self.base_dimensions();
        let mut target = ImageBuffer::allocated(
            self.name.clone(),
            self.pixel_type,
            width,
            height,
            4,
            self.array_slices,
            self.mip_slices,
        )?;
        for slice in 0..self.array_slices {
            for mip in 0..self.mip_slices {
                self.to_rgba(&mut target, slice, mip)?;
            }
        }
        Ok(target)
    }

    fn check_four_component(&self, operation: &str) -> Result<()> {
        if self.compression.is_compressed() {
            return Err(Error::unsupported_conversion(format!(
                "{} on {} compressed data",
                operation, self.compression
            )));
        }
        if self.components != 4 {
            return Err(Error::unsupported_conversion(format!(
                "{} needs 4 components, image has {}",
                operation, self.components
            )));
        }
        Ok(())
    }
}
