//! Block compression of image cells
//!
//! BC1-BC5 are encoded with texpresso; cells are independent, so they are
//! compressed in parallel with rayon.

use assetbake_format::{Compression, ImageBuffer, MipCell, PixelType};
use rayon::prelude::*;

use crate::textures::{TextureError, TextureResult};

/// Turns an uncompressed image into a block-compressed one
pub trait TextureCompressor {
    /// Compress every cell of `image`. `Compression::None` returns a copy.
    fn compress(&self, image: &ImageBuffer, compression: Compression) -> TextureResult<ImageBuffer>;
}

/// texpresso-backed BC1-BC5 encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockCompressor {
    /// Weight color error by alpha (better for cutout textures)
    pub weigh_colour_by_alpha: bool,
}

impl BlockCompressor {
    /// texpresso format for a compression tag, if supported
    pub fn texpresso_format(compression: Compression) -> Option<texpresso::Format> {
        match compression {
            Compression::Bc1 => Some(texpresso::Format::Bc1),
            Compression::Bc2 => Some(texpresso::Format::Bc2),
            Compression::Bc3 => Some(texpresso::Format::Bc3),
            Compression::Bc4 => Some(texpresso::Format::Bc4),
            Compression::Bc5 => Some(texpresso::Format::Bc5),
            Compression::None | Compression::Bc6h | Compression::Bc7 => None,
        }
    }

    /// Channels a block format carries
    fn format_components(compression: Compression) -> u8 {
        match compression {
            Compression::Bc4 => 1,
            Compression::Bc5 => 2,
            _ => 4,
        }
    }
}

impl TextureCompressor for BlockCompressor {
    fn compress(&self, image: &ImageBuffer, compression: Compression) -> TextureResult<ImageBuffer> {
        if compression == Compression::None {
            return Ok(image.clone());
        }
        let format = Self::texpresso_format(compression)
            .ok_or(TextureError::UnsupportedCompression { compression })?;
        if image.compression().is_compressed() {
            return Err(TextureError::UnsupportedFormat(format!(
                "image is already {} compressed",
                image.compression()
            )));
        }
        if image.pixel_type() != PixelType::Unorm8 {
            return Err(TextureError::UnsupportedFormat(format!(
                "block compression needs unorm8 input, got {}",
                image.pixel_type()
            )));
        }

        let rgba = image.to_rgba_image()?;
        let sources: Vec<&MipCell> = rgba.cells().map(|(_, _, cell)| cell).collect();

        let weigh_colour_by_alpha = self.weigh_colour_by_alpha;
        let cells = sources
            .par_iter()
            .map(|cell| {
                let (width, height) = (cell.width() as usize, cell.height() as usize);
                let mut output = vec![0u8; format.compressed_size(width, height)];
                let params = texpresso::Params {
                    weigh_colour_by_alpha,
                    ..Default::default()
                };
                format.compress(cell.data(), width, height, params, &mut output);
                MipCell::new(cell.width(), cell.height(), output)
            })
            .collect::<Vec<_>>();

        let compressed = ImageBuffer::from_cells(
            image.name(),
            PixelType::Unorm8,
            Self::format_components(compression),
            compression,
            image.array_slices(),
            image.mip_slices(),
            cells,
        )?;

        tracing::debug!(
            image = %image.name(),
            compression = %compression,
            raw_bytes = image.total_bytes(),
            compressed_bytes = compressed.total_bytes(),
            "Compressed image"
        );
        Ok(compressed)
    }
}
