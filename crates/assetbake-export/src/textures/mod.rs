//! Texture import, mip generation, block compression and previews
//!
//! Sources are decoded with the `image` crate into an [`ImageBuffer`],
//! optionally expanded with a mip chain and block-compressed, then handed to
//! the container codec. Baked images can be decoded back to RGBA8 previews.
//!
//! [`ImageBuffer`]: assetbake_format::ImageBuffer

mod compressor;
mod converter;
mod decompressor;
mod import;
mod mips;

pub use compressor::{BlockCompressor, TextureCompressor};
pub use converter::{ImageFormat, TextureConvertOptions, TextureConverter};
pub use decompressor::{decompress_bc, decode_cell_rgba8};
pub use import::{image_from_dynamic, load_image};
pub use mips::{MipGenerator, ResampleMipGenerator};

use assetbake_format::Compression;
use thiserror::Error;

/// Texture conversion errors
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Asset(#[from] assetbake_core::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Compression {compression} is not available in this build")]
    UnsupportedCompression { compression: Compression },

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid mipmap level: {level} (max: {max})")]
    InvalidMipLevel { level: usize, max: usize },
}

pub type TextureResult<T> = Result<T, TextureError>;
