//! assetbake-format
//!
//! In-memory buffer models for images and meshes, and the versioned binary
//! container they are baked into.
//!
//! # Contents
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`image`] | Multi-slice, multi-mip pixel storage and channel conversion |
//! | [`mesh`] | Shared vertex/index buffers partitioned into submeshes |
//! | [`material`] | Texture and material path references |
//! | [`container`] | Container header, writer sessions, image and mesh payloads |
//!
//! # Example
//!
//! ```rust,ignore
//! use assetbake_format::{AssetCodec, ImageBuffer, ImageCodec, PixelType};
//!
//! let image = ImageBuffer::allocated("albedo", PixelType::Unorm8, 256, 256, 4, 1, 9)?;
//! ImageCodec.write_file(&image, Path::new("albedo.ast"))?;
//!
//! let loaded = ImageCodec.read_file(Path::new("albedo.ast"))?;
//! assert_eq!(loaded.mip_slices(), 9);
//! ```

pub mod container;
pub mod image;
pub mod logging;
pub mod material;
pub mod mesh;
pub mod traits;

// Re-export main types
pub use traits::{AssetCodec, CodecOptions};

pub use container::{
    probe_header, read_asset, read_asset_file, Asset, AssetType, ContainerHeader, ImageCodec,
    MeshCodec, WriterSession, FORMAT_VERSION, SIGNATURE,
};
pub use image::{Compression, ImageBuffer, MipCell, PixelType};
pub use material::{MaterialRef, TextureRef, TextureRole};
pub use mesh::{
    ImportedSubmesh, MaterialSource, MeshBuffer, MeshBuilder, SkeletalVertex, Submesh,
    TopologySource, Vertex,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
