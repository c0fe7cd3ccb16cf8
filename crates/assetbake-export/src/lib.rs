//! assetbake export pipeline
//!
//! Adapters around the container format:
//! - texture import, mip generation, BC1-BC5 compression and PNG/TGA/BMP previews
//! - JSON material and scene documents
//! - image and mesh bakes that tie both to the container codecs

pub mod documents;
pub mod pipeline;
pub mod textures;

pub use documents::{DocumentError, DocumentStore, MaterialDocument, SceneDocument, SceneNode};
pub use pipeline::{bake_image, bake_mesh, BakeError, BakeImageOptions};
pub use textures::{ImageFormat, TextureConvertOptions, TextureConverter, TextureError};
