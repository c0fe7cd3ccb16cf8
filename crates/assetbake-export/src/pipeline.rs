//! End-to-end bakes: source files in, containers out
//!
//! ```text
//! image file ──► load_image ──► MipGenerator ──► (BGRA) ──► TextureCompressor ──► ImageCodec
//! topology   ──► material documents ──► MeshBuilder ──► MeshCodec
//! ```

use std::collections::HashMap;
use std::path::Path;

use assetbake_core::Error;
use assetbake_format::material::relative_path;
use assetbake_format::{AssetCodec, Compression, ImageBuffer, ImageCodec, MeshBuffer, MeshCodec, TopologySource};
use thiserror::Error as ThisError;

use crate::documents::{DocumentError, DocumentStore, MaterialDocument};
use crate::textures::{
    load_image, BlockCompressor, MipGenerator, ResampleMipGenerator, TextureCompressor, TextureError,
};

/// Bake errors
#[derive(ThisError, Debug)]
pub enum BakeError {
    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Asset(#[from] Error),
}

pub type BakeResult<T> = Result<T, BakeError>;

/// Image bake options
#[derive(Debug, Clone)]
pub struct BakeImageOptions {
    /// Mip levels to store; 0 means the full chain down to 1x1
    pub mip_count: usize,

    /// Block compression applied after mip generation
    pub compression: Compression,

    /// Store uncompressed pixels in BGRA order (expands to 4 components)
    pub bgra: bool,

    /// Weight color error by alpha when block compressing
    pub weigh_colour_by_alpha: bool,
}

impl Default for BakeImageOptions {
    fn default() -> Self {
        Self {
            mip_count: 1,
            compression: Compression::None,
            bgra: false,
            weigh_colour_by_alpha: false,
        }
    }
}

/// Decode `source`, build mips, swizzle or compress, and write a container
pub fn bake_image(source: &Path, output: &Path, options: &BakeImageOptions) -> BakeResult<ImageBuffer> {
    if options.bgra && options.compression.is_compressed() {
        return Err(TextureError::UnsupportedFormat(format!(
            "BGRA order cannot be combined with {} compression",
            options.compression
        ))
        .into());
    }

    let mut image = load_image(source)?;
    if options.mip_count != 1 {
        image = ResampleMipGenerator::default().generate(&image, options.mip_count)?;
    }

    if options.bgra {
        image = image.to_rgba_image()?;
        for slice in 0..image.array_slices() {
            for mip in 0..image.mip_slices() {
                image.to_bgra(slice, mip)?;
            }
        }
    }

    let compressor = BlockCompressor {
        weigh_colour_by_alpha: options.weigh_colour_by_alpha,
    };
    let image = compressor.compress(&image, options.compression)?;

    let bytes = ImageCodec.write_file(&image, output)?;
    tracing::info!(
        source = %source.display(),
        output = %output.display(),
        mips = image.mip_slices(),
        compression = %image.compression(),
        bytes,
        "Baked image"
    );
    Ok(image)
}

/// Build a mesh from `source`, write the material documents it uses into
/// `store`, and write the mesh container to `output`.
///
/// Each submesh's material path is taken as a store-relative document path.
/// Documents found in `materials` (keyed by material identity) are written
/// there; the stored references are rewritten relative to the container's
/// directory. Nothing is written unless the mesh builds.
pub fn bake_mesh(
    name: &str,
    source: &mut dyn TopologySource,
    materials: &HashMap<String, MaterialDocument>,
    store: &DocumentStore,
    output: &Path,
) -> BakeResult<MeshBuffer> {
    let container_dir = output.parent().unwrap_or_else(|| Path::new(""));
    let mut submeshes = source.submeshes()?;
    let mut rewritten: HashMap<String, String> = HashMap::new();
    let mut pending = Vec::new();

    for submesh in &mut submeshes {
        let Some(material) = submesh.material.as_mut() else {
            continue;
        };
        if let Some(path) = rewritten.get(&material.identity) {
            material.path = path.clone();
            continue;
        }

        let document_path = store.resolve(&material.path)?;
        let relative = relative_path(container_dir, &document_path).ok_or_else(|| {
            Error::invalid_data(format!(
                "material {} at {} is not reachable from {}",
                material.identity,
                document_path.display(),
                container_dir.display()
            ))
        })?;
        if let Some(document) = materials.get(&material.identity) {
            pending.push((material.path.clone(), document));
        }

        rewritten.insert(material.identity.clone(), relative.clone());
        material.path = relative;
    }

    let mesh = MeshBuffer::from_topology(name, &mut submeshes)?;
    for (path, document) in pending {
        store.write_material(&path, document)?;
    }
    let bytes = MeshCodec.write_file(&mesh, output)?;
    tracing::info!(
        mesh = %mesh.name,
        output = %output.display(),
        materials = mesh.materials.len(),
        bytes,
        "Baked mesh"
    );
    Ok(mesh)
}
