//! Binary asset container
//!
//! One container holds exactly one image or one mesh. All multi-byte
//! values are little-endian.
//!
//! # Container Header (6 bytes)
//! ```text
//! Offset  Size  Description
//! 0x00    3     Signature "ast"
//! 0x03    1     Reserved (0)
//! 0x04    1     Format version (1)
//! 0x05    1     Asset type (0 = image, 1 = mesh)
//! ```
//! The asset payload follows immediately; see [`ImageCodec`] and
//! [`MeshCodec`] for their layouts.

mod image;
pub mod io;
mod mesh;
mod session;

pub use image::ImageCodec;
pub use mesh::MeshCodec;
pub use session::{partial_path, write_container_file, WriterSession};

use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use assetbake_core::{Error, Result};
use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::image::ImageBuffer;
use crate::mesh::MeshBuffer;
use crate::traits::{AssetCodec, CodecOptions};

/// Container signature
pub const SIGNATURE: [u8; 3] = *b"ast";

/// Container format version this crate reads and writes
pub const FORMAT_VERSION: u8 = 1;

/// Size of [`ContainerHeader`] on disk
pub const HEADER_SIZE: usize = 6;

/// Fixed length of mesh and submesh name buffers
pub const NAME_LEN: usize = 150;

/// Fixed length of a material path record
pub const PATH_LEN: usize = 260;

/// Asset kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AssetType {
    /// [`ImageBuffer`](crate::image::ImageBuffer) payload
    Image = 0,
    /// [`MeshBuffer`](crate::mesh::MeshBuffer) payload
    Mesh = 1,
}

impl AssetType {
    /// Tag value stored in the container header
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a header tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(AssetType::Image),
            1 => Some(AssetType::Mesh),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Image => f.write_str("image"),
            AssetType::Mesh => f.write_str("mesh"),
        }
    }
}

/// Leading header of every container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u8,
    pub asset_type: AssetType,
}

impl ContainerHeader {
    /// Header for the current format version
    pub fn new(asset_type: AssetType) -> Self {
        Self {
            version: FORMAT_VERSION,
            asset_type,
        }
    }

    /// Read and check signature, version and asset-type tag
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut signature = [0u8; 3];
        reader.read_exact(&mut signature)?;
        if signature != SIGNATURE {
            return Err(Error::InvalidMagic {
                expected: SIGNATURE.to_vec(),
                found: signature.to_vec(),
            });
        }

        let _reserved = reader.read_u8()?;
        let version = reader.read_u8()?;
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion {
                version,
                supported: FORMAT_VERSION,
            });
        }

        let tag = reader.read_u8()?;
        let asset_type = AssetType::from_tag(tag).ok_or_else(|| Error::UnexpectedAssetType {
            expected: "image or mesh".to_string(),
            found: tag,
        })?;

        tracing::debug!(version, asset_type = %asset_type, "Read container header");
        Ok(Self { version, asset_type })
    }

    /// Encode to the 6-byte on-disk form
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        [
            SIGNATURE[0],
            SIGNATURE[1],
            SIGNATURE[2],
            0,
            self.version,
            self.asset_type.tag(),
        ]
    }

    /// Write as the first span of a session
    pub fn write<W: Write + Seek>(&self, session: &mut WriterSession<W>) -> Result<()> {
        session.write_records(HEADER_SIZE, |buf| {
            buf.write_all(&SIGNATURE)?;
            buf.write_u8(0)?;
            buf.write_u8(self.version)?;
            buf.write_u8(self.asset_type.tag())?;
            Ok(())
        })
    }

    /// Fail unless this header announces `expected`
    pub fn expect(&self, expected: AssetType) -> Result<()> {
        if self.asset_type != expected {
            return Err(Error::UnexpectedAssetType {
                expected: expected.to_string(),
                found: self.asset_type.tag(),
            });
        }
        Ok(())
    }
}

/// A decoded container of either kind
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    Image(ImageBuffer),
    Mesh(MeshBuffer),
}

impl Asset {
    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::Image(_) => AssetType::Image,
            Asset::Mesh(_) => AssetType::Mesh,
        }
    }

    /// Asset name as stored in the container
    pub fn name(&self) -> &str {
        match self {
            Asset::Image(image) => image.name(),
            Asset::Mesh(mesh) => &mesh.name,
        }
    }
}

/// Read just the container header of a file
pub fn probe_header(path: &Path) -> Result<ContainerHeader> {
    let mut file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    ContainerHeader::read(&mut file)
}

/// Read a container of whichever asset type it holds
pub fn read_asset<R: Read + Seek>(mut reader: R, options: &CodecOptions) -> Result<Asset> {
    let header = ContainerHeader::read(&mut reader)?;
    match header.asset_type {
        AssetType::Image => ImageCodec.read_payload(&mut reader, options).map(Asset::Image),
        AssetType::Mesh => MeshCodec.read_payload(&mut reader, options).map(Asset::Mesh),
    }
}

/// Read a container file of whichever asset type it holds
pub fn read_asset_file(path: &Path, options: &CodecOptions) -> Result<Asset> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    crate::logging::instrument("read_asset", || read_asset(BufReader::new(file), options))
}
