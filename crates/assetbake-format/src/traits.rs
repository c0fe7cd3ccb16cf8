//! Core traits defining the codec interface for container payloads.
//!
//! Every asset type gets one [`AssetCodec`] implementation that knows how to
//! validate, encode and decode its payload. The framing around it (the
//! container header, writer sessions, file handling and tracing) lives in
//! the trait's provided methods so all asset types behave the same way.

use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use assetbake_core::{Error, Result};

use crate::container::{write_container_file, AssetType, ContainerHeader, WriterSession};
use crate::logging;

/// Configuration options for reading containers
#[derive(Debug, Clone)]
pub struct CodecOptions {
    /// Largest single allocation a read may make from declared sizes
    pub max_allocation: u64,
    /// Validate decoded assets before returning them
    pub strict_validation: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_allocation: 1024 * 1024 * 1024, // 1 GiB
            strict_validation: true,
        }
    }
}

impl CodecOptions {
    /// Reject a declared allocation over the configured ceiling
    pub fn check_allocation(&self, what: &str, bytes: u64) -> Result<()> {
        if bytes > self.max_allocation {
            return Err(Error::size_mismatch(
                format!("{} (allocation ceiling)", what),
                bytes,
                self.max_allocation,
            ));
        }
        Ok(())
    }
}

/// Encoder/decoder for one asset type's container payload
pub trait AssetCodec {
    /// In-memory asset type
    type Asset;

    /// Tag written in the container header
    fn asset_type(&self) -> AssetType;

    /// Human-readable codec name
    fn name(&self) -> &str;

    /// Check that `asset` can be encoded, before any byte is written
    fn validate(&self, asset: &Self::Asset) -> Result<()>;

    /// Encode the payload that follows the container header
    fn write_payload<W: Write + Seek>(&self, asset: &Self::Asset, session: &mut WriterSession<W>) -> Result<()>;

    /// Decode the payload that follows the container header
    fn read_payload<R: Read + Seek>(&self, reader: &mut R, options: &CodecOptions) -> Result<Self::Asset>;

    /// Write a complete container to a stream
    fn write<W: Write + Seek>(&self, asset: &Self::Asset, writer: W) -> Result<W> {
        self.validate(asset)?;
        let mut session = WriterSession::begin(writer)?;
        ContainerHeader::new(self.asset_type()).write(&mut session)?;
        self.write_payload(asset, &mut session)?;
        tracing::info!(codec = %self.name(), bytes = session.bytes_written(), "Wrote container");
        session.finish()
    }

    /// Write a complete container to a file, replacing it only on success
    fn write_file(&self, asset: &Self::Asset, path: &Path) -> Result<u64> {
        logging::instrument(self.name(), || {
            self.validate(asset)?;
            let written = write_container_file(path, |session| {
                ContainerHeader::new(self.asset_type()).write(session)?;
                self.write_payload(asset, session)
            })?;
            tracing::info!(
                codec = %self.name(),
                path = %path.display(),
                bytes = written,
                "Wrote container"
            );
            Ok(written)
        })
    }

    /// Read a container from a stream with default options
    fn read<R: Read + Seek>(&self, reader: R) -> Result<Self::Asset> {
        self.read_with_options(reader, &CodecOptions::default())
    }

    /// Read a container from a stream
    fn read_with_options<R: Read + Seek>(&self, mut reader: R, options: &CodecOptions) -> Result<Self::Asset> {
        let header = ContainerHeader::read(&mut reader)?;
        header.expect(self.asset_type())?;
        let asset = self.read_payload(&mut reader, options)?;
        tracing::info!(codec = %self.name(), "Read container");
        Ok(asset)
    }

    /// Read a container file with default options
    fn read_file(&self, path: &Path) -> Result<Self::Asset> {
        self.read_file_with_options(path, &CodecOptions::default())
    }

    /// Read a container file
    fn read_file_with_options(&self, path: &Path, options: &CodecOptions) -> Result<Self::Asset> {
        logging::instrument(self.name(), || {
            let file = File::open(path).map_err(|source| Error::Open {
                path: path.to_path_buf(),
                source,
            })?;
            self.read_with_options(BufReader::new(file), options)
                .map_err(|e| e.with_context(path.display().to_string()))
        })
    }

    /// Replace `target` with the asset in `path`. On any error `target` is
    /// left exactly as it was.
    fn read_into(&self, path: &Path, target: &mut Self::Asset) -> Result<()> {
        *target = self.read_file(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_options_default() {
        let options = CodecOptions::default();
        assert!(options.strict_validation);
        assert_eq!(options.max_allocation, 1 << 30);
    }

    #[test]
    fn test_allocation_ceiling() {
        let options = CodecOptions {
            max_allocation: 100,
            ..Default::default()
        };
        assert!(options.check_allocation("cell", 100).is_ok());
        assert!(options.check_allocation("cell", 101).unwrap_err().is_size_mismatch());
    }
}
