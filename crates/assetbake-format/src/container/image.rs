//! Image payload codec
//!
//! # Layout
//! ```text
//! name_length      u16
//! name             name_length bytes, UTF-8
//! ImageHeader      compression u8, channel_bytes u8, channels u8,
//!                  array_slices u16, mip_slices u8
//! for slice in 0..array_slices:
//!   for mip in 0..mip_slices:
//!     MipHeader    width u16, height u16, size u32
//!     pixels       size bytes
//! ```

use std::io::{Read, Seek, Write};

use assetbake_core::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::io::{ensure_available, read_prefixed_str, remaining, write_prefixed_str};
use super::{AssetType, WriterSession};
use crate::image::{check_grid, expected_cell_size, Compression, ImageBuffer, MipCell, PixelType};
use crate::traits::{AssetCodec, CodecOptions};

/// Bytes in the fixed part of the image header
const IMAGE_HEADER_SIZE: u64 = 6;

/// Bytes in one mip header
const MIP_HEADER_SIZE: u64 = 8;

/// Codec for [`ImageBuffer`] containers
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl AssetCodec for ImageCodec {
    type Asset = ImageBuffer;

    fn asset_type(&self) -> AssetType {
        AssetType::Image
    }

    fn name(&self) -> &str {
        "image"
    }

    fn validate(&self, image: &ImageBuffer) -> Result<()> {
        if !image.is_allocated() {
            return Err(Error::invalid_data(format!("image '{}' has no cells", image.name())));
        }
        image.validate()?;

        if image.name().len() > usize::from(u16::MAX) {
            return Err(Error::invalid_data("image name exceeds u16 length prefix"));
        }
        if image.array_slices() > usize::from(u16::MAX) {
            return Err(Error::invalid_data(format!(
                "{} array slices exceed the u16 field",
                image.array_slices()
            )));
        }
        if image.mip_slices() > usize::from(u8::MAX) {
            return Err(Error::invalid_data(format!(
                "{} mip levels exceed the u8 field",
                image.mip_slices()
            )));
        }
        let (width, height) = image.base_dimensions();
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(Error::invalid_data(format!(
                "{}x{} exceeds the u16 dimension fields",
                width, height
            )));
        }
        if let Some((slice, mip, _)) = image.cells().find(|(_, _, cell)| u32::try_from(cell.byte_size()).is_err()) {
            return Err(Error::invalid_data(format!(
                "cell ({}, {}) exceeds the u32 size field",
                slice, mip
            )));
        }
        Ok(())
    }

    fn write_payload<W: Write + Seek>(&self, image: &ImageBuffer, session: &mut WriterSession<W>) -> Result<()> {
        session.write_records(2 + image.name().len(), |buf| write_prefixed_str(buf, image.name()))?;

        session.write_records(IMAGE_HEADER_SIZE as usize, |buf| {
            buf.write_u8(image.compression().tag())?;
            buf.write_u8(image.pixel_type().channel_bytes())?;
            buf.write_u8(image.components())?;
            buf.write_u16::<LittleEndian>(image.array_slices() as u16)?;
            buf.write_u8(image.mip_slices() as u8)?;
            Ok(())
        })?;
        tracing::debug!(
            name = %image.name(),
            compression = %image.compression(),
            pixel_type = %image.pixel_type(),
            components = image.components(),
            array_slices = image.array_slices(),
            mip_slices = image.mip_slices(),
            "Wrote image header"
        );

        for (slice, mip, cell) in image.cells() {
            session.write_records(MIP_HEADER_SIZE as usize, |buf| {
                buf.write_u16::<LittleEndian>(cell.width() as u16)?;
                buf.write_u16::<LittleEndian>(cell.height() as u16)?;
                buf.write_u32::<LittleEndian>(cell.byte_size() as u32)?;
                Ok(())
            })?;
            session.write_span(cell.data())?;
            tracing::trace!(slice, mip, bytes = cell.byte_size(), "Wrote cell");
        }
        tracing::debug!(bytes = image.total_bytes(), "Wrote image cells");
        Ok(())
    }

    fn read_payload<R: Read + Seek>(&self, reader: &mut R, options: &CodecOptions) -> Result<ImageBuffer> {
        let name = read_prefixed_str(reader)?;

        let mut available = remaining(reader)?;
        ensure_available("image header", IMAGE_HEADER_SIZE, available)?;
        available -= IMAGE_HEADER_SIZE;

        let compression_tag = reader.read_u8()?;
        let compression = Compression::from_tag(compression_tag)
            .ok_or_else(|| Error::invalid_data(format!("unknown compression tag {}", compression_tag)))?;
        let channel_bytes = reader.read_u8()?;
        let pixel_type = PixelType::from_channel_bytes(channel_bytes)
            .ok_or_else(|| Error::invalid_data(format!("unsupported channel width {} bytes", channel_bytes)))?;
        let components = reader.read_u8()?;
        let array_slices = usize::from(reader.read_u16::<LittleEndian>()?);
        let mip_slices = usize::from(reader.read_u8()?);

        if !(1..=4).contains(&components) {
            return Err(Error::invalid_data(format!("component count must be 1-4, got {}", components)));
        }
        check_grid(array_slices, mip_slices)?;
        let cell_count = (array_slices * mip_slices) as u64;
        ensure_available("mip headers", cell_count * MIP_HEADER_SIZE, available)?;

        tracing::debug!(
            name = %name,
            compression = %compression,
            pixel_type = %pixel_type,
            components,
            array_slices,
            mip_slices,
            "Read image header"
        );

        let mut cells = Vec::with_capacity(array_slices * mip_slices);
        for slice in 0..array_slices {
            for mip in 0..mip_slices {
                let width = u32::from(reader.read_u16::<LittleEndian>()?);
                let height = u32::from(reader.read_u16::<LittleEndian>()?);
                let size = u64::from(reader.read_u32::<LittleEndian>()?);
                available = available.saturating_sub(MIP_HEADER_SIZE);

                let what = format!("image cell ({}, {})", slice, mip);
                let expected = expected_cell_size(compression, pixel_type, components, width, height)? as u64;
                if size != expected {
                    return Err(Error::size_mismatch(what, size, expected));
                }
                // Remaining mip headers still have to fit after this cell
                let headers_left = (cell_count - cells.len() as u64 - 1) * MIP_HEADER_SIZE;
                ensure_available(&what, size, available.saturating_sub(headers_left))?;
                options.check_allocation(&what, size)?;

                let mut data = vec![0u8; size as usize];
                reader.read_exact(&mut data)?;
                available -= size;
                cells.push(MipCell::new(width, height, data));
            }
        }

        let image = ImageBuffer::from_cells(name, pixel_type, components, compression, array_slices, mip_slices, cells)?;
        tracing::debug!(bytes = image.total_bytes(), "Read image cells");
        Ok(image)
    }
}
