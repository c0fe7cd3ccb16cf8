//! Little-endian field helpers shared by the payload codecs

use std::io::{Read, Seek, SeekFrom, Write};

use assetbake_core::{Error, Extents, Result, Vec2, Vec3};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Bytes left between the current position and the end of the stream
pub fn remaining<R: Seek>(reader: &mut R) -> Result<u64> {
    let position = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;
    Ok(end.saturating_sub(position))
}

/// Fail with `SizeMismatch` when `declared` bytes are not available
pub fn ensure_available(what: &str, declared: u64, available: u64) -> Result<()> {
    if declared > available {
        return Err(Error::size_mismatch(what, declared, available));
    }
    Ok(())
}

pub fn read_vec3<R: Read>(reader: &mut R) -> Result<Vec3> {
    Ok(Vec3::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}

pub fn write_vec3<W: Write>(writer: &mut W, v: Vec3) -> Result<()> {
    writer.write_f32::<LittleEndian>(v.x)?;
    writer.write_f32::<LittleEndian>(v.y)?;
    writer.write_f32::<LittleEndian>(v.z)?;
    Ok(())
}

pub fn read_vec2<R: Read>(reader: &mut R) -> Result<Vec2> {
    Ok(Vec2::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}

pub fn write_vec2<W: Write>(writer: &mut W, v: Vec2) -> Result<()> {
    writer.write_f32::<LittleEndian>(v.x)?;
    writer.write_f32::<LittleEndian>(v.y)?;
    Ok(())
}

/// Extents are stored max first, then min
pub fn read_extents<R: Read>(reader: &mut R) -> Result<Extents> {
    let max = read_vec3(reader)?;
    let min = read_vec3(reader)?;
    Ok(Extents::new(min, max))
}

pub fn write_extents<W: Write>(writer: &mut W, extents: &Extents) -> Result<()> {
    write_vec3(writer, extents.max)?;
    write_vec3(writer, extents.min)
}

/// Write `value` into a NUL-padded buffer of exactly `len` bytes. At least
/// one trailing NUL is always kept.
pub fn write_fixed_str<W: Write>(writer: &mut W, value: &str, len: usize) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() >= len {
        return Err(Error::invalid_data(format!(
            "'{}' is {} bytes, fixed field holds {}",
            value,
            bytes.len(),
            len - 1
        )));
    }
    let mut buffer = vec![0u8; len];
    buffer[..bytes.len()].copy_from_slice(bytes);
    writer.write_all(&buffer)?;
    Ok(())
}

/// Read a NUL-padded buffer of `len` bytes, stopping at the first NUL.
/// A field with no NUL is rejected, matching [`write_fixed_str`].
pub fn read_fixed_str<R: Read>(reader: &mut R, len: usize) -> Result<String> {
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    let end = buffer
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::invalid_data(format!("fixed string of {} bytes has no NUL terminator", len)))?;
    buffer.truncate(end);
    String::from_utf8(buffer).map_err(|e| Error::invalid_data(format!("fixed string is not UTF-8: {}", e)))
}

/// Write a u16 length prefix followed by UTF-8 bytes
pub fn write_prefixed_str<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let len = u16::try_from(value.len()).map_err(|_| {
        Error::invalid_data(format!("string of {} bytes exceeds u16 length prefix", value.len()))
    })?;
    writer.write_u16::<LittleEndian>(len)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

/// Read a u16-length-prefixed UTF-8 string, checking the length against
/// the bytes left in the stream first
pub fn read_prefixed_str<R: Read + Seek>(reader: &mut R) -> Result<String> {
    let len = reader.read_u16::<LittleEndian>()?;
    ensure_available("name", u64::from(len), remaining(reader)?)?;
    let mut buffer = vec![0u8; len as usize];
    reader.read_exact(&mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::invalid_data(format!("name is not UTF-8: {}", e)))
}
