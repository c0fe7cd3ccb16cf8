//! Mesh payload codec
//!
//! # Layout
//! ```text
//! MeshHeader (194 bytes)
//!   submesh_count, material_count, vertex_count,
//!   skeletal_vertex_count, index_count          u32 each
//!   max_extents, min_extents                    3 x f32 each
//!   name                                        150 bytes, NUL-padded
//! vertex records          56 bytes each
//! skeletal vertex records 32 bytes each (only when count > 0)
//! index records           u32 each
//! submesh records         194 bytes each
//! material path records   260 bytes each, NUL-padded
//! ```

use std::io::{Read, Seek, Write};

use assetbake_core::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::io::{
    ensure_available, read_extents, read_fixed_str, read_vec2, read_vec3, remaining,
    write_extents, write_fixed_str, write_vec2, write_vec3,
};
use super::{AssetType, WriterSession, NAME_LEN, PATH_LEN};
use crate::material::MaterialRef;
use crate::mesh::{MeshBuffer, SkeletalVertex, Submesh, Vertex};
use crate::traits::{AssetCodec, CodecOptions};

/// Five counts, two extents, one name
const MESH_HEADER_SIZE: u64 = 5 * 4 + 2 * 12 + NAME_LEN as u64;

/// Five u32 fields, two extents, one name
const SUBMESH_RECORD_SIZE: u64 = 5 * 4 + 2 * 12 + NAME_LEN as u64;

const INDEX_RECORD_SIZE: u64 = 4;

/// Declared counts from the mesh header
#[derive(Debug, Clone, Copy)]
struct MeshCounts {
    submeshes: u32,
    materials: u32,
    vertices: u32,
    skeletal_vertices: u32,
    indices: u32,
}

impl MeshCounts {
    /// Byte length of every record section, in file order
    fn sections(&self) -> [(&'static str, u64); 5] {
        [
            ("vertex records", u64::from(self.vertices) * Vertex::RECORD_SIZE as u64),
            (
                "skeletal vertex records",
                u64::from(self.skeletal_vertices) * SkeletalVertex::RECORD_SIZE as u64,
            ),
            ("index records", u64::from(self.indices) * INDEX_RECORD_SIZE),
            ("submesh records", u64::from(self.submeshes) * SUBMESH_RECORD_SIZE),
            ("material path records", u64::from(self.materials) * PATH_LEN as u64),
        ]
    }
}

/// Codec for [`MeshBuffer`] containers
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshCodec;

impl AssetCodec for MeshCodec {
    type Asset = MeshBuffer;

    fn asset_type(&self) -> AssetType {
        AssetType::Mesh
    }

    fn name(&self) -> &str {
        "mesh"
    }

    fn validate(&self, mesh: &MeshBuffer) -> Result<()> {
        mesh.validate()?;

        let counts = [
            ("submesh", mesh.submeshes.len()),
            ("material", mesh.materials.len()),
            ("vertex", mesh.vertices.len()),
            ("index", mesh.indices.len()),
        ];
        if let Some((what, count)) = counts.iter().find(|(_, count)| u32::try_from(*count).is_err()) {
            return Err(Error::invalid_data(format!("{} count {} exceeds u32", what, count)));
        }

        check_fixed_len("mesh name", &mesh.name, NAME_LEN)?;
        for submesh in &mesh.submeshes {
            check_fixed_len("submesh name", &submesh.name, NAME_LEN)?;
        }
        for material in &mesh.materials {
            check_fixed_len("material path", material.path(), PATH_LEN)?;
        }
        Ok(())
    }

    fn write_payload<W: Write + Seek>(&self, mesh: &MeshBuffer, session: &mut WriterSession<W>) -> Result<()> {
        session.write_records(MESH_HEADER_SIZE as usize, |buf| {
            buf.write_u32::<LittleEndian>(mesh.submeshes.len() as u32)?;
            buf.write_u32::<LittleEndian>(mesh.materials.len() as u32)?;
            buf.write_u32::<LittleEndian>(mesh.vertices.len() as u32)?;
            buf.write_u32::<LittleEndian>(mesh.skeletal_vertices.len() as u32)?;
            buf.write_u32::<LittleEndian>(mesh.indices.len() as u32)?;
            write_extents(buf, &mesh.extents)?;
            write_fixed_str(buf, &mesh.name, NAME_LEN)
        })?;
        tracing::debug!(
            mesh = %mesh.name,
            submeshes = mesh.submeshes.len(),
            materials = mesh.materials.len(),
            vertices = mesh.vertices.len(),
            skeletal_vertices = mesh.skeletal_vertices.len(),
            indices = mesh.indices.len(),
            "Wrote mesh header"
        );

        session.write_records(mesh.vertices.len() * Vertex::RECORD_SIZE, |buf| {
            for vertex in &mesh.vertices {
                write_vec3(buf, vertex.position)?;
                write_vec2(buf, vertex.uv)?;
                write_vec3(buf, vertex.normal)?;
                write_vec3(buf, vertex.tangent)?;
                write_vec3(buf, vertex.bitangent)?;
            }
            Ok(())
        })?;

        if !mesh.skeletal_vertices.is_empty() {
            session.write_records(mesh.skeletal_vertices.len() * SkeletalVertex::RECORD_SIZE, |buf| {
                for skeletal in &mesh.skeletal_vertices {
                    for &bone in &skeletal.bone_indices {
                        buf.write_u32::<LittleEndian>(bone)?;
                    }
                    for &weight in &skeletal.bone_weights {
                        buf.write_f32::<LittleEndian>(weight)?;
                    }
                }
                Ok(())
            })?;
        }

        session.write_records(mesh.indices.len() * INDEX_RECORD_SIZE as usize, |buf| {
            for &index in &mesh.indices {
                buf.write_u32::<LittleEndian>(index)?;
            }
            Ok(())
        })?;

        session.write_records(mesh.submeshes.len() * SUBMESH_RECORD_SIZE as usize, |buf| {
            for submesh in &mesh.submeshes {
                buf.write_u32::<LittleEndian>(submesh.material_index)?;
                buf.write_u32::<LittleEndian>(submesh.index_count)?;
                buf.write_u32::<LittleEndian>(submesh.vertex_count)?;
                buf.write_u32::<LittleEndian>(submesh.base_vertex)?;
                buf.write_u32::<LittleEndian>(submesh.base_index)?;
                write_extents(buf, &submesh.extents)?;
                write_fixed_str(buf, &submesh.name, NAME_LEN)?;
            }
            Ok(())
        })?;

        session.write_records(mesh.materials.len() * PATH_LEN, |buf| {
            for material in &mesh.materials {
                write_fixed_str(buf, material.path(), PATH_LEN)?;
            }
            Ok(())
        })?;
        tracing::debug!(bytes = session.bytes_written(), "Wrote mesh records");
        Ok(())
    }

    fn read_payload<R: Read + Seek>(&self, reader: &mut R, options: &CodecOptions) -> Result<MeshBuffer> {
        ensure_available("mesh header", MESH_HEADER_SIZE, remaining(reader)?)?;

        let counts = MeshCounts {
            submeshes: reader.read_u32::<LittleEndian>()?,
            materials: reader.read_u32::<LittleEndian>()?,
            vertices: reader.read_u32::<LittleEndian>()?,
            skeletal_vertices: reader.read_u32::<LittleEndian>()?,
            indices: reader.read_u32::<LittleEndian>()?,
        };
        let extents = read_extents(reader)?;
        let name = read_fixed_str(reader, NAME_LEN)?;

        if counts.skeletal_vertices != 0 && counts.skeletal_vertices != counts.vertices {
            return Err(Error::invalid_data(format!(
                "{} skeletal vertices for {} vertices",
                counts.skeletal_vertices, counts.vertices
            )));
        }

        // Every section must fit before anything is allocated
        let sections = counts.sections();
        let declared: u64 = sections.iter().map(|(_, bytes)| bytes).sum();
        ensure_available("mesh records", declared, remaining(reader)?)?;
        for (what, bytes) in &sections {
            options.check_allocation(what, *bytes)?;
        }
        tracing::debug!(mesh = %name, ?counts, declared, "Read mesh header");

        let mut vertices = Vec::with_capacity(counts.vertices as usize);
        for _ in 0..counts.vertices {
            vertices.push(Vertex {
                position: read_vec3(reader)?,
                uv: read_vec2(reader)?,
                normal: read_vec3(reader)?,
                tangent: read_vec3(reader)?,
                bitangent: read_vec3(reader)?,
            });
        }

        let mut skeletal_vertices = Vec::with_capacity(counts.skeletal_vertices as usize);
        for _ in 0..counts.skeletal_vertices {
            let mut skeletal = SkeletalVertex::default();
            reader.read_u32_into::<LittleEndian>(&mut skeletal.bone_indices)?;
            reader.read_f32_into::<LittleEndian>(&mut skeletal.bone_weights)?;
            skeletal_vertices.push(skeletal);
        }

        let mut indices = vec![0u32; counts.indices as usize];
        reader.read_u32_into::<LittleEndian>(&mut indices)?;

        let mut submeshes = Vec::with_capacity(counts.submeshes as usize);
        for _ in 0..counts.submeshes {
            let material_index = reader.read_u32::<LittleEndian>()?;
            let index_count = reader.read_u32::<LittleEndian>()?;
            let vertex_count = reader.read_u32::<LittleEndian>()?;
            let base_vertex = reader.read_u32::<LittleEndian>()?;
            let base_index = reader.read_u32::<LittleEndian>()?;
            let extents = read_extents(reader)?;
            let name = read_fixed_str(reader, NAME_LEN)?;
            submeshes.push(Submesh {
                name,
                material_index,
                index_count,
                vertex_count,
                base_vertex,
                base_index,
                extents,
            });
        }

        let mut materials = Vec::with_capacity(counts.materials as usize);
        for _ in 0..counts.materials {
            materials.push(MaterialRef::new(read_fixed_str(reader, PATH_LEN)?));
        }

        let mesh = MeshBuffer {
            name,
            vertices,
            skeletal_vertices,
            indices,
            submeshes,
            materials,
            extents,
        };
        if options.strict_validation {
            mesh.validate()?;
        }
        tracing::debug!(mesh = %mesh.name, "Read mesh records");
        Ok(mesh)
    }
}

fn check_fixed_len(what: &str, value: &str, len: usize) -> Result<()> {
    if value.len() >= len {
        return Err(Error::invalid_data(format!(
            "{} '{}' is {} bytes, limit is {}",
            what,
            value,
            value.len(),
            len - 1
        )));
    }
    Ok(())
}
