//! Incremental mesh construction from imported topology

use std::collections::HashMap;

use assetbake_core::{Error, Extents, Result};

use super::{aggregate_extents, MeshBuffer, SkeletalVertex, Submesh, Vertex};
use crate::material::MaterialRef;

/// Material as the importer names it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialSource {
    /// Importer-side identity used for de-duplication
    pub identity: String,
    /// Relative path of the material document
    pub path: String,
}

impl MaterialSource {
    pub fn new(identity: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            path: path.into(),
        }
    }
}

/// One submesh's worth of triangles, with indices local to `vertices`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportedSubmesh {
    pub name: String,
    pub material: Option<MaterialSource>,
    pub vertices: Vec<Vertex>,
    /// Empty, or one entry per vertex
    pub skeletal_vertices: Vec<SkeletalVertex>,
    pub triangles: Vec<[u32; 3]>,
}

/// Something that can hand over per-submesh topology
pub trait TopologySource {
    /// Submeshes in draw order
    fn submeshes(&mut self) -> Result<Vec<ImportedSubmesh>>;
}

impl TopologySource for Vec<ImportedSubmesh> {
    fn submeshes(&mut self) -> Result<Vec<ImportedSubmesh>> {
        Ok(std::mem::take(self))
    }
}

/// Appends submeshes into shared buffers, then normalizes them into a
/// [`MeshBuffer`]
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: MeshBuffer,
    material_lookup: HashMap<String, u32>,
    skinned: Option<bool>,
}

impl MeshBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            mesh: MeshBuffer::new(name),
            ..Default::default()
        }
    }

    /// Number of submeshes accepted so far
    pub fn submesh_count(&self) -> usize {
        self.mesh.submeshes.len()
    }

    /// Append one submesh.
    ///
    /// Submeshes without vertices or triangles are skipped and `Ok(false)`
    /// is returned. Triangle indices must address the submesh's own
    /// vertices. Tangents are corrected for handedness here, once.
    pub fn add_submesh(&mut self, submesh: ImportedSubmesh) -> Result<bool> {
        let ImportedSubmesh {
            name,
            material,
            mut vertices,
            skeletal_vertices,
            triangles,
        } = submesh;

        if vertices.is_empty() || triangles.is_empty() {
            tracing::warn!(
                submesh = %name,
                vertices = vertices.len(),
                triangles = triangles.len(),
                "Skipping empty submesh"
            );
            return Ok(false);
        }

        let local_vertex_count = vertices.len();
        if let Some(bad) = triangles.iter().flatten().find(|&&i| i as usize >= local_vertex_count) {
            return Err(Error::invalid_data(format!(
                "submesh '{}' references vertex {} of {}",
                name, bad, local_vertex_count
            )));
        }

        let skinned = !skeletal_vertices.is_empty();
        if skinned && skeletal_vertices.len() != local_vertex_count {
            return Err(Error::invalid_data(format!(
                "submesh '{}' has {} skeletal vertices for {} vertices",
                name,
                skeletal_vertices.len(),
                local_vertex_count
            )));
        }
        match self.skinned {
            Some(previous) if previous != skinned => {
                return Err(Error::invalid_data(format!(
                    "submesh '{}' mixes skinned and unskinned geometry",
                    name
                )));
            }
            _ => self.skinned = Some(skinned),
        }

        let flipped = vertices
            .iter_mut()
            .map(Vertex::correct_handedness)
            .filter(|&flipped| flipped)
            .count();
        if flipped > 0 {
            tracing::debug!(submesh = %name, flipped, "Corrected tangent handedness");
        }

        let extents = Extents::from_points(vertices.iter().map(|v| v.position)).unwrap_or_default();
        let material_index = self.register_material(material.as_ref())?;

        let base_vertex = to_u32(self.mesh.vertices.len(), "vertex count")?;
        let base_index = to_u32(self.mesh.indices.len(), "index count")?;
        let vertex_count = to_u32(local_vertex_count, "submesh vertex count")?;
        let index_count = to_u32(triangles.len() * 3, "submesh index count")?;

        self.mesh.vertices.extend(vertices);
        self.mesh.skeletal_vertices.extend(skeletal_vertices);
        self.mesh.indices.extend(triangles.iter().flatten());
        self.mesh.submeshes.push(Submesh {
            name,
            material_index,
            index_count,
            vertex_count,
            base_vertex,
            base_index,
            extents,
        });
        Ok(true)
    }

    /// Offset indices into the shared vertex buffer, reduce extents and
    /// validate the result
    pub fn build(self) -> Result<MeshBuffer> {
        let mut mesh = self.mesh;

        for submesh in &mut mesh.submeshes {
            let base_vertex = submesh.base_vertex;
            let range = submesh.index_range();
            for index in &mut mesh.indices[range] {
                *index += base_vertex;
            }
            submesh.base_vertex = 0;
        }
        mesh.extents = aggregate_extents(&mesh.submeshes);
        mesh.validate()?;

        tracing::debug!(
            mesh = %mesh.name,
            submeshes = mesh.submeshes.len(),
            vertices = mesh.vertices.len(),
            indices = mesh.indices.len(),
            materials = mesh.materials.len(),
            "Built mesh"
        );
        Ok(mesh)
    }

    fn register_material(&mut self, material: Option<&MaterialSource>) -> Result<u32> {
        let (identity, path) = match material {
            Some(source) => (source.identity.as_str(), source.path.as_str()),
            None => ("", ""),
        };
        if let Some(&index) = self.material_lookup.get(identity) {
            return Ok(index);
        }

        let index = to_u32(self.mesh.materials.len(), "material count")?;
        self.mesh.materials.push(MaterialRef::new(path));
        self.material_lookup.insert(identity.to_string(), index);
        Ok(index)
    }
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::invalid_data(format!("{} {} exceeds u32", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetbake_core::Vec3;

    fn quad(offset: f32, material: &str) -> ImportedSubmesh {
        let corner = |x: f32, y: f32| Vertex {
            position: Vec3::new(x + offset, y, 0.0),
            normal: Vec3::FORWARD,
            tangent: Vec3::new(1.0, 0.0, 0.0),
            bitangent: Vec3::UP,
            ..Default::default()
        };
        ImportedSubmesh {
            name: format!("quad_{}", offset),
            material: Some(MaterialSource::new(material, format!("materials/{}.json", material))),
            vertices: vec![corner(0.0, 0.0), corner(1.0, 0.0), corner(1.0, 1.0), corner(0.0, 1.0)],
            skeletal_vertices: Vec::new(),
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    #[test]
    fn test_partition_and_deindex() {
        let mut source = vec![quad(0.0, "steel"), quad(2.0, "glass")];
        let mesh = MeshBuffer::from_topology("pair", &mut source).unwrap();

        let (s0, s1) = (&mesh.submeshes[0], &mesh.submeshes[1]);
        assert_eq!(s1.base_index, s0.base_index + s0.index_count);
        assert!(mesh.submeshes.iter().all(|s| s.base_vertex == 0));
        assert!(mesh.submesh_indices(s0).iter().all(|&i| (i as usize) < mesh.vertex_count()));
        // Second quad's indices were offset past the first quad's vertices
        assert_eq!(mesh.submesh_indices(s1), &[4, 5, 6, 4, 6, 7]);
        assert_eq!(mesh.triangle_count(), 4);
    }

    #[test]
    fn test_extents_aggregation() {
        let mut source = vec![quad(0.0, "a"), quad(-3.0, "b")];
        let mesh = MeshBuffer::from_topology("m", &mut source).unwrap();

        assert_eq!(mesh.submeshes[0].extents.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(mesh.submeshes[1].extents.min, Vec3::new(-3.0, 0.0, 0.0));
        assert_eq!(mesh.extents.min, Vec3::new(-3.0, 0.0, 0.0));
        assert_eq!(mesh.extents.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_material_dedup() {
        let mut source = vec![quad(0.0, "steel"), quad(2.0, "glass"), quad(4.0, "steel")];
        let mesh = MeshBuffer::from_topology("m", &mut source).unwrap();

        assert_eq!(mesh.materials.len(), 2);
        assert_eq!(mesh.materials[0].path(), "materials/steel.json");
        let indices: Vec<_> = mesh.submeshes.iter().map(|s| s.material_index).collect();
        assert_eq!(indices, vec![0, 1, 0]);
    }

    #[test]
    fn test_empty_submesh_skipped() {
        let mut builder = MeshBuilder::new("m");
        let empty = ImportedSubmesh {
            name: "nothing".into(),
            ..Default::default()
        };
        assert!(!builder.add_submesh(empty).unwrap());
        assert!(builder.add_submesh(quad(0.0, "a")).unwrap());
        assert_eq!(builder.submesh_count(), 1);
    }

    #[test]
    fn test_out_of_range_triangle_rejected() {
        let mut submesh = quad(0.0, "a");
        submesh.triangles.push([0, 1, 4]);
        let mut builder = MeshBuilder::new("m");
        assert!(builder.add_submesh(submesh).is_err());
    }

    #[test]
    fn test_tangent_corrected_on_ingest() {
        let mut submesh = quad(0.0, "a");
        // FORWARD x +X = UP; a DOWN bitangent makes the frame left-handed
        submesh.vertices[0].bitangent = Vec3::new(0.0, -1.0, 0.0);
        let mesh = MeshBuffer::from_topology("m", &mut vec![submesh]).unwrap();
        assert_eq!(mesh.vertices[0].tangent, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(mesh.vertices[1].tangent, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_mixed_skinning_rejected() {
        let mut skinned = quad(0.0, "a");
        skinned.skeletal_vertices = vec![SkeletalVertex::default(); 4];
        let mut builder = MeshBuilder::new("m");
        builder.add_submesh(skinned).unwrap();
        assert!(builder.add_submesh(quad(2.0, "a")).is_err());
    }
}
