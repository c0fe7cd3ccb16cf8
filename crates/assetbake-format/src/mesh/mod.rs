//! Mesh buffer model
//!
//! A [`MeshBuffer`] owns one shared vertex buffer and one flat index buffer,
//! partitioned into contiguous [`Submesh`] ranges that each name a material
//! by index.
//!
//! ```text
//! indices:  [ s0 s0 s0 s0 s0 s0 | s1 s1 s1 | s2 s2 s2 s2 s2 s2 ]
//!             ^ base_index 0      ^ 6        ^ 9
//! ```
//! Index values are absolute into the shared vertex buffer, so every
//! submesh's `base_vertex` is 0 once the mesh is built.

mod builder;

pub use builder::{ImportedSubmesh, MaterialSource, MeshBuilder, TopologySource};

use std::ops::Range;
use std::path::{Path, PathBuf};

use assetbake_core::{Error, Extents, Result, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::material::MaterialRef;

/// One mesh vertex
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl Vertex {
    /// Serialized record size
    pub const RECORD_SIZE: usize = 56;

    /// Negate the tangent when the (normal, tangent, bitangent) frame is
    /// left-handed. Returns whether the tangent was flipped.
    pub fn correct_handedness(&mut self) -> bool {
        if self.normal.cross(&self.tangent).dot(&self.bitangent) < 0.0 {
            self.tangent = -self.tangent;
            true
        } else {
            false
        }
    }
}

/// Skinning data parallel to [`Vertex`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkeletalVertex {
    pub bone_indices: [u32; 4],
    pub bone_weights: [f32; 4],
}

impl SkeletalVertex {
    /// Serialized record size
    pub const RECORD_SIZE: usize = 32;
}

/// Contiguous index range drawn with one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submesh {
    pub name: String,
    pub material_index: u32,
    pub index_count: u32,
    pub vertex_count: u32,
    pub base_vertex: u32,
    pub base_index: u32,
    pub extents: Extents,
}

impl Submesh {
    /// Range of this submesh in the index buffer
    pub fn index_range(&self) -> Range<usize> {
        let start = self.base_index as usize;
        start..start + self.index_count as usize
    }

    /// Triangle count
    pub fn triangle_count(&self) -> usize {
        self.index_count as usize / 3
    }
}

/// Geometry for one mesh
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshBuffer {
    /// Mesh name
    pub name: String,
    /// Shared vertex buffer
    pub vertices: Vec<Vertex>,
    /// Empty, or one entry per vertex
    pub skeletal_vertices: Vec<SkeletalVertex>,
    /// Absolute indices into `vertices`
    pub indices: Vec<u32>,
    /// Ordered partition of `indices`
    pub submeshes: Vec<Submesh>,
    /// Material documents, addressed by `Submesh::material_index`
    pub materials: Vec<MaterialRef>,
    /// Componentwise reduction of submesh extents
    pub extents: Extents,
}

impl MeshBuffer {
    /// Create an empty mesh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build a mesh from an importer
    pub fn from_topology(name: impl Into<String>, source: &mut dyn TopologySource) -> Result<Self> {
        let mut builder = MeshBuilder::new(name);
        for submesh in source.submeshes()? {
            builder.add_submesh(submesh)?;
        }
        builder.build()
    }

    /// Vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Index count
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Triangle count across all submeshes
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if the mesh carries skinning data
    pub fn is_skinned(&self) -> bool {
        !self.skeletal_vertices.is_empty()
    }

    /// Indices belonging to one submesh
    pub fn submesh_indices(&self, submesh: &Submesh) -> &[u32] {
        self.indices.get(submesh.index_range()).unwrap_or(&[])
    }

    /// Recompute every submesh's extents from the vertices it references,
    /// then the mesh extents from the submeshes
    pub fn recompute_extents(&mut self) {
        for submesh in &mut self.submeshes {
            let start = (submesh.base_index as usize).min(self.indices.len());
            let end = (start + submesh.index_count as usize).min(self.indices.len());
            let base = submesh.base_vertex as usize;
            let points = self.indices[start..end]
                .iter()
                .filter_map(|&index| self.vertices.get(base + index as usize))
                .map(|vertex| vertex.position);
            submesh.extents = Extents::from_points(points).unwrap_or_default();
        }
        self.extents = aggregate_extents(&self.submeshes);
    }

    /// Material paths resolved against the container's directory
    pub fn resolve_material_paths(&self, container_path: &Path) -> Vec<PathBuf> {
        self.materials
            .iter()
            .map(|material| material.resolve_from_container(container_path))
            .collect()
    }

    /// Check the structural invariants the codec relies on
    pub fn validate(&self) -> Result<()> {
        if !self.skeletal_vertices.is_empty() && self.skeletal_vertices.len() != self.vertices.len() {
            return Err(Error::invalid_data(format!(
                "{} skeletal vertices for {} vertices",
                self.skeletal_vertices.len(),
                self.vertices.len()
            )));
        }

        let mut next_index = 0usize;
        for (i, submesh) in self.submeshes.iter().enumerate() {
            if submesh.base_index as usize != next_index {
                return Err(Error::invalid_data(format!(
                    "submesh {} '{}' starts at index {}, expected {}",
                    i, submesh.name, submesh.base_index, next_index
                )));
            }
            if submesh.base_vertex != 0 {
                return Err(Error::invalid_data(format!(
                    "submesh {} '{}' has base vertex {}, expected 0",
                    i, submesh.name, submesh.base_vertex
                )));
            }
            if submesh.material_index as usize >= self.materials.len() {
                return Err(Error::invalid_data(format!(
                    "submesh {} '{}' uses material {} of {}",
                    i,
                    submesh.name,
                    submesh.material_index,
                    self.materials.len()
                )));
            }
            next_index += submesh.index_count as usize;
        }
        if next_index != self.indices.len() {
            return Err(Error::invalid_data(format!(
                "submeshes cover {} of {} indices",
                next_index,
                self.indices.len()
            )));
        }

        if let Some(bad) = self.indices.iter().find(|&&index| index as usize >= self.vertices.len()) {
            return Err(Error::invalid_data(format!(
                "index {} out of range for {} vertices",
                bad,
                self.vertices.len()
            )));
        }

        if !self.submeshes.is_empty() {
            let expected = aggregate_extents(&self.submeshes);
            if self.extents != expected {
                return Err(Error::invalid_data(format!(
                    "mesh extents {:?} do not match submesh extents {:?}",
                    self.extents, expected
                )));
            }
        }
        Ok(())
    }
}

/// Componentwise min/max over submesh extents, zero when there are none
pub fn aggregate_extents(submeshes: &[Submesh]) -> Extents {
    let mut iter = submeshes.iter();
    let Some(first) = iter.next() else {
        return Extents::ZERO;
    };
    iter.fold(first.extents, |mut acc, submesh| {
        acc.merge(&submesh.extents);
        acc
    })
}
