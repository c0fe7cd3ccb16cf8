//! JSON material and scene documents
//!
//! Meshes reference materials by relative path; the documents those paths
//! point at live here. Every document is an internally tagged enum, so the
//! JSON carries a `"type"` field naming the variant:
//!
//! ```json
//! { "type": "pbr", "name": "hull", "metallic": 1.0, "textures": [ ... ] }
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use assetbake_format::material::normalize_relative;
use assetbake_format::TextureRef;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Document store errors
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Asset(#[from] assetbake_core::Error),

    #[error("Document path escapes the store root: {0}")]
    OutsideRoot(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

fn is_false(value: &bool) -> bool {
    !*value
}

/// How alpha is interpreted when rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// A material referenced from a mesh container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialDocument {
    Pbr {
        name: String,
        base_color_factor: [f32; 4],
        metallic: f32,
        roughness: f32,
        emissive_factor: [f32; 3],
        #[serde(default)]
        alpha_mode: AlphaMode,
        #[serde(skip_serializing_if = "is_false", default)]
        double_sided: bool,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        textures: Vec<TextureRef>,
    },
    Unlit {
        name: String,
        color: [f32; 4],
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        textures: Vec<TextureRef>,
    },
}

impl MaterialDocument {
    /// Untextured white metallic-roughness material
    pub fn pbr(name: impl Into<String>) -> Self {
        MaterialDocument::Pbr {
            name: name.into(),
            base_color_factor: [1.0; 4],
            metallic: 0.0,
            roughness: 1.0,
            emissive_factor: [0.0; 3],
            alpha_mode: AlphaMode::Opaque,
            double_sided: false,
            textures: Vec::new(),
        }
    }

    pub fn unlit(name: impl Into<String>, color: [f32; 4]) -> Self {
        MaterialDocument::Unlit {
            name: name.into(),
            color,
            textures: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MaterialDocument::Pbr { name, .. } | MaterialDocument::Unlit { name, .. } => name,
        }
    }

    pub fn textures(&self) -> &[TextureRef] {
        match self {
            MaterialDocument::Pbr { textures, .. } | MaterialDocument::Unlit { textures, .. } => textures,
        }
    }

    /// Append a texture reference
    pub fn with_texture(mut self, texture: TextureRef) -> Self {
        match &mut self {
            MaterialDocument::Pbr { textures, .. } | MaterialDocument::Unlit { textures, .. } => {
                textures.push(texture)
            }
        }
        self
    }
}

/// Light source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// What a scene node carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Transform-only node
    Group,
    /// Instance of a mesh container, relative to the scene document
    Mesh { path: String },
    Light {
        kind: LightKind,
        color: [f32; 3],
        intensity: f32,
    },
}

/// Scene graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub translation: [f32; 3],
    /// Quaternion, xyzw
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    /// Indices into the owning scene's node list
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<usize>,
}

impl SceneNode {
    /// Node with an identity transform
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            children: Vec::new(),
        }
    }
}

/// A flat node list where parents reference children by index
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub nodes: Vec<SceneNode>,
}

impl SceneDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Add a node, returning its index
    pub fn add_node(&mut self, node: SceneNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Nodes that are nobody's child
    pub fn roots(&self) -> Vec<usize> {
        let mut is_child = vec![false; self.nodes.len()];
        for node in &self.nodes {
            for &child in &node.children {
                if let Some(flag) = is_child.get_mut(child) {
                    *flag = true;
                }
            }
        }
        (0..self.nodes.len()).filter(|&i| !is_child[i]).collect()
    }

    /// Mesh container paths referenced by the scene, in node order
    pub fn mesh_paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match &node.kind {
            NodeKind::Mesh { path } => Some(path.as_str()),
            _ => None,
        })
    }
}

/// Reads and writes documents under a root directory
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
    pretty: bool,
}

impl DocumentStore {
    /// Store rooted at `root`, writing pretty-printed JSON
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pretty: true,
        }
    }

    /// Toggle pretty-printing
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a store-relative document path
    pub fn resolve(&self, relative: &str) -> DocumentResult<PathBuf> {
        let normalized = normalize_relative(relative);
        if normalized.is_empty() || normalized.starts_with("..") {
            return Err(DocumentError::OutsideRoot(relative.to_string()));
        }
        Ok(self.root.join(normalized))
    }

    pub fn read_material(&self, relative: &str) -> DocumentResult<MaterialDocument> {
        self.read(relative)
    }

    pub fn write_material(&self, relative: &str, material: &MaterialDocument) -> DocumentResult<PathBuf> {
        self.write(relative, material)
    }

    pub fn read_scene(&self, relative: &str) -> DocumentResult<SceneDocument> {
        self.read(relative)
    }

    pub fn write_scene(&self, relative: &str, scene: &SceneDocument) -> DocumentResult<PathBuf> {
        self.write(relative, scene)
    }

    fn read<T: DeserializeOwned>(&self, relative: &str) -> DocumentResult<T> {
        let path = self.resolve(relative)?;
        let reader = BufReader::new(File::open(&path)?);
        let document = serde_json::from_reader(reader)?;
        tracing::debug!(path = %path.display(), "Read document");
        Ok(document)
    }

    fn write<T: Serialize>(&self, relative: &str, document: &T) -> DocumentResult<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, document)?;
        } else {
            serde_json::to_writer(&mut writer, document)?;
        }
        writer.flush()?;

        tracing::debug!(path = %path.display(), "Wrote document");
        Ok(path)
    }
}
