//! Material and texture references
//!
//! Meshes never inline material content. Each material is recorded as a
//! relative path to an external document, resolved against the directory
//! of the container that names it.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What a texture feeds in a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureRole {
    BaseColor,
    Normal,
    MetallicRoughness,
    Occlusion,
    Emissive,
    /// Diffuse irradiance cubemap
    Irradiance,
    /// Prefiltered specular radiance cubemap
    Radiance,
}

impl TextureRole {
    /// Whether textures in this role are authored in sRGB
    pub fn default_srgb(self) -> bool {
        matches!(self, TextureRole::BaseColor | TextureRole::Emissive)
    }
}

/// A texture used by a material: role, stored path and color-space flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRef {
    pub role: TextureRole,
    pub path: String,
    pub srgb: bool,
}

impl TextureRef {
    /// Reference with the role's default color space
    pub fn new(role: TextureRole, path: impl AsRef<str>) -> Self {
        Self {
            role,
            path: normalize_relative(path.as_ref()),
            srgb: role.default_srgb(),
        }
    }
}

/// Weak reference from a mesh to a material document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialRef {
    path: String,
}

impl MaterialRef {
    /// Create a reference, normalizing separators and `.` components
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: normalize_relative(path.as_ref()),
        }
    }

    /// Stored relative path (forward slashes)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Join onto a base directory
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        self.path
            .split('/')
            .filter(|c| !c.is_empty())
            .fold(base_dir.to_path_buf(), |acc, component| acc.join(component))
    }

    /// Resolve against the directory holding `container_path`
    pub fn resolve_from_container(&self, container_path: &Path) -> PathBuf {
        let base = container_path.parent().unwrap_or_else(|| Path::new(""));
        self.resolve(base)
    }
}

impl std::fmt::Display for MaterialRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Normalize a relative path: forward slashes, no `.` or empty components,
/// `..` collapsed where it has something to pop and kept when leading.
pub fn normalize_relative(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut components: Vec<&str> = Vec::new();

    for component in path.trim().split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if matches!(components.last(), Some(last) if *last != "..") {
                    components.pop();
                } else {
                    components.push("..");
                }
            }
            _ => components.push(component),
        }
    }

    components.join("/")
}

/// Express `target` relative to `base_dir`, or `None` when they share no
/// common prefix (different roots or drives)
pub fn relative_path(base_dir: &Path, target: &Path) -> Option<String> {
    let base: Vec<_> = base_dir.components().collect();
    let target: Vec<_> = target.components().collect();

    let common = base.iter().zip(&target).take_while(|(a, b)| a == b).count();
    let anchored = |c: Option<&Component<'_>>| matches!(c, Some(Component::Prefix(_) | Component::RootDir));
    if common == 0 && (anchored(base.first()) || anchored(target.first())) {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat("..".to_string()).take(base.len() - common));
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize_relative("materials\\hull.json"), "materials/hull.json");
        assert_eq!(normalize_relative("./a//b/./c.json"), "a/b/c.json");
        assert_eq!(normalize_relative("a/../b.json"), "b.json");
        assert_eq!(normalize_relative("../../shared/m.json"), "../../shared/m.json");
    }

    #[test]
    fn test_resolve_from_container() {
        let reference = MaterialRef::new("materials/hull.json");
        let resolved = reference.resolve_from_container(Path::new("out/ships/hull.ast"));
        assert_eq!(resolved, Path::new("out/ships/materials/hull.json"));
    }

    #[test]
    fn test_resolve_bare_container_name() {
        let reference = MaterialRef::new("m.json");
        assert_eq!(reference.resolve_from_container(Path::new("hull.ast")), Path::new("m.json"));
    }

    #[test]
    fn test_relative_path() {
        let rel = relative_path(Path::new("out/meshes"), Path::new("out/materials/a.json")).unwrap();
        assert_eq!(rel, "../materials/a.json");
        let rel = relative_path(Path::new("out"), Path::new("out/a.json")).unwrap();
        assert_eq!(rel, "a.json");
        let rel = relative_path(Path::new("meshes"), Path::new("materials/a.json")).unwrap();
        assert_eq!(rel, "../materials/a.json");
        assert!(relative_path(Path::new("meshes"), Path::new("/abs/a.json")).is_none());
    }

    #[test]
    fn test_texture_ref_serde_shape() {
        let texture = TextureRef::new(TextureRole::BaseColor, "textures/albedo.ast");
        let json = serde_json::to_value(&texture).unwrap();
        assert_eq!(json["role"], "base_color");
        assert_eq!(json["srgb"], true);
        assert!(!TextureRef::new(TextureRole::Normal, "n.ast").srgb);
    }
}
