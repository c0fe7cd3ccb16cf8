//! Integration tests for the asset container
//!
//! These tests cover:
//! - Image and mesh round-trips through files
//! - Header rejection (signature, version, asset type)
//! - Declared sizes checked before allocation
//! - `read_into` leaving its target untouched on failure
//! - Interrupted writes never clobbering an existing container

use std::fs;
use std::io::Cursor;
use std::path::Path;

use assetbake_core::{Error, Vec2, Vec3};
use assetbake_format::container::partial_path;
use assetbake_format::{
    probe_header, read_asset_file, Asset, AssetCodec, AssetType, CodecOptions, ImageBuffer,
    ImageCodec, ImportedSubmesh, MaterialSource, MeshBuffer, MeshCodec, PixelType,
    SkeletalVertex, Vertex,
};

/// Helper to create an image with distinct bytes in every cell
fn make_image(pixel_type: PixelType, components: u8, slices: usize, mips: usize) -> ImageBuffer {
    let mut image = ImageBuffer::allocated("test_image", pixel_type, 16, 8, components, slices, mips).unwrap();
    for slice in 0..slices {
        for mip in 0..mips {
            let cell = image.cell_mut(slice, mip).unwrap();
            for (i, byte) in cell.data_mut().iter_mut().enumerate() {
                *byte = (i * 31 + slice * 17 + mip * 5) as u8;
            }
        }
    }
    image
}

fn make_vertex(x: f32, y: f32, z: f32) -> Vertex {
    Vertex {
        position: Vec3::new(x, y, z),
        uv: Vec2::new(x, y),
        normal: Vec3::UP,
        tangent: Vec3::new(1.0, 0.0, 0.0),
        bitangent: Vec3::new(0.0, 0.0, -1.0),
    }
}

fn make_submesh(name: &str, offset: f32, material: &str, skinned: bool) -> ImportedSubmesh {
    let vertices = vec![
        make_vertex(offset, 0.0, 0.0),
        make_vertex(offset + 1.0, 0.0, 0.0),
        make_vertex(offset + 1.0, 0.0, 1.0),
        make_vertex(offset, 2.0, 1.0),
    ];
    let skeletal_vertices = if skinned {
        (0..4)
            .map(|i| SkeletalVertex {
                bone_indices: [i, 0, 0, 0],
                bone_weights: [1.0, 0.0, 0.0, 0.0],
            })
            .collect()
    } else {
        Vec::new()
    };
    ImportedSubmesh {
        name: name.to_string(),
        material: Some(MaterialSource::new(material, format!("materials/{}.json", material))),
        vertices,
        skeletal_vertices,
        triangles: vec![[0, 1, 2], [0, 2, 3]],
    }
}

/// Helper to create a two-submesh mesh
fn make_mesh(skinned: bool) -> MeshBuffer {
    let mut source = vec![
        make_submesh("hull", 0.0, "steel", skinned),
        make_submesh("canopy", 3.0, "glass", skinned),
    ];
    MeshBuffer::from_topology("ship", &mut source).unwrap()
}

mod image_tests {
    use super::*;

    #[test]
    fn test_round_trip_all_pixel_types() {
        let dir = tempfile::tempdir().unwrap();
        for (i, pixel_type) in [PixelType::Unorm8, PixelType::Half16, PixelType::Float32].into_iter().enumerate() {
            let image = make_image(pixel_type, 3, 6, 3);
            let path = dir.path().join(format!("image_{}.ast", i));
            ImageCodec.write_file(&image, &path).unwrap();

            let loaded = ImageCodec.read_file(&path).unwrap();
            assert_eq!(loaded.pixel_type(), pixel_type);
            assert_eq!(loaded.components(), 3);
            assert_eq!(loaded.compression(), image.compression());
            assert_eq!(loaded, image);
        }
    }

    #[test]
    fn test_probe_and_read_asset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("albedo.ast");
        ImageCodec.write_file(&make_image(PixelType::Unorm8, 4, 1, 2), &path).unwrap();

        assert_eq!(probe_header(&path).unwrap().asset_type, AssetType::Image);
        match read_asset_file(&path, &CodecOptions::default()).unwrap() {
            Asset::Image(image) => assert_eq!(image.name(), "test_image"),
            other => panic!("expected image, got {:?}", other.asset_type()),
        }
    }

    #[test]
    fn test_mesh_reader_rejects_image() {
        let bytes = ImageCodec
            .write(&make_image(PixelType::Unorm8, 1, 1, 1), Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        let err = MeshCodec.read(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::UnexpectedAssetType { found: 0, .. }));
    }
}

mod mesh_tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ship.ast");
        let mesh = make_mesh(false);
        MeshCodec.write_file(&mesh, &path).unwrap();

        let loaded = MeshCodec.read_file(&path).unwrap();
        assert_eq!(loaded.vertices, mesh.vertices);
        assert_eq!(loaded.indices, mesh.indices);
        assert_eq!(loaded.submeshes, mesh.submeshes);
        assert_eq!(loaded.extents, mesh.extents);
        assert!(!loaded.is_skinned());
    }

    #[test]
    fn test_skinned_round_trip() {
        let mesh = make_mesh(true);
        let bytes = MeshCodec.write(&mesh, Cursor::new(Vec::new())).unwrap().into_inner();
        let loaded = MeshCodec.read(Cursor::new(bytes)).unwrap();
        assert_eq!(loaded.skeletal_vertices.len(), loaded.vertices.len());
        assert_eq!(loaded, mesh);
    }

    #[test]
    fn test_partition_properties() {
        let mesh = make_mesh(false);
        let (s0, s1) = (&mesh.submeshes[0], &mesh.submeshes[1]);
        assert_eq!(s1.base_index, s0.base_index + s0.index_count);
        assert!(mesh.submesh_indices(s0).iter().all(|&i| (i as usize) < mesh.vertex_count()));
        assert_eq!(mesh.extents.min, s0.extents.min.min(&s1.extents.min));
        assert_eq!(mesh.extents.max, s0.extents.max.max(&s1.extents.max));
    }

    #[test]
    fn test_material_paths_resolve_next_to_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ships").join("ship.ast");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        MeshCodec.write_file(&make_mesh(false), &path).unwrap();

        let loaded = MeshCodec.read_file(&path).unwrap();
        let resolved = loaded.resolve_material_paths(&path);
        assert_eq!(resolved[0], dir.path().join("ships").join("materials").join("steel.json"));
        assert_eq!(resolved.len(), 2);
    }
}

mod rejection_tests {
    use super::*;

    fn image_bytes() -> Vec<u8> {
        ImageCodec
            .write(&make_image(PixelType::Unorm8, 4, 1, 1), Cursor::new(Vec::new()))
            .unwrap()
            .into_inner()
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = image_bytes();
        bytes[0] = b'x';
        assert!(ImageCodec.read(Cursor::new(bytes)).unwrap_err().is_format_error());
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = image_bytes();
        bytes[4] = 2;
        let err = ImageCodec.read(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { version: 2, supported: 1 }));
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageCodec.read_file(&dir.path().join("missing.ast")).unwrap_err();
        assert!(err.is_open_error());
    }

    #[test]
    fn test_truncated_mesh_is_size_mismatch() {
        let mut bytes = MeshCodec.write(&make_mesh(false), Cursor::new(Vec::new())).unwrap().into_inner();
        bytes.truncate(bytes.len() - 10);
        assert!(MeshCodec.read(Cursor::new(bytes)).unwrap_err().is_size_mismatch());
    }

    #[test]
    fn test_read_into_leaves_target_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.ast");
        let mut bytes = image_bytes();
        bytes[4] = 9;
        fs::write(&path, bytes).unwrap();

        let mut target = make_image(PixelType::Float32, 2, 2, 2);
        let before = target.clone();
        assert!(ImageCodec.read_into(&path, &mut target).is_err());
        assert_eq!(target, before);

        let mut mesh_target = make_mesh(true);
        let mesh_before = mesh_target.clone();
        assert!(MeshCodec.read_into(&path, &mut mesh_target).is_err());
        assert_eq!(mesh_target, mesh_before);
    }

    #[test]
    fn test_read_into_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.ast");
        let image = make_image(PixelType::Unorm8, 1, 1, 4);
        ImageCodec.write_file(&image, &path).unwrap();

        let mut target = ImageBuffer::new("placeholder");
        ImageCodec.read_into(&path, &mut target).unwrap();
        assert_eq!(target, image);
    }
}

mod file_safety_tests {
    use super::*;

    #[test]
    fn test_failed_write_keeps_existing_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ship.ast");
        let mesh = make_mesh(false);
        MeshCodec.write_file(&mesh, &path).unwrap();
        let original = fs::read(&path).unwrap();

        let mut broken = mesh.clone();
        broken.submeshes[1].material_index = 42;
        assert!(MeshCodec.write_file(&broken, &path).is_err());

        assert_eq!(fs::read(&path).unwrap(), original);
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_write_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("a.ast");
        assert!(ImageCodec.write_file(&make_image(PixelType::Unorm8, 4, 1, 1), &path).is_err());
        assert!(!Path::new(&path).exists());
    }
}

// Property-based tests using proptest
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn pixel_type_strategy() -> impl Strategy<Value = PixelType> {
        prop_oneof![
            Just(PixelType::Unorm8),
            Just(PixelType::Half16),
            Just(PixelType::Float32),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_image_round_trip(
            pixel_type in pixel_type_strategy(),
            components in 1u8..=4,
            width_log in 0u32..6,
            height_log in 0u32..6,
            slices in 1usize..4,
            seed in any::<u8>(),
        ) {
            let (width, height) = (1u32 << width_log, 1u32 << height_log);
            let mips = width_log.min(height_log) as usize + 1;
            let mut image = ImageBuffer::allocated("prop", pixel_type, width, height, components, slices, mips).unwrap();
            for slice in 0..slices {
                for mip in 0..mips {
                    for (i, byte) in image.cell_mut(slice, mip).unwrap().data_mut().iter_mut().enumerate() {
                        *byte = seed.wrapping_add(i as u8);
                    }
                }
            }

            let bytes = ImageCodec.write(&image, Cursor::new(Vec::new())).unwrap().into_inner();
            let decoded = ImageCodec.read(Cursor::new(bytes)).unwrap();
            prop_assert_eq!(decoded, image);
        }

        #[test]
        fn test_truncation_never_panics(cut in 0usize..400) {
            let bytes = MeshCodec.write(&make_mesh(true), Cursor::new(Vec::new())).unwrap().into_inner();
            let cut = cut.min(bytes.len() - 1);
            prop_assert!(MeshCodec.read(Cursor::new(bytes[..cut].to_vec())).is_err());
        }

        #[test]
        fn test_to_rgba_alpha_is_max(components in 1u8..=3, value in any::<u8>()) {
            let mut image = ImageBuffer::allocated("a", PixelType::Unorm8, 2, 2, components, 1, 1).unwrap();
            image.cell_mut(0, 0).unwrap().data_mut().fill(value);
            let rgba = image.to_rgba_image().unwrap();
            for pixel in rgba.cell(0, 0).unwrap().data().chunks(4) {
                prop_assert_eq!(pixel[0], value);
                prop_assert_eq!(pixel[3], 255);
            }
        }
    }
}
