//! End-to-end tests for the assetbake binary

use std::path::Path;
use std::process::{Command, Output};

use assetbake_format::container::write_container_file;
use assetbake_format::{
    AssetCodec, AssetType, ContainerHeader, ImageBuffer, ImageCodec, ImportedSubmesh, MeshBuffer, MeshCodec,
    PixelType, Vertex,
};

fn assetbake(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_assetbake"))
        .args(args)
        .output()
        .unwrap()
}

/// Helper to write an 8x8 red image container
fn make_container(path: &Path) {
    let mut image = ImageBuffer::allocated("red", PixelType::Unorm8, 8, 8, 4, 1, 1).unwrap();
    for pixel in image.cell_mut(0, 0).unwrap().data_mut().chunks_mut(4) {
        pixel.copy_from_slice(&[255, 0, 0, 255]);
    }
    ImageCodec.write_file(&image, path).unwrap();
}

#[test]
fn test_info_json() {
    let dir = tempfile::tempdir().unwrap();
    let container = dir.path().join("red.ast");
    make_container(&container);

    let output = assetbake(&["info", "--format", "json", container.to_str().unwrap()]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["type"], "image");
    assert_eq!(json["name"], "red");
    assert_eq!(json["width"], 8);
    assert_eq!(json["cells"].as_array().unwrap().len(), 1);
}

#[test]
fn test_extract_then_rebake() {
    let dir = tempfile::tempdir().unwrap();
    let container = dir.path().join("red.ast");
    make_container(&container);

    let preview = dir.path().join("out").join("red.png");
    let output = assetbake(&["extract", container.to_str().unwrap(), "-o", preview.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(preview.exists());

    let rebaked = dir.path().join("rebaked.ast");
    let output = assetbake(&[
        "bake-image",
        preview.to_str().unwrap(),
        "-o",
        rebaked.to_str().unwrap(),
        "--mips",
        "0",
        "--compression",
        "bc1",
    ]);
    assert!(output.status.success());

    let image = ImageCodec.read_file(&rebaked).unwrap();
    assert_eq!(image.mip_slices(), 4);
    assert_eq!(image.cell(0, 0).unwrap().byte_size(), 2 * 2 * 8);
}

#[test]
fn test_garbage_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.ast");
    std::fs::write(&path, b"not a container").unwrap();

    let output = assetbake(&["info", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("junk.ast"));
}

#[test]
fn test_lenient_detailed_info_on_corrupt_submesh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.ast");

    let mut source = vec![ImportedSubmesh {
        name: "tri".into(),
        vertices: vec![Vertex::default(); 3],
        triangles: vec![[0, 1, 2]],
        ..Default::default()
    }];
    let mut mesh = MeshBuffer::from_topology("m", &mut source).unwrap();
    mesh.submeshes[0].base_index = u32::MAX;
    // Bypass validation so the corrupt range reaches disk
    write_container_file(&path, |session| {
        ContainerHeader::new(AssetType::Mesh).write(session)?;
        MeshCodec.write_payload(&mesh, session)
    })
    .unwrap();

    let output = assetbake(&["info", "--lenient", "--detailed", path.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("indices {}..{}", u32::MAX, u64::from(u32::MAX) + 3)));
}
