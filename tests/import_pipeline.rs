use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use piecework::prelude::*;

const TANK_OBJ: &str = "\
o base
v -1 0 -1
v 1 0 -1
v 1 0 1
v -1 0 1
f 1 2 3 4
o arm
v 0 1 0
v 0 2 0
v 0 1 1
f 5 6 7
";

const TANK_META: &str = r#"
radius = 9
tex1 = "tank.png"
fliptextures = false

[pieces.arm]
parent = "base"
offset = [0.0, 1.5, 0.0]
rotatey = 90
"#;

/// Fresh scratch directory for one test.
fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("piecework-{test}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn names(model: &Model, ids: &[PieceId]) -> Vec<String> {
    ids.iter()
        .map(|&id| model.pieces()[id].name().to_string())
        .collect()
}

#[test]
fn obj_with_sidecar_builds_the_declared_tree() {
    let dir = scratch_dir("obj-sidecar");
    let path = dir.join("tank.obj");
    fs::write(&path, TANK_OBJ).unwrap();
    fs::write(dir.join("tank.toml"), TANK_META).unwrap();

    let model = ModelLoader::default().load(&path).unwrap();

    assert_eq!(model.format(), ModelFormat::Obj);
    assert_eq!(model.piece_count(), 3);
    assert_eq!(model.root().name(), ROOT_PIECE_NAME);
    assert_eq!(names(&model, model.root().children()), vec!["base"]);

    let base = model.find_piece("base").unwrap();
    assert_eq!(names(&model, base.children()), vec!["arm"]);
    assert_eq!(base.vertex_count(), 4);
    assert_eq!(base.mesh().unwrap().triangle_count(), 2);

    let arm = model.find_piece("arm").unwrap();
    assert_eq!(arm.offset(), Vec3::new(0.0, 1.5, 0.0));
    assert_relative_eq!(arm.rotation().y, std::f32::consts::FRAC_PI_2, epsilon = 1e-6);
    assert_eq!(arm.global_offset(), Vec3::new(0.0, 1.5, 0.0));

    assert_relative_eq!(model.radius(), 9.0);
    assert_eq!(model.textures().tex1, "tank.png");
    assert!(!model.textures().flip_y);
    assert!(model.report().is_clean());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn full_name_sidecar_wins_over_stem_sidecar() {
    let dir = scratch_dir("sidecar-order");
    let path = dir.join("tank.obj");
    fs::write(&path, TANK_OBJ).unwrap();
    fs::write(dir.join("tank.obj.toml"), "radius = 3").unwrap();
    fs::write(dir.join("tank.toml"), "radius = 7").unwrap();

    let model = ModelLoader::default().load(&path).unwrap();
    assert_relative_eq!(model.radius(), 3.0);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_sidecar_falls_back_to_defaults() {
    let dir = scratch_dir("no-sidecar");
    let path = dir.join("tank.obj");
    fs::write(&path, TANK_OBJ).unwrap();

    let model = ModelLoader::default().load(&path).unwrap();

    assert!(matches!(
        model.report().warnings(),
        [LoadWarning::MetadataMissing { .. }]
    ));
    // Without metadata OBJ objects hang straight off the root.
    assert_eq!(names(&model, model.root().children()), vec!["base", "arm"]);
    assert_eq!(model.textures().tex1, "default.png");
    assert!(model.textures().flip_y);
    assert!(model.textures().invert_alpha);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn invalid_sidecar_is_reported_and_ignored() {
    let dir = scratch_dir("bad-sidecar");
    let path = dir.join("tank.obj");
    fs::write(&path, TANK_OBJ).unwrap();
    fs::write(dir.join("tank.toml"), "radius = = 3").unwrap();

    let model = ModelLoader::default().load(&path).unwrap();

    assert!(matches!(
        model.report().warnings(),
        [LoadWarning::MetadataInvalid { .. }]
    ));
    assert_eq!(model.piece_count(), 3);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn custom_metadata_extension() {
    let dir = scratch_dir("meta-ext");
    let path = dir.join("tank.obj");
    fs::write(&path, TANK_OBJ).unwrap();
    fs::write(dir.join("tank.meta"), "height = 42").unwrap();

    let options = ImportOptions::from_toml_str("metadata_extension = \"meta\"").unwrap();
    let model = ModelLoader::new(options).load(&path).unwrap();
    assert_relative_eq!(model.height(), 42.0);

    fs::remove_dir_all(&dir).unwrap();
}

/// Three corners of a unit triangle, then indices `0 1 2` padded to four bytes.
fn triangle_buffer() -> Vec<u8> {
    let mut bytes = Vec::new();
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    for index in [0u16, 1, 2, 0] {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes
}

/// `base` (unindexed triangle) with child `arm` (indexed triangle plus a
/// point primitive), and a mesh-less `hatch`. `top_level` lists the scene's
/// top-level node indices.
fn write_gltf(dir: &std::path::Path, top_level: &str) -> PathBuf {
    fs::write(dir.join("tri.bin"), triangle_buffer()).unwrap();
    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [{top_level}] }}],
  "nodes": [
    {{ "name": "base", "mesh": 0, "children": [1] }},
    {{ "name": "arm", "mesh": 1, "translation": [0, 2, 0], "rotation": [0, 0, 0.70710677, 0.70710677] }},
    {{ "name": "hatch" }}
  ],
  "meshes": [
    {{ "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }},
    {{ "primitives": [
      {{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }},
      {{ "attributes": {{ "POSITION": 0 }}, "mode": 0 }}
    ] }}
  ],
  "buffers": [{{ "uri": "tri.bin", "byteLength": 44 }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#
    );
    let path = dir.join("tank.gltf");
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn gltf_single_top_level_node_becomes_the_root() {
    let dir = scratch_dir("gltf-single");
    let path = write_gltf(&dir, "0");
    fs::write(dir.join("tank.toml"), "[pieces.arm]\nparent = \"base\"").unwrap();

    let model = ModelLoader::default().load(&path).unwrap();

    assert_eq!(model.format(), ModelFormat::Gltf);
    assert_eq!(model.piece_count(), 2);
    assert!(model.find_piece("base").is_none());
    assert_eq!(names(&model, model.root().children()), vec!["arm"]);
    assert!(model.report().is_clean());

    // Unindexed primitives read their vertices in order.
    assert_eq!(model.root().vertex_count(), 3);
    assert_eq!(model.root().mesh().unwrap().triangle_count(), 1);

    let arm = model.find_piece("arm").unwrap();
    assert_eq!(arm.vertex_count(), 3);
    assert_eq!(arm.mesh().unwrap().triangle_count(), 1);
    assert_eq!(arm.offset(), Vec3::new(0.0, 2.0, 0.0));
    assert_relative_eq!(arm.rotation().x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(arm.rotation().y, 0.0, epsilon = 1e-6);
    assert_relative_eq!(arm.rotation().z, std::f32::consts::FRAC_PI_2, epsilon = 1e-5);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn gltf_top_level_nodes_hang_off_a_file_named_root() {
    let dir = scratch_dir("gltf-many");
    let path = write_gltf(&dir, "0, 2");

    let model = ModelLoader::default().load(&path).unwrap();

    assert_eq!(model.piece_count(), 4);
    assert_eq!(names(&model, model.root().children()), vec!["base", "hatch"]);
    let base = model.find_piece("base").unwrap();
    assert_eq!(names(&model, base.children()), vec!["arm"]);
    assert_eq!(base.vertex_count(), 3);
    assert!(model.find_piece("hatch").unwrap().is_empty());
    assert!(matches!(
        model.report().warnings(),
        [LoadWarning::MetadataMissing { .. }]
    ));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unreadable_files_fail_the_load() {
    let dir = scratch_dir("corrupt");

    let missing = ModelLoader::default().load(&dir.join("missing.obj")).unwrap_err();
    assert!(matches!(missing, LoadError::Import(ImportError::Obj { .. })));

    let corrupt = dir.join("corrupt.gltf");
    fs::write(&corrupt, "this is not json").unwrap();
    let err = ModelLoader::default().load(&corrupt).unwrap_err();
    assert!(matches!(err, LoadError::Import(ImportError::Gltf { .. })));
    assert!(err.to_string().contains("corrupt.gltf"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unsupported_extension_is_rejected() {
    let err = ModelLoader::default()
        .load(std::path::Path::new("tank.fbx"))
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::UnsupportedFormat { ref extension, .. } if extension == "fbx"
    ));
}

#[test]
fn cache_shares_one_model() {
    let dir = scratch_dir("cache");
    let path = dir.join("tank.obj");
    fs::write(&path, TANK_OBJ).unwrap();

    let mut backend = SoftwareBackend::new();
    let mut cache = ModelCache::default();
    let first = cache.get_or_load_compiled(&path, &mut backend).unwrap();
    let second = cache.get_or_load(&path).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert!(first.find_piece("base").unwrap().draw_list().is_some());

    fs::remove_dir_all(&dir).unwrap();
}
