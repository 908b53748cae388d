use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const QUAD: &str = "\
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

fn write_demo(with_images: bool) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    fs::create_dir_all(root.join("models")).expect("models dir");
    for name in ["plane", "pot", "sphere"] {
        fs::write(root.join("models").join(format!("{name}.obj")), QUAD).expect("write mesh");
    }
    if with_images {
        fs::create_dir_all(root.join("stone")).expect("texture dir");
        for map in ["diffuse", "normal", "height"] {
            image::RgbImage::new(4, 4)
                .save(root.join("stone").join(format!("{map}.png")))
                .expect("write texture");
        }
    }

    let config = r#"<demo>
  <window>
    <title>Test Demo</title>
    <width>640</width>
    <height>480</height>
  </window>
  <mesh><name>plane</name><path>models/plane.obj</path></mesh>
  <mesh><name>pot</name><path>models/pot.obj</path></mesh>
  <mesh><name>sphere</name><path>models/sphere.obj</path></mesh>
  <material>
    <name>stone</name>
    <diffuse>stone/diffuse.png</diffuse>
    <normal>stone/normal.png</normal>
    <height>stone/height.png</height>
  </material>
</demo>
"#;
    fs::write(root.join("demo.xml"), config).expect("write config");
    dir
}

fn shading_lab(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shading-lab").expect("binary exists");
    cmd.arg(config).arg("--summary-only");
    cmd
}

#[test]
fn summary_lists_meshes_textures_and_techniques() {
    let demo = write_demo(true);
    shading_lab(&demo.path().join("demo.xml"))
        .assert()
        .success()
        .stdout(contains("Loaded 3 meshes"))
        .stdout(contains(" - plane: 2 faces"))
        .stdout(contains("Texture sets: 1 (0 placeholder maps)"))
        .stdout(contains(" - stone"))
        .stdout(contains(
            "Techniques: PLAIN, BUMP, NORMAL, PARALLAX, DISPLACEMENT, LIGHT",
        ));
}

#[test]
fn missing_textures_fall_back_to_placeholders() {
    let demo = write_demo(false);
    shading_lab(&demo.path().join("demo.xml"))
        .assert()
        .success()
        .stdout(contains("Texture sets: 1 (3 placeholder maps)"));
}

#[test]
fn strict_textures_refuse_to_start() {
    let demo = write_demo(false);
    shading_lab(&demo.path().join("demo.xml"))
        .arg("--strict-textures")
        .assert()
        .code(1)
        .stderr(contains("failed to load texture"));
}

#[test]
fn missing_config_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    shading_lab(&dir.path().join("absent.xml"))
        .assert()
        .code(1)
        .stderr(contains("failed to load config"));
}

#[test]
fn unknown_flags_are_rejected() {
    let mut cmd = Command::cargo_bin("shading-lab").expect("binary exists");
    cmd.arg("--fullscreen")
        .assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"));
}
