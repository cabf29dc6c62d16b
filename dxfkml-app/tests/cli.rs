use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// 在隔离的工作目录中运行，避免读到开发者本地的配置。
fn dxfkml(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dxfkml").expect("binary built");
    cmd.current_dir(workdir.path())
        .env_remove("DXFKML_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn convert_writes_kml_and_prints_statistics() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture("site_plan.dxf"), dir.path().join("site_plan.dxf")).unwrap();

    dxfkml(&dir)
        .args(["convert", "site_plan.dxf", "--epsg", "32633"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entities:  6"))
        .stdout(predicate::str::contains("polylines: 3 (3 written, 0 skipped)"));

    let kml = fs::read_to_string(dir.path().join("site_plan.kml")).unwrap();
    assert_eq!(kml.matches("<Placemark>").count(), 3);
}

#[test]
fn json_report_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.kml");
    let assert = dxfkml(&dir)
        .arg("convert")
        .arg(fixture("site_plan.dxf"))
        .args(["--epsg", "32633", "--json", "--output"])
        .arg(&output)
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("json on stdout");
    assert_eq!(report["features"], 3);
    assert_eq!(report["statistics"]["total_layers"], 4);
    assert!(output.exists());
}

#[test]
fn stdin_input_requires_and_uses_output() {
    let dir = TempDir::new().unwrap();
    let bytes = fs::read(fixture("site_plan.dxf")).unwrap();

    dxfkml(&dir)
        .args(["convert", "-", "--epsg", "32633"])
        .write_stdin(bytes.clone())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("requires --output"));

    dxfkml(&dir)
        .args(["convert", "-", "--epsg", "32633", "--output", "piped.kml"])
        .write_stdin(bytes)
        .assert()
        .success();
    let kml = fs::read_to_string(dir.path().join("piped.kml")).unwrap();
    assert!(kml.contains("<name>piped</name>"));
}

#[test]
fn empty_drawing_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture("no_polylines.dxf"), dir.path().join("lines.dxf")).unwrap();

    dxfkml(&dir)
        .args(["convert", "lines.dxf", "--epsg", "32633"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no convertible entities"));
    assert!(!dir.path().join("lines.kml").exists());
}

#[test]
fn invalid_epsg_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    dxfkml(&dir)
        .arg("convert")
        .arg(fixture("site_plan.dxf"))
        .args(["--epsg", "0", "--output", "never.kml"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unsupported coordinate reference system"));
    assert!(!dir.path().join("never.kml").exists());
}

#[test]
fn convert_with_preview_then_standalone_preview() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture("site_plan.dxf"), dir.path().join("site.dxf")).unwrap();

    dxfkml(&dir)
        .args(["convert", "site.dxf", "--epsg", "32633", "--preview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Preview map:"));
    assert!(dir.path().join("site.html").exists());

    dxfkml(&dir)
        .args(["preview", "site.kml", "--map", "again.html"])
        .assert()
        .success();
    let html = fs::read_to_string(dir.path().join("again.html")).unwrap();
    assert!(html.contains("KML Features"));
}

#[test]
fn epsg_listing_filters_catalog() {
    let dir = TempDir::new().unwrap();
    dxfkml(&dir)
        .args(["epsg", "--filter", "zone 33N"])
        .assert()
        .success()
        .stdout(predicate::str::contains("WGS 84 / UTM zone 33N: 32633"))
        .stdout(predicate::str::contains("ETRS89 / UTM zone 33N: 25833"))
        .stdout(predicate::str::contains("32632").not());
}

#[test]
fn config_supplies_default_epsg_and_style() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture("site_plan.dxf"), dir.path().join("site.dxf")).unwrap();
    let config = dir.path().join("dxfkml.toml");
    fs::write(
        &config,
        "[logging]\nlevel = \"warn\"\n\n[conversion]\ndefault_epsg = 32633\nline_color = \"ff00ff00\"\n",
    )
    .unwrap();

    dxfkml(&dir)
        .args(["convert", "site.dxf", "--config"])
        .arg(&config)
        .assert()
        .success();
    let kml = fs::read_to_string(dir.path().join("site.kml")).unwrap();
    assert!(kml.contains("<color>ff00ff00</color>"));
}

#[test]
fn missing_explicit_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    dxfkml(&dir)
        .args(["epsg", "--config", "nowhere.toml"])
        .assert()
        .failure()
        .code(1);
}
