use std::fs;
use std::path::{Path, PathBuf};

use dxfkml_config::AppConfig;
use dxfkml_engine::EngineError;
use dxfkml_frontend::{
    ConvertOptions, FrontendError, PreviewOptions, run_convert, run_preview,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn staged_fixture(dir: &Path, name: &str) -> PathBuf {
    let target = dir.join(name);
    fs::copy(fixture(name), &target).expect("copy fixture");
    target
}

#[test]
fn convert_prints_statistics_and_writes_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = staged_fixture(dir.path(), "site_plan.dxf");
    let mut out = Vec::new();

    let report = run_convert(
        &AppConfig::default(),
        &ConvertOptions {
            input: input.clone(),
            epsg: Some("32633".to_string()),
            ..ConvertOptions::default()
        },
        &mut out,
    )
    .expect("convert");

    assert_eq!(report.output, dir.path().join("site_plan.kml"));
    assert!(report.output.exists());
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("entities:  6"), "{text}");
    assert!(text.contains("layers:    4 (ANNOT, PARCELS, ROADS, Unknown)"), "{text}");
    assert!(text.contains("polylines: 3 (3 written, 0 skipped)"), "{text}");
    assert!(!dir.path().join("site_plan.html").exists());
}

#[test]
fn json_report_and_preview_map() {
    let dir = tempfile::tempdir().unwrap();
    let input = staged_fixture(dir.path(), "site_plan.dxf");
    let output = dir.path().join("custom.kml");
    let mut out = Vec::new();

    run_convert(
        &AppConfig::default(),
        &ConvertOptions {
            input,
            epsg: Some("WGS 84 / UTM zone 33N: 32633".to_string()),
            output: Some(output.clone()),
            preview: true,
            json: true,
            ..ConvertOptions::default()
        },
        &mut out,
    )
    .unwrap();

    let report: serde_json::Value = serde_json::from_slice(&out).expect("valid json");
    assert_eq!(report["features"], 3);
    assert_eq!(report["skipped"], 0);
    assert_eq!(report["statistics"]["total_entities"], 6);
    assert_eq!(report["statistics"]["polylines"], 3);

    let html = fs::read_to_string(dir.path().join("custom.html")).expect("map page");
    assert!(html.contains(r#""href":"custom.kml""#));
    assert!(html.contains("leaflet"));
}

#[test]
fn empty_drawing_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = staged_fixture(dir.path(), "no_polylines.dxf");
    let mut out = Vec::new();
    let err = run_convert(
        &AppConfig::default(),
        &ConvertOptions {
            input,
            epsg: Some("32633".to_string()),
            ..ConvertOptions::default()
        },
        &mut out,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        FrontendError::Engine(EngineError::EmptyResult)
    ));
    assert!(out.is_empty());
    assert!(!dir.path().join("no_polylines.kml").exists());
}

#[test]
fn preview_command_renders_existing_kml() {
    let dir = tempfile::tempdir().unwrap();
    let kml = dir.path().join("field.kml");
    fs::write(
        &kml,
        r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document><Placemark><LineString>
<coordinates>15.0,45.0 15.5,45.5</coordinates></LineString></Placemark></Document></kml>"#,
    )
    .unwrap();
    let map = dir.path().join("maps").join("field.html");
    fs::create_dir_all(map.parent().unwrap()).unwrap();

    let mut out = Vec::new();
    let written = run_preview(
        &AppConfig::default(),
        &PreviewOptions {
            kml: kml.clone(),
            map: Some(map.clone()),
        },
        &mut out,
    )
    .unwrap();
    assert_eq!(written, map);
    let html = fs::read_to_string(&map).unwrap();
    assert!(html.contains(r#""zoom":12"#));
    assert!(String::from_utf8(out).unwrap().starts_with("Preview map: "));
}

#[test]
fn preview_without_features_reports_nothing_to_preview() {
    let dir = tempfile::tempdir().unwrap();
    let kml = dir.path().join("blank.kml");
    fs::write(&kml, "<kml><Document/></kml>").unwrap();
    let err = run_preview(
        &AppConfig::default(),
        &PreviewOptions {
            kml,
            map: None,
        },
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FrontendError::Engine(EngineError::NothingToPreview)
    ));
}
