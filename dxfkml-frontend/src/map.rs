//! 预览页面：把 [`PreviewScene`] 渲染成独立的 Leaflet HTML 页面。

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use dxfkml_engine::PreviewScene;
use dxfkml_engine::convert::write_atomically;
use dxfkml_io::kml::{KML_MIME_TYPE, LatLonFeature};

use crate::errors::FrontendError;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>KML Preview</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>
html, body { height: 100%; margin: 0; }
#map { position: absolute; top: 0; bottom: 2.5em; width: 100%; }
#download { position: absolute; bottom: 0; height: 2.5em; line-height: 2.5em; width: 100%; text-align: center; font-family: sans-serif; }
</style>
</head>
<body>
<div id="map"></div>
<div id="download"><a id="download-link">Download KML file</a></div>
<script>
const preview = {{preview}};
const google = (layer) => L.tileLayer(
  "https://mt1.google.com/vt/lyrs=" + layer + "&x={x}&y={y}&z={z}",
  { attribution: "Google", maxZoom: 22 }
);
const baseLayers = {
  "Streets": L.tileLayer("https://tile.openstreetmap.org/{z}/{x}/{y}.png", {
    attribution: "&copy; OpenStreetMap contributors",
    maxZoom: 19
  }),
  "Satellite": google("s"),
  "Hybrid": google("y"),
  "Terrain": google("p")
};
const map = L.map("map", {
  center: preview.center,
  zoom: preview.zoom,
  layers: [baseLayers[preview.baseLayer]]
});
const features = L.featureGroup(
  preview.features.map((points) => L.polyline(points, { color: "black", weight: 2, opacity: 0.8 }))
).addTo(map);
map.fitBounds(preview.bounds);
L.control.layers(baseLayers, { "KML Features": features }, { position: "topright" }).addTo(map);
L.control.scale().addTo(map);
document.title = "KML Preview: " + preview.kml.name;
const link = document.getElementById("download-link");
link.href = encodeURI(preview.kml.href);
link.download = preview.kml.name;
link.type = preview.kml.mime;
</script>
</body>
</html>
"#;

#[derive(Debug, Clone, Copy)]
pub struct MapOptions {
    pub satellite_default: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            satellite_default: true,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapPayload<'a> {
    center: [f64; 2],
    zoom: u8,
    bounds: [[f64; 2]; 2],
    features: &'a [LatLonFeature],
    base_layer: &'static str,
    kml: KmlLink<'a>,
}

#[derive(Serialize)]
struct KmlLink<'a> {
    name: &'a str,
    href: &'a str,
    mime: &'static str,
}

/// 渲染页面。`kml_href` 是下载链接相对页面的地址。
pub fn render_map(
    scene: &PreviewScene,
    kml_href: &str,
    options: MapOptions,
) -> Result<String, FrontendError> {
    let [south_west, north_east] = scene.bounds.corners();
    let name = kml_href.rsplit(['/', '\\']).next().unwrap_or(kml_href);
    let payload = MapPayload {
        center: [scene.bounds.center_lat, scene.bounds.center_lon],
        zoom: scene.zoom,
        bounds: [
            [south_west.0, south_west.1],
            [north_east.0, north_east.1],
        ],
        features: &scene.features,
        base_layer: if options.satellite_default {
            "Satellite"
        } else {
            "Streets"
        },
        kml: KmlLink {
            name,
            href: kml_href,
            mime: KML_MIME_TYPE,
        },
    };
    // 防止数据中的 `</script>` 提前结束脚本块。
    let json = serde_json::to_string(&payload)?.replace("</", "<\\/");
    Ok(PAGE_TEMPLATE.replace("{{preview}}", &json))
}

/// KML 旁边的同名 `.html`。
pub fn default_map_path(kml_path: &Path) -> PathBuf {
    kml_path.with_extension("html")
}

/// 渲染并写出页面，返回页面路径。
pub fn write_map(
    scene: &PreviewScene,
    kml_path: &Path,
    map_path: Option<&Path>,
    options: MapOptions,
) -> Result<PathBuf, FrontendError> {
    let map_path = map_path.map_or_else(|| default_map_path(kml_path), Path::to_path_buf);
    let href = download_href(kml_path, &map_path);
    let html = render_map(scene, &href, options)?;
    write_atomically(&map_path, html.as_bytes())?;
    info!(
        map = %map_path.display(),
        kml = %kml_path.display(),
        features = scene.features.len(),
        zoom = scene.zoom,
        "预览页面已写出"
    );
    Ok(map_path)
}

fn download_href(kml_path: &Path, map_path: &Path) -> String {
    let same_dir = kml_path.parent().unwrap_or(Path::new(""))
        == map_path.parent().unwrap_or(Path::new(""));
    match kml_path.file_name() {
        Some(name) if same_dir => name.to_string_lossy().into_owned(),
        _ => kml_path.to_string_lossy().into_owned(),
    }
}
