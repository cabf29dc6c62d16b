//! 预览：重新解析 KML，计算地理范围与近似缩放级别。

use std::path::Path;

use tracing::info;
use dxfkml_core::geometry::GeoBounds;
use dxfkml_io::extract_features;
use dxfkml_io::kml::LatLonFeature;

use crate::errors::EngineError;

/// 跨度阈值（度）与对应缩放级别，自大到小匹配 `span > 阈值`。
const ZOOM_STEPS: [(f64, u8); 7] = [
    (5.0, 8),
    (2.0, 9),
    (1.0, 10),
    (0.5, 11),
    (0.1, 12),
    (0.05, 13),
    (0.01, 14),
];
const MAX_PREVIEW_ZOOM: u8 = 15;

/// 根据跨度（度）挑选 Web 地图缩放级别。只是粗略的阶梯函数，不做精确的瓦片适配。
pub fn zoom_for_span(span: f64) -> u8 {
    ZOOM_STEPS
        .iter()
        .find(|(threshold, _)| span > *threshold)
        .map_or(MAX_PREVIEW_ZOOM, |(_, zoom)| *zoom)
}

/// 全部要素全部点的范围；没有任何点时返回 `None`。
pub fn compute_bounds(features: &[LatLonFeature]) -> Option<GeoBounds> {
    GeoBounds::from_lat_lon(features.iter().flatten().copied())
}

/// 交给地图渲染端的数据。
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewScene {
    pub features: Vec<LatLonFeature>,
    pub bounds: GeoBounds,
    pub zoom: u8,
}

impl PreviewScene {
    pub fn from_features(features: Vec<LatLonFeature>) -> Result<Self, EngineError> {
        let bounds = compute_bounds(&features).ok_or(EngineError::NothingToPreview)?;
        let zoom = zoom_for_span(bounds.max_span());
        Ok(Self {
            features,
            bounds,
            zoom,
        })
    }

    pub fn from_kml_path(path: &Path) -> Result<Self, EngineError> {
        let features = extract_features(path).map_err(EngineError::Parse)?;
        let scene = Self::from_features(features)?;
        info!(
            path = %path.display(),
            features = scene.features.len(),
            points = scene.point_count(),
            zoom = scene.zoom,
            center_lat = scene.bounds.center_lat,
            center_lon = scene.bounds.center_lon,
            "预览场景已生成"
        );
        Ok(scene)
    }

    pub fn point_count(&self) -> usize {
        self.features.iter().map(Vec::len).sum()
    }
}
