pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 图纸平面坐标，内部以 `glam::DVec2` 表示；x 为东向，y 为北向。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// WGS84 地理坐标（度）。KML 中按 `lon,lat` 顺序书写。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct GeoPoint {
        pub lon: f64,
        pub lat: f64,
    }

    impl GeoPoint {
        #[inline]
        pub fn new(lon: f64, lat: f64) -> Self {
            Self { lon, lat }
        }

        /// 预览端统一使用 `(lat, lon)` 顺序。
        #[inline]
        pub fn as_lat_lon(self) -> (f64, f64) {
            (self.lat, self.lon)
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.lon.is_finite() && self.lat.is_finite()
        }
    }

    /// 预览用的地理范围。中心点取所有坐标的算术平均，而非包围盒中心。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct GeoBounds {
        pub min_lat: f64,
        pub max_lat: f64,
        pub min_lon: f64,
        pub max_lon: f64,
        pub center_lat: f64,
        pub center_lon: f64,
    }

    impl GeoBounds {
        /// 从 `(lat, lon)` 序列计算范围；序列为空时返回 `None`。
        pub fn from_lat_lon<I>(points: I) -> Option<Self>
        where
            I: IntoIterator<Item = (f64, f64)>,
        {
            let mut count = 0usize;
            let mut sum_lat = 0.0;
            let mut sum_lon = 0.0;
            let mut min = DVec2::splat(f64::INFINITY);
            let mut max = DVec2::splat(f64::NEG_INFINITY);
            for (lat, lon) in points {
                let point = DVec2::new(lat, lon);
                min = min.min(point);
                max = max.max(point);
                sum_lat += lat;
                sum_lon += lon;
                count += 1;
            }
            if count == 0 {
                return None;
            }
            let n = count as f64;
            Some(Self {
                min_lat: min.x,
                max_lat: max.x,
                min_lon: min.y,
                max_lon: max.y,
                center_lat: sum_lat / n,
                center_lon: sum_lon / n,
            })
        }

        #[inline]
        pub fn lat_span(&self) -> f64 {
            self.max_lat - self.min_lat
        }

        #[inline]
        pub fn lon_span(&self) -> f64 {
            self.max_lon - self.min_lon
        }

        /// 两个方向跨度中的较大者（度）。
        #[inline]
        pub fn max_span(&self) -> f64 {
            self.lat_span().max(self.lon_span())
        }

        /// 西南角、东北角，供地图 fit bounds 使用。
        #[inline]
        pub fn corners(&self) -> [(f64, f64); 2] {
            [
                (self.min_lat, self.min_lon),
                (self.max_lat, self.max_lon),
            ]
        }
    }
}

pub mod document {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{GeoPoint, Point2};

    /// 唯一触发转换的实体类型。
    pub const LWPOLYLINE: &str = "LWPOLYLINE";
    /// 图层或句柄缺失时写入的占位值。
    pub const UNKNOWN_FIELD: &str = "Unknown";
    /// 输出要素的 SubClasses 元数据固定为该值。
    pub const POLYLINE_SUBCLASSES: &str = "AcDbEntity:AcDbPolyline";

    /// 模型空间中的一个实体。仅 `LWPOLYLINE` 携带顶点。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct DrawingEntity {
        pub kind: String,
        pub layer: String,
        pub handle: String,
        pub vertices: Vec<Point2>,
    }

    impl DrawingEntity {
        pub fn new(kind: impl Into<String>) -> Self {
            Self {
                kind: kind.into(),
                layer: UNKNOWN_FIELD.to_string(),
                handle: UNKNOWN_FIELD.to_string(),
                vertices: Vec::new(),
            }
        }

        pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
            self.layer = layer.into();
            self
        }

        pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
            self.handle = handle.into();
            self
        }

        pub fn with_vertices<I>(mut self, vertices: I) -> Self
        where
            I: IntoIterator<Item = Point2>,
        {
            self.vertices = vertices.into_iter().collect();
            self
        }

        #[inline]
        pub fn is_polyline(&self) -> bool {
            self.kind == LWPOLYLINE
        }

        /// 少于两个顶点的多段线无法构成线段。
        #[inline]
        pub fn is_degenerate(&self) -> bool {
            self.vertices.len() < 2
        }
    }

    /// 打开后的只读图纸，实体按文档顺序保存。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Drawing {
        source_name: Option<String>,
        entities: Vec<DrawingEntity>,
    }

    impl Drawing {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
            self.source_name = Some(name.into());
            self
        }

        #[inline]
        pub fn source_name(&self) -> Option<&str> {
            self.source_name.as_deref()
        }

        pub fn push_entity(&mut self, entity: DrawingEntity) {
            self.entities.push(entity);
        }

        /// 可重复遍历：每次调用都按相同顺序返回相同实体。
        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &DrawingEntity> + '_ {
            self.entities.iter()
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.entities.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.entities.is_empty()
        }
    }

    /// 一次转换的统计结果，遍历结束后一次性生成。
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ConversionStatistics {
        pub total_entities: usize,
        pub total_layers: usize,
        pub layer_names: Vec<String>,
        pub polylines: usize,
    }

    #[derive(Debug, Default)]
    pub struct StatisticsCollector {
        total_entities: usize,
        layers: BTreeSet<String>,
        polylines: usize,
    }

    impl StatisticsCollector {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn record(&mut self, entity: &DrawingEntity) {
            self.total_entities += 1;
            self.layers.insert(entity.layer.clone());
            if entity.is_polyline() {
                self.polylines += 1;
            }
        }

        pub fn finish(self) -> ConversionStatistics {
            ConversionStatistics {
                total_entities: self.total_entities,
                total_layers: self.layers.len(),
                layer_names: self.layers.into_iter().collect(),
                polylines: self.polylines,
            }
        }
    }

    /// 重投影后的线要素，与源实体一一对应。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ReprojectedFeature {
        pub coordinates: Vec<GeoPoint>,
        pub layer: String,
        pub subclasses: String,
        pub entity_handle: String,
    }

    impl ReprojectedFeature {
        pub fn from_entity(entity: &DrawingEntity, coordinates: Vec<GeoPoint>) -> Self {
            Self {
                coordinates,
                layer: entity.layer.clone(),
                subclasses: POLYLINE_SUBCLASSES.to_string(),
                entity_handle: entity.handle.clone(),
            }
        }
    }

}
