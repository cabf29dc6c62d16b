//! 平面坐标到 WGS84 经纬度的转换。
//!
//! EPSG 代码经 `crs-definitions` 查得 proj4 定义，由 `proj4rs` 执行变换。
//! 输入始终按 (x = 东向, y = 北向) 解释，输出为 (经度, 纬度)，不做轴序交换。

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use tracing::{debug, info};
use dxfkml_core::geometry::{GeoPoint, Point2};

use crate::errors::EngineError;

const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84 +no_defs";

pub struct Reprojector {
    epsg: u16,
    source: Proj,
    target: Proj,
    source_is_geographic: bool,
}

impl std::fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reprojector")
            .field("epsg", &self.epsg)
            .field("source_is_geographic", &self.source_is_geographic)
            .finish()
    }
}

impl Reprojector {
    /// 按 EPSG 代码构建。非正数、超出范围或未知的代码返回 [`EngineError::Projection`]。
    pub fn from_epsg(code: i32) -> Result<Self, EngineError> {
        let epsg = u16::try_from(code)
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| {
                EngineError::Projection(format!("EPSG:{code} is not a valid EPSG code"))
            })?;
        let definition = crs_definitions::from_code(epsg).ok_or_else(|| {
            EngineError::Projection(format!(
                "EPSG:{epsg} is not a known coordinate reference system"
            ))
        })?;
        Self::from_definition(epsg, definition.proj4)
    }

    fn from_definition(epsg: u16, definition: &str) -> Result<Self, EngineError> {
        let source = Proj::from_proj_string(definition)
            .map_err(|err| EngineError::Projection(format!("EPSG:{epsg}: {err}")))?;
        let target = Proj::from_proj_string(WGS84_LONGLAT)
            .map_err(|err| EngineError::Projection(format!("WGS84: {err}")))?;
        let source_is_geographic = definition.split_whitespace().any(|param| {
            matches!(
                param,
                "+proj=longlat" | "+proj=latlong" | "+proj=lonlat" | "+proj=latlon"
            )
        });
        info!(epsg, definition, source_is_geographic, "坐标转换器已构建");
        Ok(Self {
            epsg,
            source,
            target,
            source_is_geographic,
        })
    }

    #[inline]
    pub fn epsg(&self) -> u16 {
        self.epsg
    }

    /// (x, y) → (lon, lat)，单位为度。地理坐标系的输入同样以度表示。
    pub fn transform(&self, point: Point2) -> Result<GeoPoint, EngineError> {
        let (x, y) = if self.source_is_geographic {
            (point.x().to_radians(), point.y().to_radians())
        } else {
            (point.x(), point.y())
        };
        let mut xyz = (x, y, 0.0);
        transform(&self.source, &self.target, &mut xyz).map_err(|err| {
            EngineError::Projection(format!(
                "EPSG:{} cannot transform ({}, {}): {err}",
                self.epsg,
                point.x(),
                point.y()
            ))
        })?;
        let geo = GeoPoint::new(xyz.0.to_degrees(), xyz.1.to_degrees());
        if !geo.is_finite() {
            return Err(EngineError::Projection(format!(
                "EPSG:{} produced a non-finite coordinate for ({}, {})",
                self.epsg,
                point.x(),
                point.y()
            )));
        }
        Ok(geo)
    }

    pub fn transform_all(&self, points: &[Point2]) -> Result<Vec<GeoPoint>, EngineError> {
        let out = points
            .iter()
            .map(|point| self.transform(*point))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(epsg = self.epsg, points = out.len(), "顶点转换完成");
        Ok(out)
    }
}
