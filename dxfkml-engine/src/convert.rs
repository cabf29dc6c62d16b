//! DXF → KML 转换编排：打开图纸、统计、重投影、序列化，最后原子写出。

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};
use dxfkml_core::document::{
    ConversionStatistics, DrawingEntity, ReprojectedFeature, StatisticsCollector,
};
use dxfkml_io::{DrawingLoader, DxfFacade, KmlError, KmlWriter, LineStyle};

use crate::errors::EngineError;
use crate::reproject::Reprojector;

/// 接收转换进度（0.0 ~ 1.0）。
pub trait ProgressSink {
    fn on_progress(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn on_progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    Opened,
    Traversing,
    Reprojecting,
    Finalized,
    Failed,
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Opened => "opened",
            Self::Traversing => "traversing",
            Self::Reprojecting => "reprojecting",
            Self::Finalized => "finalized",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub epsg: i32,
    pub style: LineStyle,
    /// 输出文档的 `<name>`；缺省时取源文件名（去掉扩展名）。
    pub document_name: Option<String>,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, epsg: i32) -> Self {
        Self {
            input: input.into(),
            epsg,
            style: LineStyle::default(),
            document_name: None,
        }
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }
}

/// 内存中的转换结果。
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub kml: String,
    pub statistics: ConversionStatistics,
    pub features: usize,
    pub skipped: usize,
}

/// 写出文件后的汇总，可直接序列化为 JSON 报告。
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub statistics: ConversionStatistics,
    pub features: usize,
    pub skipped: usize,
    pub output: PathBuf,
}

/// 转换状态机：Opened → Traversing → Reprojecting → Finalized，任一阶段出错转入 Failed。
struct StageTracker<'a> {
    input: &'a Path,
    stage: Option<ConversionStage>,
}

impl<'a> StageTracker<'a> {
    fn new(input: &'a Path) -> Self {
        Self { input, stage: None }
    }

    fn advance(&mut self, next: ConversionStage) {
        debug!(
            input = %self.input.display(),
            from = ?self.stage,
            to = %next,
            "转换阶段切换"
        );
        self.stage = Some(next);
    }

    fn fail(&mut self, err: &EngineError) {
        error!(
            input = %self.input.display(),
            stage = ?self.stage,
            error = %err,
            "转换失败"
        );
        self.stage = Some(ConversionStage::Failed);
    }
}

#[derive(Debug, Default, Clone)]
pub struct Converter<L: DrawingLoader = DxfFacade> {
    loader: L,
}

impl Converter {
    pub fn new() -> Self {
        Self {
            loader: DxfFacade::new(),
        }
    }
}

impl<L: DrawingLoader> Converter<L> {
    pub fn with_loader(loader: L) -> Self {
        Self { loader }
    }

    /// 在内存中完成转换。EPSG 无效时在读取图纸之前失败。
    pub fn convert_to_string(
        &self,
        request: &ConversionRequest,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<ConversionOutput, EngineError> {
        self.tracked(&request.input, |tracker| {
            self.run(request, progress, tracker)
        })
    }

    /// 转换并写出到 `output`。写入先落到同目录的临时文件再重命名，
    /// 任何失败都不会留下半成品，也不会改动已有的目标文件。
    pub fn convert_file(
        &self,
        request: &ConversionRequest,
        output: &Path,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<ConversionReport, EngineError> {
        self.tracked(&request.input, |tracker| {
            let converted = self.run(request, progress, tracker)?;
            write_atomically(output, converted.kml.as_bytes())?;
            info!(
                output = %output.display(),
                features = converted.features,
                skipped = converted.skipped,
                "KML 已写出"
            );
            Ok(ConversionReport {
                statistics: converted.statistics,
                features: converted.features,
                skipped: converted.skipped,
                output: output.to_path_buf(),
            })
        })
    }

    fn tracked<T>(
        &self,
        input: &Path,
        body: impl FnOnce(&mut StageTracker<'_>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut tracker = StageTracker::new(input);
        let result = body(&mut tracker);
        match &result {
            Ok(_) => tracker.advance(ConversionStage::Finalized),
            Err(err) => tracker.fail(err),
        }
        result
    }

    fn run(
        &self,
        request: &ConversionRequest,
        mut progress: Option<&mut dyn ProgressSink>,
        tracker: &mut StageTracker<'_>,
    ) -> Result<ConversionOutput, EngineError> {
        let reprojector = Reprojector::from_epsg(request.epsg)?;
        let drawing = self
            .loader
            .load(&request.input)
            .map_err(EngineError::Input)?;
        tracker.advance(ConversionStage::Opened);

        tracker.advance(ConversionStage::Traversing);
        let mut collector = StatisticsCollector::new();
        let mut convertible: Vec<&DrawingEntity> = Vec::new();
        for entity in drawing.entities() {
            collector.record(entity);
            if entity.is_polyline() {
                convertible.push(entity);
            }
        }
        let statistics = collector.finish();
        info!(
            total_entities = statistics.total_entities,
            total_layers = statistics.total_layers,
            polylines = statistics.polylines,
            "图纸统计完成"
        );

        tracker.advance(ConversionStage::Reprojecting);
        let mut writer = KmlWriter::new().with_style(request.style.clone());
        let document_name = request
            .document_name
            .clone()
            .or_else(|| drawing.source_name().map(document_name_from_source));
        if let Some(name) = document_name {
            writer = writer.with_document_name(name);
        }

        let total = convertible.len();
        let mut skipped = 0usize;
        for (done, entity) in convertible.into_iter().enumerate() {
            if entity.is_degenerate() {
                warn!(
                    handle = %entity.handle,
                    layer = %entity.layer,
                    vertices = entity.vertices.len(),
                    "多段线顶点不足两个，已跳过"
                );
                skipped += 1;
            } else {
                let coordinates = reprojector.transform_all(&entity.vertices)?;
                writer.push(ReprojectedFeature::from_entity(entity, coordinates));
            }
            if let Some(sink) = progress.as_mut() {
                sink.on_progress(progress_fraction(done + 1, total));
            }
        }

        let features = writer.len();
        let kml = writer.finish().map_err(|err| match err {
            KmlError::Empty => EngineError::EmptyResult,
            other => EngineError::Serialize(other),
        })?;
        Ok(ConversionOutput {
            kml,
            statistics,
            features,
            skipped,
        })
    }
}

fn progress_fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        done as f64 / total as f64
    }
}

fn document_name_from_source(source: &str) -> String {
    Path::new(source)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}

/// 默认输出路径：`.dxf`（不区分大小写）替换为 `.kml`，否则直接追加 `.kml`。
pub fn default_output_path(input: &Path) -> PathBuf {
    let is_dxf = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dxf"));
    if is_dxf {
        input.with_extension("kml")
    } else {
        let mut raw = input.as_os_str().to_os_string();
        raw.push(".kml");
        PathBuf::from(raw)
    }
}

/// 临时文件 + 重命名，目标文件要么完整更新，要么保持原样。
pub fn write_atomically(target: &Path, contents: &[u8]) -> Result<(), EngineError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let output_err = |source: std::io::Error| EngineError::Output {
        path: target.to_path_buf(),
        source,
    };

    let mut pending = tempfile::Builder::new()
        .prefix(".dxfkml-")
        .suffix(".part")
        .tempfile_in(&dir)
        .map_err(output_err)?;
    pending.write_all(contents).map_err(output_err)?;
    pending.as_file().sync_all().map_err(output_err)?;
    pending
        .persist(target)
        .map_err(|err| output_err(err.error))?;
    debug!(target = %target.display(), bytes = contents.len(), "原子写入完成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_replaces_dxf_extension_case_insensitively() {
        assert_eq!(
            default_output_path(Path::new("plans/site.dxf")),
            PathBuf::from("plans/site.kml")
        );
        assert_eq!(
            default_output_path(Path::new("SITE.DXF")),
            PathBuf::from("SITE.kml")
        );
        assert_eq!(
            default_output_path(Path::new("drawing.txt")),
            PathBuf::from("drawing.txt.kml")
        );
        assert_eq!(
            default_output_path(Path::new("drawing")),
            PathBuf::from("drawing.kml")
        );
    }

    #[test]
    fn progress_is_zero_without_work() {
        assert_eq!(progress_fraction(0, 0), 0.0);
        assert_eq!(progress_fraction(1, 4), 0.25);
        assert_eq!(progress_fraction(4, 4), 1.0);
    }

    #[test]
    fn document_name_drops_extension() {
        assert_eq!(document_name_from_source("site_plan.dxf"), "site_plan");
        assert_eq!(document_name_from_source("plain"), "plain");
    }

    #[test]
    fn stage_labels() {
        assert_eq!(ConversionStage::Reprojecting.to_string(), "reprojecting");
        assert_eq!(ConversionStage::Failed.to_string(), "failed");
    }
}
