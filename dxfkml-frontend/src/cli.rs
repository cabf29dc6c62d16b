//! 命令行前端：转换、预览与 EPSG 列表。输出写入调用方给定的 `Write`，便于测试。

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use dxfkml_config::AppConfig;
use dxfkml_engine::{
    ConversionReport, ConversionRequest, Converter, PreviewScene, StagedInput,
    default_output_path,
};
use dxfkml_io::LineStyle;

use crate::errors::FrontendError;
use crate::map::{MapOptions, write_map};

/// 表示“从标准输入读取”的输入路径。
pub const STDIN_MARKER: &str = "-";

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub input: PathBuf,
    /// EPSG 数字代码，或 EPSG 表中的完整显示名称。
    pub epsg: Option<String>,
    pub output: Option<PathBuf>,
    pub preview: bool,
    pub map: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PreviewOptions {
    pub kml: PathBuf,
    pub map: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct EpsgOptions {
    pub filter: Option<String>,
    pub table: Option<PathBuf>,
}

pub fn run_convert(
    config: &AppConfig,
    options: &ConvertOptions,
    out: &mut dyn Write,
) -> Result<ConversionReport, FrontendError> {
    let epsg = resolve_epsg(config, options.epsg.as_deref())?;
    let style = LineStyle::new(&config.conversion.line_color, config.conversion.line_width)
        .map_err(FrontendError::Style)?;

    let from_stdin = options.input.as_os_str() == STDIN_MARKER;
    let output = match (&options.output, from_stdin) {
        (Some(path), _) => path.clone(),
        (None, false) => default_output_path(&options.input),
        (None, true) => return Err(FrontendError::OutputRequired),
    };

    let staged = if from_stdin {
        Some(StagedInput::from_reader(io::stdin().lock())?)
    } else {
        None
    };
    let input = staged
        .as_ref()
        .map_or(options.input.as_path(), StagedInput::path);
    let mut request = ConversionRequest::new(input, epsg).with_style(style);
    if from_stdin {
        if let Some(stem) = output.file_stem() {
            request = request.with_document_name(stem.to_string_lossy());
        }
    }

    info!(
        input = %options.input.display(),
        output = %output.display(),
        epsg,
        "开始转换"
    );
    let mut last_reported = 0u32;
    let mut progress = |fraction: f64| {
        let percent = (fraction * 100.0).round() as u32;
        if percent >= last_reported + 10 || percent == 100 {
            debug!(percent, "转换进度");
            last_reported = percent;
        }
    };
    let report = Converter::new().convert_file(&request, &output, Some(&mut progress))?;
    if let Some(staged) = staged {
        staged.close()?;
    }

    if options.json {
        let json = serde_json::to_string_pretty(&report)?;
        writeln!(out, "{json}").map_err(FrontendError::Console)?;
    } else {
        print_report(out, &options.input, &report).map_err(FrontendError::Console)?;
    }

    if options.preview || options.map.is_some() || config.preview.enabled {
        let map = preview_to_map(config, &report.output, options.map.as_deref())?;
        if !options.json {
            writeln!(out, "Preview map: {}", map.display()).map_err(FrontendError::Console)?;
        }
    }
    Ok(report)
}

pub fn run_preview(
    config: &AppConfig,
    options: &PreviewOptions,
    out: &mut dyn Write,
) -> Result<PathBuf, FrontendError> {
    let map = preview_to_map(config, &options.kml, options.map.as_deref())?;
    writeln!(out, "Preview map: {}", map.display()).map_err(FrontendError::Console)?;
    Ok(map)
}

pub fn run_epsg(
    config: &AppConfig,
    options: &EpsgOptions,
    out: &mut dyn Write,
) -> Result<usize, FrontendError> {
    let catalog = match &options.table {
        Some(path) => dxfkml_config::EpsgCatalog::from_file(path)?,
        None => config.epsg_catalog()?,
    };
    let mut listed = 0usize;
    for entry in catalog.filter(options.filter.as_deref().unwrap_or("")) {
        writeln!(out, "{}", entry.label()).map_err(FrontendError::Console)?;
        listed += 1;
    }
    Ok(listed)
}

/// 数字直接使用；否则按 EPSG 表的显示名称查找；都没有时使用配置中的默认值。
fn resolve_epsg(config: &AppConfig, given: Option<&str>) -> Result<i32, FrontendError> {
    let Some(raw) = given.map(str::trim) else {
        return config.conversion.default_epsg.ok_or(FrontendError::MissingEpsg);
    };
    if let Ok(code) = raw.parse::<i32>() {
        return Ok(code);
    }
    let catalog = config.epsg_catalog()?;
    catalog
        .lookup(raw)
        .ok_or_else(|| FrontendError::UnknownEpsg(raw.to_string()))
}

fn preview_to_map(
    config: &AppConfig,
    kml: &Path,
    map: Option<&Path>,
) -> Result<PathBuf, FrontendError> {
    let scene = PreviewScene::from_kml_path(kml)?;
    write_map(
        &scene,
        kml,
        map,
        MapOptions {
            satellite_default: config.preview.satellite_default,
        },
    )
}

fn print_report(out: &mut dyn Write, input: &Path, report: &ConversionReport) -> io::Result<()> {
    let stats = &report.statistics;
    writeln!(
        out,
        "Converted {} -> {}",
        input.display(),
        report.output.display()
    )?;
    writeln!(out, "  entities:  {}", stats.total_entities)?;
    writeln!(
        out,
        "  layers:    {} ({})",
        stats.total_layers,
        stats.layer_names.join(", ")
    )?;
    writeln!(
        out,
        "  polylines: {} ({} written, {} skipped)",
        stats.polylines, report.features, report.skipped
    )
}
