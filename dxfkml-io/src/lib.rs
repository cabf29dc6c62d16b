mod dxf;
pub mod kml;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use dxfkml_core::document::Drawing;

pub use dxf::parse_drawing;
pub use kml::{KmlError, KmlWriter, LineStyle, extract_features, parse_features};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

pub trait DrawingLoader {
    fn load(&self, path: &Path) -> Result<Drawing, IoError>;
}

/// DXF 读取入口，自动识别 ASCII 与二进制 DXF。
#[derive(Debug, Default, Clone, Copy)]
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }
}

impl DrawingLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Drawing, IoError> {
        let data = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = data.len(), "读取 DXF 文件");
        let drawing = parse_drawing(&data)?;
        Ok(match path.file_name() {
            Some(name) => drawing.with_source_name(name.to_string_lossy()),
            None => drawing,
        })
    }
}
