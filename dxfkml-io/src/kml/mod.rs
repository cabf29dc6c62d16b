//! KML 2.2 读写。

mod parser;
mod writer;

use std::path::PathBuf;

use thiserror::Error;

pub use parser::{extract_features, parse_coordinates, parse_features};
pub use writer::{KmlWriter, LineStyle};

/// OGC KML 2.2 命名空间。
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
/// KML 下载时使用的 MIME 类型。
pub const KML_MIME_TYPE: &str = "application/vnd.google-earth.kml+xml";

/// 预览端的要素：按顺序排列的 `(lat, lon)` 点。
pub type LatLonFeature = Vec<(f64, f64)>;

#[derive(Debug, Error)]
pub enum KmlError {
    #[error("no convertible features were written")]
    Empty,
    #[error("malformed KML: {0}")]
    Parse(String),
    #[error("failed to serialize KML: {0}")]
    Write(String),
    #[error("invalid line style: {0}")]
    InvalidStyle(String),
    #[error("failed to read KML file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
