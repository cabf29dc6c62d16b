pub mod convert;
pub mod preview;
pub mod reproject;
pub mod staging;

pub mod errors {
    use std::path::PathBuf;

    use dxfkml_io::{IoError, KmlError};
    use thiserror::Error;

    /// 转换与预览流程对外暴露的唯一错误类型，任何一种都应原样呈现给用户。
    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("could not open/parse drawing: {0}")]
        Input(#[source] IoError),
        #[error("unsupported coordinate reference system: {0}")]
        Projection(String),
        #[error("no convertible entities (LWPOLYLINE) found in the drawing")]
        EmptyResult,
        #[error("could not parse KML: {0}")]
        Parse(#[source] KmlError),
        #[error("failed to serialize KML: {0}")]
        Serialize(#[source] KmlError),
        #[error("failed to write output {path:?}: {source}")]
        Output {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("no valid features found in KML file")]
        NothingToPreview,
        #[error("failed to stage input file: {0}")]
        Staging(#[source] std::io::Error),
    }
}

pub use convert::{
    ConversionOutput, ConversionReport, ConversionRequest, ConversionStage, Converter,
    ProgressSink, default_output_path,
};
pub use errors::EngineError;
pub use preview::{PreviewScene, compute_bounds, zoom_for_span};
pub use reproject::Reprojector;
pub use staging::StagedInput;
