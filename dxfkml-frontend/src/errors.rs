use std::io;

use dxfkml_config::ConfigError;
use dxfkml_engine::EngineError;
use dxfkml_io::KmlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid line style in configuration: {0}")]
    Style(#[source] KmlError),
    #[error("no EPSG code given; pass --epsg or set conversion.default_epsg")]
    MissingEpsg,
    #[error("{0:?} is neither an EPSG code nor a catalog entry")]
    UnknownEpsg(String),
    #[error("reading from standard input requires --output")]
    OutputRequired,
    #[error("failed to render report: {0}")]
    Report(#[from] serde_json::Error),
    #[error("failed to write to the console: {0}")]
    Console(#[source] io::Error),
}
