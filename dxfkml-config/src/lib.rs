pub mod epsg;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub use epsg::{EpsgCatalog, EpsgEntry};

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV_VAR: &str = "DXFKML_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。`catalog.epsg_table` 的相对路径按配置文件所在目录解析。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let (Some(table), Some(base)) = (config.catalog.epsg_table.as_mut(), path.parent()) {
            if table.is_relative() {
                *table = base.join(&*table);
            }
        }
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `DXFKML_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// 配置的 EPSG 表；未配置时使用内置表。
    pub fn epsg_catalog(&self) -> Result<EpsgCatalog, ConfigError> {
        match &self.catalog.epsg_table {
            Some(path) => EpsgCatalog::from_file(path),
            None => EpsgCatalog::builtin(),
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 转换默认值。命令行参数优先于这里的设置。
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    #[serde(default)]
    pub default_epsg: Option<i32>,
    #[serde(default = "ConversionConfig::default_line_color")]
    pub line_color: String,
    #[serde(default = "ConversionConfig::default_line_width")]
    pub line_width: f64,
}

impl ConversionConfig {
    fn default_line_color() -> String {
        "ff000000".to_string()
    }

    fn default_line_width() -> f64 {
        2.0
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_epsg: None,
            line_color: Self::default_line_color(),
            line_width: Self::default_line_width(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// 转换成功后是否自动生成预览页面。
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "PreviewConfig::default_satellite")]
    pub satellite_default: bool,
}

impl PreviewConfig {
    fn default_satellite() -> bool {
        true
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            satellite_default: Self::default_satellite(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub epsg_table: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
    #[error("EPSG 表格式错误: {0}")]
    Catalog(String),
}
