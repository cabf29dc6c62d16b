//! EPSG 选项表：`;` 分隔，至少包含 `Region` 与 `EPSG` 两列，按 ISO-8859-1 编码。

use std::fs;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use tracing::{debug, warn};

use crate::ConfigError;

const BUILTIN_TABLE: &[u8] = include_bytes!("../data/codes.csv");
const REGION_COLUMN: &str = "Region";
const CODE_COLUMN: &str = "EPSG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpsgEntry {
    pub region: String,
    pub code: i32,
}

impl EpsgEntry {
    /// 下拉列表中显示的名称，例如 `WGS 84 / UTM zone 33N: 32633`。
    pub fn label(&self) -> String {
        format!("{}: {}", self.region, self.code)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EpsgCatalog {
    entries: Vec<EpsgEntry>,
}

impl EpsgCatalog {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse(BUILTIN_TABLE)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&bytes)?;
        debug!(path = %path.display(), entries = catalog.len(), "EPSG 表已加载");
        Ok(catalog)
    }

    /// 解析原始字节。带 BOM 的 UTF-8 会被识别，其余按 Latin-1 解码。
    pub fn parse(bytes: &[u8]) -> Result<Self, ConfigError> {
        // ISO-8859-1 按 WHATWG 规范解码为 windows-1252。
        let (text, _, _) = WINDOWS_1252.decode(bytes);
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| ConfigError::Catalog("table is empty".to_string()))?;
        let columns: Vec<String> = split_row(header);
        let column = |name: &str| {
            columns
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| ConfigError::Catalog(format!("missing column {name:?}")))
        };
        let region_index = column(REGION_COLUMN)?;
        let code_index = column(CODE_COLUMN)?;

        let mut entries = Vec::new();
        for (index, line) in lines {
            let fields = split_row(line);
            let region = fields.get(region_index).cloned().unwrap_or_default();
            let code = fields
                .get(code_index)
                .and_then(|value| value.parse::<i32>().ok())
                .filter(|code| *code > 0);
            match code {
                Some(code) => entries.push(EpsgEntry { region, code }),
                None => warn!(line = index + 1, row = line, "EPSG 表中的行无法解析，已跳过"),
            }
        }
        Ok(Self { entries })
    }

    #[inline]
    pub fn entries(&self) -> &[EpsgEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按完整显示名称查找 EPSG 代码。
    pub fn lookup(&self, label: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|entry| entry.label() == label)
            .map(|entry| entry.code)
    }

    /// 显示名称包含 `needle` 的条目（不区分大小写），保持表内顺序。
    pub fn filter<'a>(&'a self, needle: &str) -> impl Iterator<Item = &'a EpsgEntry> + 'a {
        let needle = needle.to_lowercase();
        self.entries
            .iter()
            .filter(move |entry| entry.label().to_lowercase().contains(&needle))
    }
}

fn split_row(line: &str) -> Vec<String> {
    line.split(';')
        .map(|field| field.trim().trim_matches('"').trim().to_string())
        .collect()
}
