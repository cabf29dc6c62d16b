use std::io::{self, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::EngineError;

/// 把来自流（标准输入、上传等）的 DXF 落到临时文件，转换器只接受路径。
/// 值被丢弃时临时文件随之删除。
#[derive(Debug)]
pub struct StagedInput {
    file: NamedTempFile,
}

impl StagedInput {
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, EngineError> {
        let mut file = tempfile::Builder::new()
            .prefix("dxfkml-input-")
            .suffix(".dxf")
            .tempfile()
            .map_err(EngineError::Staging)?;
        let bytes = io::copy(&mut reader, file.as_file_mut()).map_err(EngineError::Staging)?;
        file.as_file_mut().flush().map_err(EngineError::Staging)?;
        debug!(path = %file.path().display(), bytes, "输入已暂存");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// 显式删除临时文件并报告删除错误。
    pub fn close(self) -> Result<(), EngineError> {
        self.file.close().map_err(EngineError::Staging)
    }
}
