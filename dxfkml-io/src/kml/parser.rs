use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, trace};

use super::{KmlError, LatLonFeature};

/// 读取 KML 文件并提取全部 `coordinates` 元素。
pub fn extract_features(path: &Path) -> Result<Vec<LatLonFeature>, KmlError> {
    let text = fs::read_to_string(path).map_err(|source| KmlError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let features = parse_features(&text)?;
    debug!(path = %path.display(), features = features.len(), "KML 要素提取完成");
    Ok(features)
}

/// 在文档任意位置查找 `coordinates` 元素（忽略命名空间前缀），
/// 每个元素对应一个 `(lat, lon)` 序列；没有有效点的元素被丢弃。
///
/// XML 结构错误返回 [`KmlError::Parse`]；文档合法但没有坐标时返回空列表。
pub fn parse_features(text: &str) -> Result<Vec<LatLonFeature>, KmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut features = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut capture: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                depth += 1;
                saw_root = true;
                if element.local_name().as_ref() == b"coordinates" {
                    capture = Some(String::new());
                }
            }
            Ok(Event::End(element)) => {
                depth = depth.saturating_sub(1);
                if element.local_name().as_ref() == b"coordinates" {
                    if let Some(raw) = capture.take() {
                        let points = parse_coordinates(&raw);
                        if points.is_empty() {
                            trace!("跳过没有有效坐标的 coordinates 元素");
                        } else {
                            features.push(points);
                        }
                    }
                }
            }
            Ok(Event::Empty(_)) => saw_root = true,
            Ok(Event::Text(content)) => {
                if let Some(buffer) = capture.as_mut() {
                    let decoded = content.unescape().map_err(|err| parse_error(&reader, err))?;
                    buffer.push_str(&decoded);
                    buffer.push(' ');
                } else if depth == 0 {
                    return Err(KmlError::Parse(format!(
                        "根元素之外出现文本（位置 {}）",
                        reader.buffer_position()
                    )));
                }
            }
            Ok(Event::CData(content)) => {
                if let Some(buffer) = capture.as_mut() {
                    buffer.push_str(&String::from_utf8_lossy(&content.into_inner()));
                    buffer.push(' ');
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(parse_error(&reader, err)),
        }
    }

    if !saw_root {
        return Err(KmlError::Parse("文档缺少根元素".to_string()));
    }
    if depth != 0 {
        return Err(KmlError::Parse(format!("文档在 {depth} 个元素未闭合时结束")));
    }
    Ok(features)
}

/// 解析 `lon,lat[,alt]` 元组序列。元组之间以空白分隔，高度被丢弃；
/// 无法读出前两个数值的元组被跳过。返回 `(lat, lon)`。
pub fn parse_coordinates(raw: &str) -> LatLonFeature {
    raw.split_whitespace()
        .filter_map(|tuple| {
            let mut parts = tuple.split(',');
            let lon = parts.next().and_then(parse_ordinate);
            let lat = parts.next().and_then(parse_ordinate);
            match (lon, lat) {
                (Some(lon), Some(lat)) => Some((lat, lon)),
                _ => {
                    debug!(tuple, "忽略无法解析的坐标元组");
                    None
                }
            }
        })
        .collect()
}

/// `nan`、`inf` 等可被 `f64` 接受的写法不算有效坐标。
fn parse_ordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> KmlError {
    KmlError::Parse(format!("位置 {}: {err}", reader.error_position()))
}
