//! DXF 实体读取。
//!
//! 只关心 ENTITIES 段：记录每个模型空间实体的类型、图层与句柄，
//! 并为 `LWPOLYLINE` 收集顶点（组码 10/20）。其余段整体跳过。
//!
//! 支持两种编码：
//! - ASCII DXF：组码行 + 值行交替出现；
//! - 二进制 DXF（R13 及以后）：哨兵 `AutoCAD Binary DXF\r\n\x1a\0` 之后，
//!   每个组码占 2 字节（小端），值的类型由组码范围决定。

use std::borrow::Cow;

use encoding_rs::Encoding;
use tracing::{debug, trace, warn};
use dxfkml_core::{
    document::{Drawing, DrawingEntity, LWPOLYLINE},
    geometry::Point2,
};

use crate::IoError;

const BINARY_SENTINEL: &[u8] = b"AutoCAD Binary DXF\r\n\x1a\x00";

/// 解析 DXF 字节流为图纸。
pub fn parse_drawing(data: &[u8]) -> Result<Drawing, IoError> {
    let result = if data.starts_with(BINARY_SENTINEL) {
        debug!("检测到二进制 DXF");
        let body = &data[BINARY_SENTINEL.len()..];
        // R12 二进制 DXF 的组码只占 1 字节，紧跟 "SECTION"
        if body.starts_with(b"\x00SECTION") {
            Err(DxfError::Unsupported {
                feature: "R12 二进制 DXF（单字节组码）".to_string(),
            })
        } else {
            DxfParser {
                reader: DxfReader::binary(body),
            }
            .parse()
        }
    } else {
        let text = decode_text(data);
        let reader = DxfReader::text(&text);
        DxfParser { reader }.parse()
    };
    result.map_err(|err| match err {
        DxfError::Unsupported { feature } => IoError::UnsupportedFeature(feature),
        DxfError::Invalid { message } => IoError::InvalidDocument(message),
    })
}

#[derive(Debug)]
enum DxfError {
    Unsupported { feature: String },
    Invalid { message: String },
}

impl DxfError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    fn parse(mut self) -> Result<Drawing, DxfError> {
        let mut drawing = Drawing::new();
        let mut saw_eof = false;
        while let Some((code, value)) = self.reader.next_pair()? {
            // 999 为注释，允许出现在段之间
            if code == 999 {
                continue;
            }
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.trim() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.trim() {
                        "ENTITIES" => self.parse_entities(&mut drawing)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => {
                    saw_eof = true;
                    break;
                }
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        if !saw_eof {
            warn!("DXF 缺少 EOF 标记，按已读取内容处理");
        }
        debug!(entities = drawing.len(), "DXF 解析完成");
        Ok(drawing)
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            let kind = value.trim();
            match kind {
                "ENDSEC" => break,
                "EOF" => return Err(DxfError::invalid("ENTITIES 段缺少 ENDSEC")),
                // 脱离 POLYLINE/INSERT 出现的从属记录不构成独立实体
                "VERTEX" | "ATTRIB" | "SEQEND" => self.skip_entity_body()?,
                _ => {
                    let kind = kind.to_string();
                    let record = self.parse_entity(&kind)?;
                    match kind.as_str() {
                        "POLYLINE" => self.skip_owned_sequence(&kind, "VERTEX")?,
                        "INSERT" => self.skip_owned_sequence(&kind, "ATTRIB")?,
                        _ => {}
                    }
                    if record.paper_space {
                        trace!(kind = %kind, "跳过图纸空间实体");
                        continue;
                    }
                    drawing.push_entity(record.entity);
                }
            }
        }
        Ok(())
    }

    fn parse_entity(&mut self, kind: &str) -> Result<EntityRecord, DxfError> {
        let collect_vertices = kind == LWPOLYLINE;
        let mut entity = DrawingEntity::new(kind);
        let mut paper_space = false;
        let mut pending_x: Option<f64> = None;
        let mut pending_y: Option<f64> = None;

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    5 => {
                        let handle = value.trim();
                        if !handle.is_empty() {
                            entity.handle = handle.to_string();
                        }
                    }
                    8 => {
                        let layer = value.trim();
                        if !layer.is_empty() {
                            entity.layer = layer.to_string();
                        }
                    }
                    67 => paper_space = parse_i32(&value, "实体空间标志（组码 67）")? == 1,
                    10 if collect_vertices => {
                        let x = parse_f64(&value, "LWPOLYLINE 顶点 X")?;
                        if let Some(y) = pending_y.take() {
                            entity.vertices.push(Point2::new(x, y));
                        } else if pending_x.replace(x).is_some() {
                            return Err(DxfError::invalid(
                                "LWPOLYLINE 顶点缺少对应的 Y（组码 20）",
                            ));
                        }
                    }
                    20 if collect_vertices => {
                        let y = parse_f64(&value, "LWPOLYLINE 顶点 Y")?;
                        if let Some(x) = pending_x.take() {
                            entity.vertices.push(Point2::new(x, y));
                        } else if pending_y.replace(y).is_some() {
                            return Err(DxfError::invalid(
                                "LWPOLYLINE 顶点缺少对应的 X（组码 10）",
                            ));
                        }
                    }
                    // Z、bulge、线宽均不参与转换
                    _ => {}
                },
                None => return Err(DxfError::invalid(format!("{kind} 未正确结束"))),
            }
        }

        if pending_x.is_some() || pending_y.is_some() {
            return Err(DxfError::invalid(
                "LWPOLYLINE 顶点坐标成对出现（组码 10/20），检测到不完整的顶点",
            ));
        }

        trace!(
            kind,
            layer = %entity.layer,
            handle = %entity.handle,
            vertices = entity.vertices.len(),
            "读取实体"
        );
        Ok(EntityRecord {
            entity,
            paper_space,
        })
    }

    fn skip_entity_body(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(_) => continue,
                None => return Err(DxfError::invalid("实体未正确结束")),
            }
        }
        Ok(())
    }

    /// 旧式 POLYLINE 之后的 VERTEX … SEQEND、带属性 INSERT 之后的 ATTRIB … SEQEND
    /// 都归属于前面的实体。
    fn skip_owned_sequence(&mut self, owner: &str, member: &str) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    kind if kind == member => self.skip_entity_body()?,
                    _ => {
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some(_) => {
                    return Err(DxfError::invalid(format!(
                        "{owner} 遇到无效的记录，期望 {member}/SEQEND"
                    )));
                }
                None => return Err(DxfError::invalid(format!("{owner} 缺少 SEQEND"))),
            }
        }
        Ok(())
    }
}

struct EntityRecord {
    entity: DrawingEntity,
    paper_space: bool,
}

enum PairSource<'a> {
    Text(std::str::Lines<'a>),
    Binary(BinaryPairs<'a>),
}

struct DxfReader<'a> {
    source: PairSource<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn text(source: &'a str) -> Self {
        Self {
            source: PairSource::Text(source.lines()),
            buffer: None,
            line_number: 0,
        }
    }

    fn binary(data: &'a [u8]) -> Self {
        Self {
            source: PairSource::Binary(BinaryPairs { data, offset: 0 }),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        let lines = match &mut self.source {
            PairSource::Text(lines) => lines,
            PairSource::Binary(pairs) => return pairs.next_pair(),
        };

        let code_line = match lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => return Ok(None),
        };
        // 文件末尾的空行不视为错误
        if code_line.trim().is_empty() {
            let rest_blank = lines.clone().all(|line| line.trim().is_empty());
            if rest_blank {
                return Ok(None);
            }
        }

        let value_line = match lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.buffer.is_none(), "DXF pair 只能回退一次");
        self.buffer = Some(pair);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryValue {
    Text,
    Double,
    Int16,
    Int32,
    Int64,
    Bool,
    Chunk,
}

fn binary_value_kind(code: i32) -> Option<BinaryValue> {
    let kind = match code {
        0..=9 | 100..=109 | 300..=309 | 320..=369 | 390..=399 | 410..=419 | 430..=439
        | 470..=481 | 999 | 1000..=1003 | 1005..=1009 => BinaryValue::Text,
        10..=59 | 110..=149 | 210..=239 | 460..=469 | 1010..=1059 => BinaryValue::Double,
        60..=79 | 170..=179 | 270..=289 | 370..=389 | 400..=409 | 1060..=1070 => {
            BinaryValue::Int16
        }
        90..=99 | 420..=429 | 440..=459 | 1071 => BinaryValue::Int32,
        160..=169 => BinaryValue::Int64,
        290..=299 => BinaryValue::Bool,
        310..=319 | 1004 => BinaryValue::Chunk,
        _ => return None,
    };
    Some(kind)
}

struct BinaryPairs<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BinaryPairs<'a> {
    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if self.offset >= self.data.len() {
            return Ok(None);
        }
        let code = i32::from(u16::from_le_bytes(self.take_array::<2>("组码")?));
        let kind = binary_value_kind(code).ok_or_else(|| {
            DxfError::invalid(format!(
                "二进制 DXF 偏移 {} 处出现未知组码 {code}",
                self.offset - 2
            ))
        })?;
        let value = match kind {
            BinaryValue::Text => self.take_string()?,
            BinaryValue::Double => f64::from_le_bytes(self.take_array::<8>("浮点值")?).to_string(),
            BinaryValue::Int16 => i16::from_le_bytes(self.take_array::<2>("16 位整数")?).to_string(),
            BinaryValue::Int32 => i32::from_le_bytes(self.take_array::<4>("32 位整数")?).to_string(),
            BinaryValue::Int64 => i64::from_le_bytes(self.take_array::<8>("64 位整数")?).to_string(),
            BinaryValue::Bool => self.take_array::<1>("布尔值")?[0].to_string(),
            BinaryValue::Chunk => {
                let [len] = self.take_array::<1>("二进制块长度")?;
                let bytes = self.take_slice(usize::from(len), "二进制块")?;
                bytes.iter().map(|b| format!("{b:02X}")).collect()
            }
        };
        Ok(Some((code, value)))
    }

    fn take_slice(&mut self, len: usize, context: &str) -> Result<&'a [u8], DxfError> {
        let end = self.offset + len;
        if end > self.data.len() {
            return Err(DxfError::invalid(format!(
                "二进制 DXF 在读取{context}时提前结束（偏移 {}）",
                self.offset
            )));
        }
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, context: &str) -> Result<[u8; N], DxfError> {
        let slice = self.take_slice(N, context)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn take_string(&mut self) -> Result<String, DxfError> {
        let rest = &self.data[self.offset..];
        let len = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| DxfError::invalid("二进制 DXF 字符串缺少结束符"))?;
        let bytes = &rest[..len];
        self.offset += len + 1;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// 将 ASCII DXF 解码为文本：优先 UTF-8，其次按 `$DWGCODEPAGE` 声明，默认 Windows-1252。
fn decode_text(data: &[u8]) -> Cow<'_, str> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    if let Ok(text) = std::str::from_utf8(data) {
        return Cow::Borrowed(text);
    }
    let (latin, _, _) = encoding_rs::WINDOWS_1252.decode(data);
    let encoding = declared_code_page(&latin)
        .and_then(|page| encoding_from_code_page(&page))
        .unwrap_or(encoding_rs::WINDOWS_1252);
    debug!(encoding = encoding.name(), "DXF 不是有效的 UTF-8，按代码页解码");
    let (text, _, had_errors) = encoding.decode(data);
    if had_errors {
        warn!(encoding = encoding.name(), "DXF 解码时出现无法映射的字节");
    }
    Cow::Owned(text.into_owned())
}

fn declared_code_page(text: &str) -> Option<String> {
    let mut lines = text.lines().map(str::trim);
    while let Some(line) = lines.next() {
        if line == "$DWGCODEPAGE" {
            let code = lines.next()?;
            let value = lines.next()?;
            if code == "3" {
                return Some(value.to_string());
            }
            return None;
        }
        if line == "ENTITIES" {
            break;
        }
    }
    None
}

fn encoding_from_code_page(code_page: &str) -> Option<&'static Encoding> {
    let encoding = match code_page.to_ascii_lowercase().as_str() {
        "gb2312" | "ansi_936" => encoding_rs::GBK,
        "big5" | "ansi_950" => encoding_rs::BIG5,
        "korean" | "ansi_949" | "johab" => encoding_rs::EUC_KR,
        "ansi_932" => encoding_rs::SHIFT_JIS,
        "ansi_874" => encoding_rs::WINDOWS_874,
        "ansi_1250" | "dos852" => encoding_rs::WINDOWS_1250,
        "ansi_1251" | "dos855" | "dos866" => encoding_rs::WINDOWS_1251,
        "ansi_1253" | "dos869" => encoding_rs::WINDOWS_1253,
        "ansi_1254" | "dos857" | "iso8859-9" => encoding_rs::WINDOWS_1254,
        "ansi_1255" => encoding_rs::WINDOWS_1255,
        "ansi_1256" => encoding_rs::WINDOWS_1256,
        "ansi_1257" => encoding_rs::WINDOWS_1257,
        "ansi_1258" => encoding_rs::WINDOWS_1258,
        "iso8859-2" => encoding_rs::ISO_8859_2,
        "iso8859-5" => encoding_rs::ISO_8859_5,
        "iso8859-7" => encoding_rs::ISO_8859_7,
        "iso8859-15" => encoding_rs::ISO_8859_15,
        "koi8-r" => encoding_rs::KOI8_R,
        "utf-8" | "utf8" => encoding_rs::UTF_8,
        _ => return None,
    };
    Some(encoding)
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i32(raw: &str, context: &str) -> Result<i32, DxfError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascii(pairs: &[(i32, &str)]) -> String {
        let mut out = String::new();
        for (code, value) in pairs {
            out.push_str(&format!("{code}\r\n{value}\r\n"));
        }
        out
    }

    fn binary(pairs: &[(i32, BinaryTestValue)]) -> Vec<u8> {
        let mut out = BINARY_SENTINEL.to_vec();
        for (code, value) in pairs {
            out.extend_from_slice(&(*code as u16).to_le_bytes());
            match value {
                BinaryTestValue::Text(s) => {
                    out.extend_from_slice(s.as_bytes());
                    out.push(0);
                }
                BinaryTestValue::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
                BinaryTestValue::Int16(v) => out.extend_from_slice(&v.to_le_bytes()),
            }
        }
        out
    }

    enum BinaryTestValue {
        Text(&'static str),
        Double(f64),
        Int16(i16),
    }

    #[test]
    fn ascii_lwpolyline_with_crlf_is_read() {
        let text = ascii(&[
            (0, "SECTION"),
            (2, "ENTITIES"),
            (0, "LWPOLYLINE"),
            (5, "2F"),
            (8, "ROADS"),
            (90, "2"),
            (10, "1.5"),
            (20, "2.5"),
            (42, "0.5"),
            (10, "3.5"),
            (20, "4.5"),
            (0, "ENDSEC"),
            (0, "EOF"),
        ]);
        let drawing = parse_drawing(text.as_bytes()).expect("parse ascii dxf");
        let entities: Vec<_> = drawing.entities().collect();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].handle, "2F");
        assert_eq!(entities[0].layer, "ROADS");
        assert_eq!(
            entities[0].vertices,
            vec![Point2::new(1.5, 2.5), Point2::new(3.5, 4.5)]
        );
    }

    #[test]
    fn paper_space_and_vertex_sequences_are_not_modelspace_entities() {
        let text = ascii(&[
            (0, "SECTION"),
            (2, "ENTITIES"),
            (0, "POLYLINE"),
            (8, "OLD"),
            (66, "1"),
            (0, "VERTEX"),
            (10, "0.0"),
            (20, "0.0"),
            (0, "VERTEX"),
            (10, "1.0"),
            (20, "1.0"),
            (0, "SEQEND"),
            (0, "LINE"),
            (8, "TITLE"),
            (67, "1"),
            (0, "CIRCLE"),
            (8, "GEOM"),
            (0, "ENDSEC"),
            (0, "EOF"),
        ]);
        let drawing = parse_drawing(text.as_bytes()).expect("parse dxf");
        let kinds: Vec<_> = drawing.entities().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["POLYLINE", "CIRCLE"]);
    }

    #[test]
    fn insert_attributes_belong_to_their_block_reference() {
        let text = ascii(&[
            (0, "SECTION"),
            (2, "ENTITIES"),
            (0, "INSERT"),
            (5, "1A"),
            (8, "A"),
            (66, "1"),
            (2, "TITLEBLOCK"),
            (0, "ATTRIB"),
            (8, "ATTLAYER"),
            (1, "Sheet 1"),
            (0, "ATTRIB"),
            (8, "ATTLAYER"),
            (1, "Rev B"),
            (0, "SEQEND"),
            (8, "A"),
            (0, "ENDSEC"),
            (0, "EOF"),
        ]);
        let drawing = parse_drawing(text.as_bytes()).expect("parse dxf with attributes");
        let entities: Vec<_> = drawing
            .entities()
            .map(|e| (e.kind.as_str(), e.layer.as_str()))
            .collect();
        assert_eq!(entities, vec![("INSERT", "A")]);
    }

    #[test]
    fn insert_without_attributes_keeps_following_entities() {
        let text = ascii(&[
            (0, "SECTION"),
            (2, "ENTITIES"),
            (0, "INSERT"),
            (8, "A"),
            (0, "LINE"),
            (8, "B"),
            (0, "ENDSEC"),
            (0, "EOF"),
        ]);
        let drawing = parse_drawing(text.as_bytes()).expect("parse dxf");
        let kinds: Vec<_> = drawing.entities().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["INSERT", "LINE"]);
    }

    #[test]
    fn incomplete_vertex_is_rejected() {
        let text = ascii(&[
            (0, "SECTION"),
            (2, "ENTITIES"),
            (0, "LWPOLYLINE"),
            (10, "1.0"),
            (0, "ENDSEC"),
            (0, "EOF"),
        ]);
        let err = parse_drawing(text.as_bytes()).unwrap_err();
        assert!(matches!(err, IoError::InvalidDocument(_)));
    }

    #[test]
    fn garbage_group_code_is_invalid_document() {
        let err = parse_drawing(b"not a dxf\nat all\n").unwrap_err();
        assert!(matches!(err, IoError::InvalidDocument(_)));
    }

    #[test]
    fn binary_dxf_is_read() {
        let data = binary(&[
            (0, BinaryTestValue::Text("SECTION")),
            (2, BinaryTestValue::Text("HEADER")),
            (9, BinaryTestValue::Text("$INSUNITS")),
            (70, BinaryTestValue::Int16(6)),
            (0, BinaryTestValue::Text("ENDSEC")),
            (0, BinaryTestValue::Text("SECTION")),
            (2, BinaryTestValue::Text("ENTITIES")),
            (0, BinaryTestValue::Text("LWPOLYLINE")),
            (5, BinaryTestValue::Text("A1")),
            (8, BinaryTestValue::Text("PARCELS")),
            (10, BinaryTestValue::Double(500_000.0)),
            (20, BinaryTestValue::Double(4_000_000.25)),
            (10, BinaryTestValue::Double(500_100.0)),
            (20, BinaryTestValue::Double(4_000_000.25)),
            (0, BinaryTestValue::Text("ENDSEC")),
            (0, BinaryTestValue::Text("EOF")),
        ]);
        let drawing = parse_drawing(&data).expect("parse binary dxf");
        let entity = drawing.entities().next().expect("one entity");
        assert_eq!(entity.layer, "PARCELS");
        assert_eq!(entity.handle, "A1");
        assert_eq!(
            entity.vertices,
            vec![
                Point2::new(500_000.0, 4_000_000.25),
                Point2::new(500_100.0, 4_000_000.25)
            ]
        );
    }

    #[test]
    fn truncated_binary_dxf_is_invalid() {
        let mut data = binary(&[(0, BinaryTestValue::Text("SECTION"))]);
        data.extend_from_slice(&10u16.to_le_bytes());
        data.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(
            parse_drawing(&data),
            Err(IoError::InvalidDocument(_))
        ));
    }

    #[test]
    fn r12_binary_dxf_is_unsupported() {
        let mut data = BINARY_SENTINEL.to_vec();
        data.push(0);
        data.extend_from_slice(b"SECTION\x00");
        assert!(matches!(
            parse_drawing(&data),
            Err(IoError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn declared_code_page_drives_decoding() {
        let mut data = ascii(&[
            (0, "SECTION"),
            (2, "HEADER"),
            (9, "$DWGCODEPAGE"),
            (3, "ANSI_1251"),
            (0, "ENDSEC"),
            (0, "SECTION"),
            (2, "ENTITIES"),
            (0, "LINE"),
        ])
        .into_bytes();
        // "Дороги" in Windows-1251
        data.extend_from_slice(b"8\r\n\xC4\xEE\xF0\xEE\xE3\xE8\r\n");
        data.extend_from_slice(ascii(&[(0, "ENDSEC"), (0, "EOF")]).as_bytes());
        let drawing = parse_drawing(&data).expect("parse cp1251 dxf");
        assert_eq!(drawing.entities().next().unwrap().layer, "Дороги");
    }

    #[test]
    fn missing_entities_section_yields_empty_drawing() {
        let text = ascii(&[(0, "SECTION"), (2, "HEADER"), (0, "ENDSEC"), (0, "EOF")]);
        let drawing = parse_drawing(text.as_bytes()).expect("parse header-only dxf");
        assert!(drawing.is_empty());
    }
}
