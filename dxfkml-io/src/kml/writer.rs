use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;
use dxfkml_core::document::ReprojectedFeature;

use super::{KML_NAMESPACE, KmlError};

const DEFAULT_LINE_COLOR: &str = "ff000000";
const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// 线样式。颜色使用 KML 的 `aabbggrr` 十六进制格式，默认不透明黑色、线宽 2。
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    color: String,
    width: f64,
}

impl LineStyle {
    pub fn new(color: &str, width: f64) -> Result<Self, KmlError> {
        let color = color.trim();
        if color.len() != 8 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(KmlError::InvalidStyle(format!(
                "color must be 8 hex digits in aabbggrr order, got {color:?}"
            )));
        }
        if !width.is_finite() || width <= 0.0 {
            return Err(KmlError::InvalidStyle(format!(
                "width must be a positive number, got {width}"
            )));
        }
        Ok(Self {
            color: color.to_ascii_lowercase(),
            width,
        })
    }

    #[inline]
    pub fn color(&self) -> &str {
        &self.color
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_LINE_COLOR.to_string(),
            width: DEFAULT_LINE_WIDTH,
        }
    }
}

/// 收集要素，并在 `finish` 时一次性序列化为 KML 文档。
#[derive(Debug, Default)]
pub struct KmlWriter {
    document_name: Option<String>,
    style: LineStyle,
    features: Vec<ReprojectedFeature>,
}

impl KmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }

    pub fn push(&mut self, feature: ReprojectedFeature) {
        self.features.push(feature);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// 没有任何要素时返回 [`KmlError::Empty`]，不会生成空文档。
    pub fn finish(self) -> Result<String, KmlError> {
        if self.features.is_empty() {
            return Err(KmlError::Empty);
        }

        let mut out = XmlOut::new();
        out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut root = BytesStart::new("kml");
        root.push_attribute(("xmlns", KML_NAMESPACE));
        out.event(Event::Start(root))?;
        out.start("Document")?;
        if let Some(name) = &self.document_name {
            out.text_element("name", name)?;
        }

        for (index, feature) in self.features.iter().enumerate() {
            write_placemark(&mut out, index, feature, &self.style)?;
        }

        out.end("Document")?;
        out.end("kml")?;
        debug!(features = self.features.len(), "KML 序列化完成");
        out.into_string()
    }
}

fn write_placemark(
    out: &mut XmlOut,
    index: usize,
    feature: &ReprojectedFeature,
    style: &LineStyle,
) -> Result<(), KmlError> {
    out.start("Placemark")?;
    out.text_element("name", &format!("Polyline {}", index + 1))?;

    out.start("Style")?;
    out.start("LineStyle")?;
    out.text_element("color", style.color())?;
    out.text_element("width", &style.width().to_string())?;
    out.end("LineStyle")?;
    out.end("Style")?;

    out.start("ExtendedData")?;
    for (name, value) in [
        ("Layer", feature.layer.as_str()),
        ("SubClasses", feature.subclasses.as_str()),
        ("EntityHandle", feature.entity_handle.as_str()),
    ] {
        let mut data = BytesStart::new("Data");
        data.push_attribute(("name", name));
        out.event(Event::Start(data))?;
        out.text_element("value", value)?;
        out.end("Data")?;
    }
    out.end("ExtendedData")?;

    let coordinates = feature
        .coordinates
        .iter()
        .map(|point| format!("{},{}", point.lon, point.lat))
        .collect::<Vec<_>>()
        .join(" ");
    out.start("LineString")?;
    out.text_element("coordinates", &coordinates)?;
    out.end("LineString")?;

    out.end("Placemark")
}

struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), KmlError> {
        self.writer
            .write_event(event)
            .map_err(|err| KmlError::Write(err.to_string()))
    }

    fn start(&mut self, name: &str) -> Result<(), KmlError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), KmlError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), KmlError> {
        self.start(name)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn into_string(self) -> Result<String, KmlError> {
        String::from_utf8(self.writer.into_inner()).map_err(|err| KmlError::Write(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxfkml_core::document::{DrawingEntity, LWPOLYLINE};
    use dxfkml_core::geometry::GeoPoint;

    fn feature(layer: &str, handle: &str, coords: &[(f64, f64)]) -> ReprojectedFeature {
        let entity = DrawingEntity::new(LWPOLYLINE)
            .with_layer(layer)
            .with_handle(handle);
        ReprojectedFeature::from_entity(
            &entity,
            coords.iter().map(|(lon, lat)| GeoPoint::new(*lon, *lat)).collect(),
        )
    }

    #[test]
    fn empty_writer_refuses_to_serialize() {
        assert!(matches!(KmlWriter::new().finish(), Err(KmlError::Empty)));
    }

    #[test]
    fn placemark_carries_style_metadata_and_lon_lat_coordinates() {
        let mut writer = KmlWriter::new().with_document_name("site");
        writer.push(feature("ROADS", "2F", &[(15.0, 45.5), (15.25, 45.75)]));
        writer.push(feature("R&D <1>", "30", &[(1.0, 2.0), (3.0, 4.0)]));
        let kml = writer.finish().expect("serialize kml");

        assert!(kml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(kml.contains(r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#));
        assert!(kml.contains("<name>site</name>"));
        assert!(kml.contains("<name>Polyline 1</name>"));
        assert!(kml.contains("<name>Polyline 2</name>"));
        assert!(kml.contains("<color>ff000000</color>"));
        assert!(kml.contains("<width>2</width>"));
        assert!(kml.contains(r#"<Data name="Layer">"#));
        assert!(kml.contains("<value>ROADS</value>"));
        assert!(kml.contains("<value>AcDbEntity:AcDbPolyline</value>"));
        assert!(kml.contains(r#"<Data name="EntityHandle">"#));
        assert!(kml.contains("<value>2F</value>"));
        assert!(kml.contains("<value>R&amp;D &lt;1&gt;</value>"));
        assert!(kml.contains("<coordinates>15,45.5 15.25,45.75</coordinates>"));
        assert_eq!(kml.matches("<Placemark>").count(), 2);
    }

    #[test]
    fn custom_style_is_validated() {
        let style = LineStyle::new("FFFF0000", 3.5).expect("valid style");
        assert_eq!(style.color(), "ffff0000");
        assert!(LineStyle::new("blue", 2.0).is_err());
        assert!(LineStyle::new("ff000000", 0.0).is_err());

        let mut writer = KmlWriter::new().with_style(style);
        writer.push(feature("0", "1", &[(0.0, 0.0), (1.0, 1.0)]));
        let kml = writer.finish().unwrap();
        assert!(kml.contains("<color>ffff0000</color>"));
        assert!(kml.contains("<width>3.5</width>"));
    }
}
