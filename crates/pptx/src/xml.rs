//! Small quick-xml helpers shared by the writer and reader.

use deck_core::text::strip_invalid_xml_chars;
use deck_core::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Relationship type URIs are this prefix plus the part kind.
pub const REL_PREFIX: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/";
pub const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

/// Namespace attributes for PresentationML roots.
pub const PML_NAMESPACES: [(&str, &str); 3] =
    [("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)];

/// An XML document under construction.
pub struct XmlBuf {
    writer: Writer<Cursor<Vec<u8>>>,
}

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::XmlError(e.to_string())
}

impl XmlBuf {
    /// Start a standalone UTF-8 document.
    pub fn new() -> Result<Self> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(tag)).map_err(xml_error)
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(tag)).map_err(xml_error)
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    /// Escaped character data; characters XML cannot carry are dropped.
    pub fn text(&mut self, text: &str) -> Result<()> {
        let text = strip_invalid_xml_chars(text);
        self.writer
            .write_event(Event::Text(BytesText::new(&text)))
            .map_err(xml_error)
    }

    /// Already-escaped markup, written verbatim.
    pub fn raw(&mut self, markup: &str) -> Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(markup)))
            .map_err(xml_error)
    }

    /// `<name attrs>text</name>`
    pub fn leaf(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

/// One `Relationship` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub kind: String,
    pub target: String,
}

impl Relationship {
    /// A relationship whose type is `REL_PREFIX` + `kind`.
    pub fn office(id: impl Into<String>, kind: &str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: format!("{}{}", REL_PREFIX, kind),
            target: target.into(),
        }
    }
}

/// Serialize a relationships part.
pub fn relationships_xml(rels: &[Relationship]) -> Result<Vec<u8>> {
    let mut xml = XmlBuf::new()?;
    xml.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    for rel in rels {
        xml.empty(
            "Relationship",
            &[
                ("Id", rel.id.as_str()),
                ("Type", rel.kind.as_str()),
                ("Target", rel.target.as_str()),
            ],
        )?;
    }
    xml.end("Relationships")?;
    Ok(xml.finish())
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_text_is_escaped() {
        let mut xml = XmlBuf::new().unwrap();
        xml.leaf("a:t", &[], "if a < b && c > d").unwrap();
        let out = String::from_utf8(xml.finish()).unwrap();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(out.ends_with("<a:t>if a &lt; b &amp;&amp; c &gt; d</a:t>"));
    }

    #[test]
    fn test_control_characters_dropped() {
        let mut xml = XmlBuf::new().unwrap();
        xml.leaf("a:t", &[], "Tin\u{1} the\u{1f} tip").unwrap();
        let out = String::from_utf8(xml.finish()).unwrap();
        assert!(out.ends_with("<a:t>Tin the tip</a:t>"));
    }

    #[test]
    fn test_relationships_xml() {
        let rels = [Relationship::office("rId1", "slideLayout", "../slideLayouts/slideLayout2.xml")];
        let out = String::from_utf8(relationships_xml(&rels).unwrap()).unwrap();
        assert!(out.contains(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout2.xml"/>"#
        ));
    }
}
