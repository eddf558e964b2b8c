//! PPTX package writer.
//!
//! A deck becomes one slide master with two layouts (title slide and title
//! plus content), a theme, a notes master, and one slide part per slide with
//! an optional notes slide. Every layout placeholder carries the configured
//! default font so slides inherit consistent styling.

use crate::xml::{
    relationships_xml, Relationship, XmlBuf, NS_A, NS_CONTENT_TYPES, PML_NAMESPACES, REL_CORE_PROPS,
};
use deck_core::style::{
    body_frame, body_insets, layout_font, resolve_font, slide_size, table_frame, Emu, FontRole,
    FontSpec, Frame, HEADER_FILL, HEADER_TEXT,
};
use deck_core::{
    Block, Bullet, Deck, Error, GeneratorConfig, Result, Slide, SlideKind, TableBlock, TextLine,
};
use std::io::{Cursor, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const APPLICATION: &str = "md2deck";

const CT_MAIN: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_NOTES: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
const CT_NOTES_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_PRES_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
const CT_VIEW_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
const CT_TABLE_STYLES: &str = "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// First relationship id used for slides in `presentation.xml.rels`.
const FIRST_SLIDE_REL: usize = 10;

/// Bullet indent step per list level, in EMU.
const LEVEL_INDENT: i64 = 342_900;

const CLR_MAP: [(&str, &str); 12] = [
    ("bg1", "lt1"),
    ("tx1", "dk1"),
    ("bg2", "lt2"),
    ("tx2", "dk2"),
    ("accent1", "accent1"),
    ("accent2", "accent2"),
    ("accent3", "accent3"),
    ("accent4", "accent4"),
    ("accent5", "accent5"),
    ("accent6", "accent6"),
    ("hlink", "hlink"),
    ("folHlink", "folHlink"),
];

const COLOR_SCHEME: &str = r#"<a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme>"#;

const FORMAT_SCHEME: &str = r#"<a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme>"#;

/// Placeholder kinds used on slides and layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Title,
    CenteredTitle,
    Subtitle,
    Body,
    MasterBody,
    NotesBody,
    SlideImage,
}

impl Placeholder {
    fn attrs(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Title => &[("type", "title")],
            Self::CenteredTitle => &[("type", "ctrTitle")],
            Self::Subtitle => &[("type", "subTitle"), ("idx", "1")],
            Self::Body => &[("idx", "1")],
            Self::MasterBody | Self::NotesBody => &[("type", "body"), ("idx", "1")],
            Self::SlideImage => &[("type", "sldImg")],
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Title | Self::CenteredTitle => "Title",
            Self::Subtitle => "Subtitle",
            Self::Body => "Content Placeholder",
            Self::MasterBody => "Text Placeholder",
            Self::NotesBody => "Notes Placeholder",
            Self::SlideImage => "Slide Image Placeholder",
        }
    }
}

/// Writes decks as PPTX packages.
#[derive(Debug, Clone)]
pub struct PptxWriter<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> PptxWriter<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Serialize `deck` into an in-memory `.pptx`.
    pub fn write_to_vec(&self, deck: &Deck) -> Result<Vec<u8>> {
        let cursor = self.write(deck, Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    /// Serialize `deck` as a ZIP package into `sink`.
    pub fn write<W: Write + Seek>(&self, deck: &Deck, sink: W) -> Result<W> {
        let parts = self.parts(deck)?;
        let mut zip = ZipWriter::new(sink);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (path, bytes) in &parts {
            zip.start_file(path.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", path, e)))?;
            zip.write_all(bytes)?;
        }
        let sink = zip
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish package: {}", e)))?;
        log::debug!("Wrote {} package parts for {} slides", parts.len(), deck.slides.len());
        Ok(sink)
    }

    /// All package parts in write order.
    fn parts(&self, deck: &Deck) -> Result<Vec<(String, Vec<u8>)>> {
        let mut parts = vec![
            ("[Content_Types].xml".to_string(), content_types_xml(deck)?),
            ("_rels/.rels".to_string(), package_rels_xml()?),
            ("docProps/core.xml".to_string(), core_props_xml(deck)?),
            ("docProps/app.xml".to_string(), app_props_xml(deck)?),
            ("ppt/presentation.xml".to_string(), presentation_xml(deck)?),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                presentation_rels_xml(deck)?,
            ),
            ("ppt/presProps.xml".to_string(), empty_root("p:presentationPr")?),
            ("ppt/viewProps.xml".to_string(), empty_root("p:viewPr")?),
            ("ppt/tableStyles.xml".to_string(), table_styles_xml()?),
            ("ppt/theme/theme1.xml".to_string(), self.theme_xml("Office Theme")?),
            ("ppt/theme/theme2.xml".to_string(), self.theme_xml("Notes Theme")?),
            (
                "ppt/slideMasters/slideMaster1.xml".to_string(),
                self.slide_master_xml()?,
            ),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
                relationships_xml(&[
                    Relationship::office("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                    Relationship::office("rId2", "slideLayout", "../slideLayouts/slideLayout2.xml"),
                    Relationship::office("rId3", "theme", "../theme/theme1.xml"),
                ])?,
            ),
            (
                "ppt/notesMasters/notesMaster1.xml".to_string(),
                notes_master_xml()?,
            ),
            (
                "ppt/notesMasters/_rels/notesMaster1.xml.rels".to_string(),
                relationships_xml(&[Relationship::office("rId1", "theme", "../theme/theme2.xml")])?,
            ),
        ];

        for (layout, title_slide) in [(1, true), (2, false)] {
            parts.push((
                format!("ppt/slideLayouts/slideLayout{}.xml", layout),
                self.layout_xml(title_slide)?,
            ));
            parts.push((
                format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", layout),
                relationships_xml(&[Relationship::office(
                    "rId1",
                    "slideMaster",
                    "../slideMasters/slideMaster1.xml",
                )])?,
            ));
        }

        for (i, slide) in deck.slides.iter().enumerate() {
            let n = i + 1;
            let layout = if slide.kind == SlideKind::Title { 1 } else { 2 };
            let mut rels = vec![Relationship::office(
                "rId1",
                "slideLayout",
                format!("../slideLayouts/slideLayout{}.xml", layout),
            )];
            parts.push((format!("ppt/slides/slide{}.xml", n), self.slide_xml(slide)?));

            if let Some(notes) = &slide.notes {
                rels.push(Relationship::office(
                    "rId2",
                    "notesSlide",
                    format!("../notesSlides/notesSlide{}.xml", n),
                ));
                parts.push((format!("ppt/notesSlides/notesSlide{}.xml", n), notes_slide_xml(notes)?));
                parts.push((
                    format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", n),
                    relationships_xml(&[
                        Relationship::office("rId1", "notesMaster", "../notesMasters/notesMaster1.xml"),
                        Relationship::office("rId2", "slide", format!("../slides/slide{}.xml", n)),
                    ])?,
                ));
            }
            parts.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", n),
                relationships_xml(&rels)?,
            ));
        }

        Ok(parts)
    }

    fn theme_xml(&self, name: &str) -> Result<Vec<u8>> {
        let fonts = &self.config.fonts;
        let mut xml = XmlBuf::new()?;
        xml.start("a:theme", &[("xmlns:a", NS_A), ("name", name)])?;
        xml.start("a:themeElements", &[])?;
        xml.raw(COLOR_SCHEME)?;
        xml.start("a:fontScheme", &[("name", "Office")])?;
        for (tag, face) in [("a:majorFont", &fonts.heading), ("a:minorFont", &fonts.default)] {
            xml.start(tag, &[])?;
            xml.empty("a:latin", &[("typeface", face.as_str())])?;
            xml.empty("a:ea", &[("typeface", "")])?;
            xml.empty("a:cs", &[("typeface", "")])?;
            xml.end(tag)?;
        }
        xml.end("a:fontScheme")?;
        xml.raw(FORMAT_SCHEME)?;
        xml.end("a:themeElements")?;
        xml.end("a:theme")?;
        Ok(xml.finish())
    }

    fn slide_master_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlBuf::new()?;
        xml.start("p:sldMaster", &PML_NAMESPACES)?;
        xml.start("p:cSld", &[])?;
        xml.start("p:bg", &[])?;
        xml.start("p:bgRef", &[("idx", "1001")])?;
        xml.empty("a:schemeClr", &[("val", "bg1")])?;
        xml.end("p:bgRef")?;
        xml.end("p:bg")?;
        xml.start("p:spTree", &[])?;
        group_shape_header(&mut xml)?;

        let title = Frame {
            left: Emu(457_200),
            top: Emu(274_638),
            width: Emu(8_229_600),
            height: Emu(1_143_000),
        };
        let body = Frame {
            left: Emu(457_200),
            top: Emu(1_600_200),
            width: Emu(8_229_600),
            height: Emu(4_525_963),
        };
        for (id, ph, frame) in [(2, Placeholder::Title, title), (3, Placeholder::MasterBody, body)] {
            start_placeholder(&mut xml, id, ph)?;
            shape_properties(&mut xml, Some(&frame))?;
            xml.start("p:txBody", &[])?;
            xml.empty("a:bodyPr", &[])?;
            xml.empty("a:lstStyle", &[])?;
            empty_paragraph(&mut xml)?;
            xml.end("p:txBody")?;
            xml.end("p:sp")?;
        }

        xml.end("p:spTree")?;
        xml.end("p:cSld")?;
        xml.empty("p:clrMap", &CLR_MAP)?;
        xml.start("p:sldLayoutIdLst", &[])?;
        xml.empty("p:sldLayoutId", &[("id", "2147483649"), ("r:id", "rId1")])?;
        xml.empty("p:sldLayoutId", &[("id", "2147483650"), ("r:id", "rId2")])?;
        xml.end("p:sldLayoutIdLst")?;
        self.text_styles(&mut xml)?;
        xml.end("p:sldMaster")?;
        Ok(xml.finish())
    }

    fn text_styles(&self, xml: &mut XmlBuf) -> Result<()> {
        let fonts = &self.config.fonts;
        xml.start("p:txStyles", &[])?;

        xml.start("p:titleStyle", &[])?;
        xml.start("a:lvl1pPr", &[("algn", "l")])?;
        let size = (fonts.heading_size * 100).to_string();
        xml.start("a:defRPr", &[("sz", size.as_str()), ("kern", "1200")])?;
        xml.start("a:solidFill", &[])?;
        xml.empty("a:schemeClr", &[("val", "tx1")])?;
        xml.end("a:solidFill")?;
        xml.empty("a:latin", &[("typeface", "+mj-lt")])?;
        xml.end("a:defRPr")?;
        xml.end("a:lvl1pPr")?;
        xml.end("p:titleStyle")?;

        xml.start("p:bodyStyle", &[])?;
        let size = (fonts.default_size * 100).to_string();
        for level in 1..=self.config.max_list_level.saturating_add(1).min(9) {
            let tag = format!("a:lvl{}pPr", level);
            let mar_l = (LEVEL_INDENT * i64::from(level)).to_string();
            xml.start(&tag, &[("marL", mar_l.as_str()), ("indent", "-228600")])?;
            xml.empty("a:buFont", &[("typeface", "Arial")])?;
            xml.empty("a:buChar", &[("char", if level == 1 { "•" } else { "–" })])?;
            xml.start("a:defRPr", &[("sz", size.as_str()), ("kern", "1200")])?;
            xml.start("a:solidFill", &[])?;
            xml.empty("a:schemeClr", &[("val", "tx1")])?;
            xml.end("a:solidFill")?;
            xml.empty("a:latin", &[("typeface", "+mn-lt")])?;
            xml.end("a:defRPr")?;
            xml.end(&tag)?;
        }
        xml.end("p:bodyStyle")?;

        xml.start("p:otherStyle", &[])?;
        xml.start("a:defPPr", &[])?;
        xml.empty("a:defRPr", &[("lang", "en-US")])?;
        xml.end("a:defPPr")?;
        xml.end("p:otherStyle")?;

        xml.end("p:txStyles")
    }

    fn layout_xml(&self, title_slide: bool) -> Result<Vec<u8>> {
        let (kind, name) = if title_slide {
            ("title", "Title Slide")
        } else {
            ("obj", "Title and Content")
        };
        let mut attrs = PML_NAMESPACES.to_vec();
        attrs.extend([("type", kind), ("preserve", "1")]);

        let mut xml = XmlBuf::new()?;
        xml.start("p:sldLayout", &attrs)?;
        xml.start("p:cSld", &[("name", name)])?;
        xml.start("p:spTree", &[])?;
        group_shape_header(&mut xml)?;

        let placeholders: [(Placeholder, Option<Frame>); 2] = if title_slide {
            [
                (
                    Placeholder::CenteredTitle,
                    Some(Frame {
                        left: Emu(685_800),
                        top: Emu(2_130_425),
                        width: Emu(7_772_400),
                        height: Emu(1_470_025),
                    }),
                ),
                (
                    Placeholder::Subtitle,
                    Some(Frame {
                        left: Emu(1_371_600),
                        top: Emu(3_886_200),
                        width: Emu(6_400_800),
                        height: Emu(1_752_600),
                    }),
                ),
            ]
        } else {
            [(Placeholder::Title, None), (Placeholder::Body, None)]
        };

        for (i, (ph, frame)) in placeholders.into_iter().enumerate() {
            start_placeholder(&mut xml, i + 2, ph)?;
            shape_properties(&mut xml, frame.as_ref())?;
            xml.start("p:txBody", &[])?;
            xml.empty("a:bodyPr", &[])?;
            self.layout_list_style(&mut xml, ph)?;
            empty_paragraph(&mut xml)?;
            xml.end("p:txBody")?;
            xml.end("p:sp")?;
        }

        xml.end("p:spTree")?;
        xml.end("p:cSld")?;
        xml.start("p:clrMapOvr", &[])?;
        xml.empty("a:masterClrMapping", &[])?;
        xml.end("p:clrMapOvr")?;
        xml.end("p:sldLayout")?;
        Ok(xml.finish())
    }

    /// Default font for every level of a layout placeholder. A font that
    /// cannot be applied leaves the placeholder with the master's styling.
    fn layout_list_style(&self, xml: &mut XmlBuf, ph: Placeholder) -> Result<()> {
        let font = match layout_font(&self.config.fonts) {
            Ok(font) => font,
            Err(e) => {
                log::warn!("Layout placeholder '{}' keeps master font: {}", ph.name(), e);
                return xml.empty("a:lstStyle", &[]);
            }
        };
        let size = font.size_hundredths().to_string();
        let levels = match ph {
            Placeholder::Body => self.config.max_list_level.saturating_add(1).min(9),
            _ => 1,
        };

        xml.start("a:lstStyle", &[])?;
        for level in 1..=levels {
            let tag = format!("a:lvl{}pPr", level);
            if ph == Placeholder::Subtitle {
                xml.start(&tag, &[("marL", "0"), ("indent", "0"), ("algn", "ctr")])?;
                xml.empty("a:buNone", &[])?;
            } else {
                xml.start(&tag, &[])?;
            }
            xml.start("a:defRPr", &[("sz", size.as_str())])?;
            xml.empty("a:latin", &[("typeface", font.name.as_str())])?;
            xml.end("a:defRPr")?;
            xml.end(&tag)?;
        }
        xml.end("a:lstStyle")
    }

    fn slide_xml(&self, slide: &Slide) -> Result<Vec<u8>> {
        let mut xml = XmlBuf::new()?;
        xml.start("p:sld", &PML_NAMESPACES)?;
        xml.start("p:cSld", &[])?;
        xml.start("p:spTree", &[])?;
        group_shape_header(&mut xml)?;

        match slide.kind {
            SlideKind::Title => {
                self.text_shape(&mut xml, 2, Placeholder::CenteredTitle, &slide.title)?;
                let subtitle = slide.subtitle.as_deref().unwrap_or(" ");
                self.text_shape(&mut xml, 3, Placeholder::Subtitle, subtitle)?;
            }
            SlideKind::Content | SlideKind::Fallback => {
                self.text_shape(&mut xml, 2, Placeholder::Title, &slide.title)?;
                self.body_shape(&mut xml, 3, slide)?;
                let mut heights = Vec::new();
                for (i, table) in slide.body.tables().enumerate() {
                    let frame = table_frame(table.rows.len(), &heights);
                    heights.push(frame.height);
                    table_shape(&mut xml, 4 + i, table, &frame)?;
                }
            }
        }

        xml.end("p:spTree")?;
        xml.end("p:cSld")?;
        xml.start("p:clrMapOvr", &[])?;
        xml.empty("a:masterClrMapping", &[])?;
        xml.end("p:clrMapOvr")?;
        xml.end("p:sld")?;
        Ok(xml.finish())
    }

    /// A title or subtitle placeholder holding one paragraph.
    fn text_shape(&self, xml: &mut XmlBuf, id: usize, ph: Placeholder, text: &str) -> Result<()> {
        let role = match ph {
            Placeholder::Title | Placeholder::CenteredTitle => FontRole::Heading,
            _ => FontRole::Default,
        };
        let font = match resolve_font(role, text, &self.config.fonts) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("{} text keeps inherited font: {}", ph.name(), e);
                None
            }
        };
        let mut line = TextLine::new(text, 0);
        line.font = font;

        start_placeholder(xml, id, ph)?;
        shape_properties(xml, None)?;
        xml.start("p:txBody", &[])?;
        xml.empty("a:bodyPr", &[])?;
        xml.empty("a:lstStyle", &[])?;
        paragraph(xml, &line)?;
        xml.end("p:txBody")?;
        xml.end("p:sp")
    }

    /// The body placeholder with the slide's text blocks.
    fn body_shape(&self, xml: &mut XmlBuf, id: usize, slide: &Slide) -> Result<()> {
        let frame = body_frame();
        let insets = body_insets();
        let (l, r, t, b) = (
            insets.left.value().to_string(),
            insets.right.value().to_string(),
            insets.top.value().to_string(),
            insets.bottom.value().to_string(),
        );

        start_placeholder(xml, id, Placeholder::Body)?;
        shape_properties(xml, Some(&frame))?;
        xml.start("p:txBody", &[])?;
        xml.start(
            "a:bodyPr",
            &[
                ("wrap", "square"),
                ("lIns", l.as_str()),
                ("tIns", t.as_str()),
                ("rIns", r.as_str()),
                ("bIns", b.as_str()),
                ("anchor", "t"),
            ],
        )?;
        xml.empty("a:normAutofit", &[])?;
        xml.end("a:bodyPr")?;
        xml.empty("a:lstStyle", &[])?;

        let mut wrote = false;
        for block in slide.body.blocks() {
            match block {
                Block::Text(line) => {
                    paragraph(xml, line)?;
                    wrote = true;
                }
                Block::Placeholder | Block::Table(_) => {}
            }
        }
        if !wrote {
            empty_paragraph(xml)?;
        }
        xml.end("p:txBody")?;
        xml.end("p:sp")
    }
}

fn empty_root(name: &str) -> Result<Vec<u8>> {
    let mut xml = XmlBuf::new()?;
    xml.empty(name, &PML_NAMESPACES)?;
    Ok(xml.finish())
}

fn table_styles_xml() -> Result<Vec<u8>> {
    let mut xml = XmlBuf::new()?;
    xml.empty(
        "a:tblStyleLst",
        &[("xmlns:a", NS_A), ("def", "{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}")],
    )?;
    Ok(xml.finish())
}

fn content_types_xml(deck: &Deck) -> Result<Vec<u8>> {
    let mut overrides: Vec<(String, &str)> = vec![
        ("/ppt/presentation.xml".into(), CT_MAIN),
        ("/ppt/slideMasters/slideMaster1.xml".into(), CT_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml".into(), CT_LAYOUT),
        ("/ppt/slideLayouts/slideLayout2.xml".into(), CT_LAYOUT),
        ("/ppt/notesMasters/notesMaster1.xml".into(), CT_NOTES_MASTER),
        ("/ppt/theme/theme1.xml".into(), CT_THEME),
        ("/ppt/theme/theme2.xml".into(), CT_THEME),
        ("/ppt/presProps.xml".into(), CT_PRES_PROPS),
        ("/ppt/viewProps.xml".into(), CT_VIEW_PROPS),
        ("/ppt/tableStyles.xml".into(), CT_TABLE_STYLES),
        ("/docProps/core.xml".into(), CT_CORE),
        ("/docProps/app.xml".into(), CT_APP),
    ];
    for (i, slide) in deck.slides.iter().enumerate() {
        overrides.push((format!("/ppt/slides/slide{}.xml", i + 1), CT_SLIDE));
        if slide.notes.is_some() {
            overrides.push((format!("/ppt/notesSlides/notesSlide{}.xml", i + 1), CT_NOTES));
        }
    }

    let mut xml = XmlBuf::new()?;
    xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    for (part, kind) in &overrides {
        xml.empty("Override", &[("PartName", part.as_str()), ("ContentType", kind)])?;
    }
    xml.end("Types")?;
    Ok(xml.finish())
}

fn package_rels_xml() -> Result<Vec<u8>> {
    relationships_xml(&[
        Relationship::office("rId1", "officeDocument", "ppt/presentation.xml"),
        Relationship {
            id: "rId2".into(),
            kind: REL_CORE_PROPS.into(),
            target: "docProps/core.xml".into(),
        },
        Relationship::office("rId3", "extended-properties", "docProps/app.xml"),
    ])
}

fn core_props_xml(deck: &Deck) -> Result<Vec<u8>> {
    let mut xml = XmlBuf::new()?;
    xml.start(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    if let Some(title) = &deck.title {
        xml.leaf("dc:title", &[], title)?;
    }
    xml.leaf("dc:creator", &[], APPLICATION)?;
    xml.end("cp:coreProperties")?;
    Ok(xml.finish())
}

fn app_props_xml(deck: &Deck) -> Result<Vec<u8>> {
    let notes = deck.slides.iter().filter(|s| s.notes.is_some()).count();
    let mut xml = XmlBuf::new()?;
    xml.start(
        "Properties",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
        )],
    )?;
    xml.leaf("Application", &[], APPLICATION)?;
    xml.leaf("Slides", &[], &deck.slides.len().to_string())?;
    xml.leaf("Notes", &[], &notes.to_string())?;
    xml.end("Properties")?;
    Ok(xml.finish())
}

fn presentation_xml(deck: &Deck) -> Result<Vec<u8>> {
    let (cx, cy) = slide_size();
    let mut attrs = PML_NAMESPACES.to_vec();
    attrs.push(("saveSubsetFonts", "1"));

    let mut xml = XmlBuf::new()?;
    xml.start("p:presentation", &attrs)?;
    xml.start("p:sldMasterIdLst", &[])?;
    xml.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    xml.end("p:sldMasterIdLst")?;
    xml.start("p:notesMasterIdLst", &[])?;
    xml.empty("p:notesMasterId", &[("r:id", "rId2")])?;
    xml.end("p:notesMasterIdLst")?;
    xml.start("p:sldIdLst", &[])?;
    for i in 0..deck.slides.len() {
        let id = (256 + i).to_string();
        let rel = format!("rId{}", FIRST_SLIDE_REL + i);
        xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rel.as_str())])?;
    }
    xml.end("p:sldIdLst")?;
    let (cx, cy) = (cx.value().to_string(), cy.value().to_string());
    xml.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;
    xml.end("p:presentation")?;
    Ok(xml.finish())
}

fn presentation_rels_xml(deck: &Deck) -> Result<Vec<u8>> {
    let mut rels = vec![
        Relationship::office("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        Relationship::office("rId2", "notesMaster", "notesMasters/notesMaster1.xml"),
        Relationship::office("rId3", "theme", "theme/theme1.xml"),
        Relationship::office("rId4", "presProps", "presProps.xml"),
        Relationship::office("rId5", "viewProps", "viewProps.xml"),
        Relationship::office("rId6", "tableStyles", "tableStyles.xml"),
    ];
    for i in 0..deck.slides.len() {
        rels.push(Relationship::office(
            format!("rId{}", FIRST_SLIDE_REL + i),
            "slide",
            format!("slides/slide{}.xml", i + 1),
        ));
    }
    relationships_xml(&rels)
}

fn notes_master_xml() -> Result<Vec<u8>> {
    let mut xml = XmlBuf::new()?;
    xml.start("p:notesMaster", &PML_NAMESPACES)?;
    xml.start("p:cSld", &[])?;
    xml.start("p:spTree", &[])?;
    group_shape_header(&mut xml)?;
    start_placeholder(&mut xml, 2, Placeholder::NotesBody)?;
    shape_properties(
        &mut xml,
        Some(&Frame {
            left: Emu(685_800),
            top: Emu(4_343_400),
            width: Emu(5_486_400),
            height: Emu(4_114_800),
        }),
    )?;
    xml.start("p:txBody", &[])?;
    xml.empty("a:bodyPr", &[])?;
    xml.empty("a:lstStyle", &[])?;
    empty_paragraph(&mut xml)?;
    xml.end("p:txBody")?;
    xml.end("p:sp")?;
    xml.end("p:spTree")?;
    xml.end("p:cSld")?;
    xml.empty("p:clrMap", &CLR_MAP)?;
    xml.end("p:notesMaster")?;
    Ok(xml.finish())
}

fn notes_slide_xml(notes: &str) -> Result<Vec<u8>> {
    let mut xml = XmlBuf::new()?;
    xml.start("p:notes", &PML_NAMESPACES)?;
    xml.start("p:cSld", &[])?;
    xml.start("p:spTree", &[])?;
    group_shape_header(&mut xml)?;

    start_placeholder(&mut xml, 2, Placeholder::SlideImage)?;
    shape_properties(&mut xml, None)?;
    xml.end("p:sp")?;

    start_placeholder(&mut xml, 3, Placeholder::NotesBody)?;
    shape_properties(&mut xml, None)?;
    xml.start("p:txBody", &[])?;
    xml.empty("a:bodyPr", &[])?;
    xml.empty("a:lstStyle", &[])?;
    for line in notes.lines() {
        paragraph(&mut xml, &TextLine::new(line, 0))?;
    }
    xml.end("p:txBody")?;
    xml.end("p:sp")?;

    xml.end("p:spTree")?;
    xml.end("p:cSld")?;
    xml.start("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.end("p:clrMapOvr")?;
    xml.end("p:notes")?;
    Ok(xml.finish())
}

fn group_shape_header(xml: &mut XmlBuf) -> Result<()> {
    xml.start("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGrpSpPr")?;
    xml.start("p:grpSpPr", &[])?;
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
    xml.empty("a:chOff", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:chExt", &[("cx", "0"), ("cy", "0")])?;
    xml.end("a:xfrm")?;
    xml.end("p:grpSpPr")
}

/// Open `<p:sp>` and write its non-visual properties.
fn start_placeholder(xml: &mut XmlBuf, id: usize, ph: Placeholder) -> Result<()> {
    let id_str = id.to_string();
    let name = format!("{} {}", ph.name(), id - 1);
    xml.start("p:sp", &[])?;
    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", id_str.as_str()), ("name", name.as_str())])?;
    xml.start("p:cNvSpPr", &[])?;
    xml.empty("a:spLocks", &[("noGrp", "1")])?;
    xml.end("p:cNvSpPr")?;
    xml.start("p:nvPr", &[])?;
    xml.empty("p:ph", ph.attrs())?;
    xml.end("p:nvPr")?;
    xml.end("p:nvSpPr")
}

fn shape_properties(xml: &mut XmlBuf, frame: Option<&Frame>) -> Result<()> {
    match frame {
        Some(frame) => {
            xml.start("p:spPr", &[])?;
            transform(xml, "a:xfrm", frame)?;
            xml.end("p:spPr")
        }
        None => xml.empty("p:spPr", &[]),
    }
}

fn transform(xml: &mut XmlBuf, tag: &str, frame: &Frame) -> Result<()> {
    let (x, y) = (frame.left.value().to_string(), frame.top.value().to_string());
    let (cx, cy) = (frame.width.value().to_string(), frame.height.value().to_string());
    xml.start(tag, &[])?;
    xml.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
    xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.end(tag)
}

fn empty_paragraph(xml: &mut XmlBuf) -> Result<()> {
    xml.start("a:p", &[])?;
    xml.empty("a:endParaRPr", &[("lang", "en-US"), ("dirty", "0")])?;
    xml.end("a:p")
}

/// One `<a:p>`; `\n` in the text becomes a line break.
fn paragraph(xml: &mut XmlBuf, line: &TextLine) -> Result<()> {
    xml.start("a:p", &[])?;

    let level = line.level.to_string();
    let mut ppr: Vec<(&str, &str)> = Vec::new();
    if line.level > 0 {
        ppr.push(("lvl", level.as_str()));
    }
    let has_children = line.tight || line.bullet == Bullet::None;
    if has_children {
        xml.start("a:pPr", &ppr)?;
        if line.tight {
            for tag in ["a:spcBef", "a:spcAft"] {
                xml.start(tag, &[])?;
                xml.empty("a:spcPts", &[("val", "0")])?;
                xml.end(tag)?;
            }
        }
        if line.bullet == Bullet::None {
            xml.empty("a:buNone", &[])?;
        }
        xml.end("a:pPr")?;
    } else if !ppr.is_empty() {
        xml.empty("a:pPr", &ppr)?;
    }

    for (i, segment) in line.text.split('\n').enumerate() {
        if i > 0 {
            xml.start("a:br", &[])?;
            xml.empty("a:rPr", &[("lang", "en-US")])?;
            xml.end("a:br")?;
        }
        run(xml, segment, line.font.as_ref(), line.italic, None)?;
    }
    xml.end("a:p")
}

/// One `<a:r>`. `color` forces a bold run in that colour.
fn run(
    xml: &mut XmlBuf,
    text: &str,
    font: Option<&FontSpec>,
    italic: bool,
    color: Option<&str>,
) -> Result<()> {
    let size = font.map(|f| f.size_hundredths().to_string());
    let mut attrs: Vec<(&str, &str)> = vec![("lang", "en-US")];
    if let Some(size) = &size {
        attrs.push(("sz", size.as_str()));
    }
    if color.is_some() {
        attrs.push(("b", "1"));
    }
    if italic {
        attrs.push(("i", "1"));
    }
    attrs.push(("dirty", "0"));

    xml.start("a:r", &[])?;
    if color.is_none() && font.is_none() {
        xml.empty("a:rPr", &attrs)?;
    } else {
        xml.start("a:rPr", &attrs)?;
        if let Some(color) = color {
            xml.start("a:solidFill", &[])?;
            xml.empty("a:srgbClr", &[("val", color)])?;
            xml.end("a:solidFill")?;
        }
        if let Some(font) = font {
            xml.empty("a:latin", &[("typeface", font.name.as_str())])?;
        }
        xml.end("a:rPr")?;
    }
    xml.leaf("a:t", &[], text)?;
    xml.end("a:r")
}

fn table_shape(xml: &mut XmlBuf, id: usize, table: &TableBlock, frame: &Frame) -> Result<()> {
    let id_str = id.to_string();
    let name = format!("Table {}", id - 1);
    let columns = table.columns.max(1) as i64;
    let rows = table.rows.len().max(1) as i64;
    let col_width = (frame.width.value() / columns).to_string();
    let row_height = (frame.height.value() / rows).to_string();
    let header_fill = HEADER_FILL.hex();
    let header_text = HEADER_TEXT.hex();

    xml.start("p:graphicFrame", &[])?;
    xml.start("p:nvGraphicFramePr", &[])?;
    xml.empty("p:cNvPr", &[("id", id_str.as_str()), ("name", name.as_str())])?;
    xml.start("p:cNvGraphicFramePr", &[])?;
    xml.empty("a:graphicFrameLocks", &[("noGrp", "1")])?;
    xml.end("p:cNvGraphicFramePr")?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGraphicFramePr")?;
    transform(xml, "p:xfrm", frame)?;
    xml.start("a:graphic", &[])?;
    xml.start(
        "a:graphicData",
        &[("uri", "http://schemas.openxmlformats.org/drawingml/2006/table")],
    )?;
    xml.start("a:tbl", &[])?;
    xml.empty("a:tblPr", &[("firstRow", "1"), ("bandRow", "1")])?;
    xml.start("a:tblGrid", &[])?;
    for _ in 0..table.columns {
        xml.empty("a:gridCol", &[("w", col_width.as_str())])?;
    }
    xml.end("a:tblGrid")?;

    for row in &table.rows {
        xml.start("a:tr", &[("h", row_height.as_str())])?;
        for cell in row {
            xml.start("a:tc", &[])?;
            xml.start("a:txBody", &[])?;
            xml.empty("a:bodyPr", &[])?;
            xml.empty("a:lstStyle", &[])?;
            xml.start("a:p", &[])?;
            if cell.text.is_empty() {
                xml.empty("a:endParaRPr", &[("lang", "en-US"), ("dirty", "0")])?;
            } else {
                let color = cell.header.then_some(header_text.as_str());
                run(xml, &cell.text, None, false, color)?;
            }
            xml.end("a:p")?;
            xml.end("a:txBody")?;
            if cell.header {
                xml.start("a:tcPr", &[])?;
                xml.start("a:solidFill", &[])?;
                xml.empty("a:srgbClr", &[("val", header_fill.as_str())])?;
                xml.end("a:solidFill")?;
                xml.end("a:tcPr")?;
            } else {
                xml.empty("a:tcPr", &[])?;
            }
            xml.end("a:tc")?;
        }
        xml.end("a:tr")?;
    }

    xml.end("a:tbl")?;
    xml.end("a:graphicData")?;
    xml.end("a:graphic")?;
    xml.end("p:graphicFrame")
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{parse_markdown, DeckBuilder};
    use std::io::Read;
    use zip::ZipArchive;

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    fn write(md: &str) -> Vec<u8> {
        let config = GeneratorConfig::default();
        let deck = DeckBuilder::new(&config).build(&parse_markdown(md), Some("Training"));
        PptxWriter::new(&config).write_to_vec(&deck).unwrap()
    }

    #[test]
    fn test_package_has_required_parts() {
        let bytes = write("# Intro\n\nBasics\n\n# Slide 2: Tools\n\n- Iron\n\nspeaker notes: Heat it\n");
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for required in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slideLayouts/slideLayout2.xml",
            "ppt/notesSlides/notesSlide1.xml",
            "ppt/theme/theme2.xml",
        ] {
            assert!(names.contains(&required), "missing {}", required);
        }
        let types = part(&bytes, "[Content_Types].xml");
        assert!(types.contains("/ppt/notesSlides/notesSlide1.xml"));
        assert!(!types.contains("/ppt/notesSlides/notesSlide2.xml"));
        assert!(part(&bytes, "docProps/core.xml").contains("<dc:title>Training</dc:title>"));
    }

    #[test]
    fn test_layouts_carry_default_font() {
        let bytes = write("# Intro\n");
        let layout = part(&bytes, "ppt/slideLayouts/slideLayout2.xml");
        assert!(layout.contains(r#"<a:defRPr sz="2200"><a:latin typeface="Calibri"/></a:defRPr>"#));
        assert!(layout.contains(r#"<a:lvl5pPr>"#));
        let title_layout = part(&bytes, "ppt/slideLayouts/slideLayout1.xml");
        assert!(title_layout.contains(r#"<p:ph type="subTitle" idx="1"/>"#));
    }

    #[test]
    fn test_custom_fonts_reach_layouts_and_theme() {
        let fonts = deck_core::FontConfig {
            default: "Georgia".to_string(),
            layout_size: 18,
            ..Default::default()
        };
        let config = GeneratorConfig::default().with_fonts(fonts);
        let deck = DeckBuilder::new(&config).build(&parse_markdown("# Intro\n"), None);
        let bytes = PptxWriter::new(&config).write_to_vec(&deck).unwrap();

        let layout = part(&bytes, "ppt/slideLayouts/slideLayout2.xml");
        assert!(layout.contains(r#"<a:defRPr sz="1800"><a:latin typeface="Georgia"/></a:defRPr>"#));
        assert!(part(&bytes, "ppt/theme/theme1.xml").contains(r#"<a:latin typeface="Georgia"/>"#));
    }

    #[test]
    fn test_code_and_header_cells_styled() {
        let bytes = write(
            "# Intro\n\nBasics\n\n# Slide 2: Code\n\n```\nfn main() {}\nrun();\n```\n\n| A | B |\n|---|---|\n| 1 | 2 |\n",
        );
        let slide = part(&bytes, "ppt/slides/slide2.xml");
        assert!(slide.contains("<a:buNone/>"));
        assert!(slide.contains(r#"<a:latin typeface="Courier New"/>"#));
        assert!(slide.contains("<a:t>fn main() {}</a:t></a:r><a:br>"));
        assert!(slide.contains(r#"<a:srgbClr val="4472C4"/>"#));
        assert!(slide.contains(r#"b="1""#));
        assert!(slide.contains(r#"<a:srgbClr val="FFFFFF"/>"#));
        assert!(slide.contains(r#"<a:off x="457200" y="1618488"/>"#));
    }

    #[test]
    fn test_body_placeholder_geometry() {
        let bytes = write("# Intro\n\nBasics\n\n# Slide 2: Tools\n\n- Iron\n");
        let slide = part(&bytes, "ppt/slides/slide2.xml");
        assert!(slide.contains(r#"<a:off x="457200" y="1900800"/>"#));
        assert!(slide.contains(r#"anchor="t""#));
        assert!(slide.contains("<a:normAutofit/>"));
        assert!(slide.contains(r#"<a:spcPts val="0"/>"#));
    }
}
