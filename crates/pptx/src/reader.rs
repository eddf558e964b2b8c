//! PPTX reader used to inspect generated decks.

use crate::xml::local_name;
use deck_core::{Error, ExtractedDeck, ExtractedSlide, Result, SlideText};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Reader for PPTX (Office Open XML) files.
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a PPTX package: slide titles, body lines, tables, and notes.
    pub fn read<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<ExtractedDeck> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut deck = ExtractedDeck::new(filename);

        // Slide order comes from presentation.xml.rels
        let slide_order = self.get_slide_order(&mut archive)?;

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            deck.add_slide(slide);
        }

        Ok(deck)
    }

    /// Get the ordered list of slide paths from the presentation relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = self.read_relationships(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut slides: Vec<(String, Option<usize>)> = rels
            .into_iter()
            .filter(|rel| rel.kind.ends_with("/slide"))
            .map(|rel| {
                let order_num = extract_slide_number(&rel.target).or_else(|| extract_slide_number(&rel.id));
                (resolve_target("ppt", &rel.target), order_num)
            })
            .collect();

        // Sort slides by their number
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide and its notes from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<ExtractedSlide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let parsed = parse_shapes(&content);
        let mut slide = ExtractedSlide::new(slide_number);

        for shape in parsed.shapes {
            if shape.is_title() {
                let title: Vec<&str> = shape.paragraphs.iter().map(|p| p.text.as_str()).collect();
                let title = title.join(" ");
                if !title.trim().is_empty() {
                    slide.title = Some(title);
                }
                continue;
            }
            for para in shape.paragraphs {
                if !para.text.trim().is_empty() {
                    slide.add_line(para.text, para.level);
                }
            }
        }
        slide.tables = parsed.tables;
        slide.notes = self.parse_notes(archive, slide_path)?;

        Ok(slide)
    }

    /// Notes text of the notes slide linked from `slide_path`, if any.
    fn parse_notes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<String>> {
        let (dir, file) = slide_path.rsplit_once('/').unwrap_or(("", slide_path));
        let rels_path = format!("{}/_rels/{}.rels", dir, file);
        if archive.by_name(&rels_path).is_err() {
            return Ok(None);
        }

        let rels = self.read_relationships(archive, &rels_path)?;
        let Some(notes_rel) = rels.iter().find(|r| r.kind.ends_with("/notesSlide")) else {
            return Ok(None);
        };
        let notes_path = resolve_target(dir, &notes_rel.target);
        let content = self.read_file_from_archive(archive, &notes_path)?;

        let lines: Vec<String> = parse_shapes(&content)
            .shapes
            .into_iter()
            .filter(|s| s.placeholder.as_deref() == Some("body"))
            .flat_map(|s| s.paragraphs.into_iter().map(|p| p.text))
            .filter(|t| !t.trim().is_empty())
            .collect();

        Ok((!lines.is_empty()).then(|| lines.join("\n")))
    }

    /// Read the `Relationship` entries of a `.rels` part.
    fn read_relationships<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<RelEntry>> {
        let content = self.read_file_from_archive(archive, path)?;
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);
        let mut rels = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    rels.push(RelEntry {
                        id: attribute(e, b"Id").unwrap_or_default(),
                        kind: attribute(e, b"Type").unwrap_or_default(),
                        target: attribute(e, b"Target").unwrap_or_default(),
                    });
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships in '{}': {}",
                        path, e
                    )));
                }
                _ => {}
            }
        }

        Ok(rels)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct RelEntry {
    id: String,
    kind: String,
    target: String,
}

/// Text of one shape, by paragraph.
#[derive(Debug, Default)]
struct ShapeText {
    /// Placeholder type; `idx`-only placeholders report `obj`.
    placeholder: Option<String>,
    paragraphs: Vec<SlideText>,
}

impl ShapeText {
    fn is_title(&self) -> bool {
        matches!(self.placeholder.as_deref(), Some("title") | Some("ctrTitle"))
    }
}

#[derive(Debug, Default)]
struct ParsedShapes {
    shapes: Vec<ShapeText>,
    tables: Vec<Vec<Vec<String>>>,
}

/// Walk a slide or notes part, collecting shape paragraphs and tables.
fn parse_shapes(xml_content: &str) -> ParsedShapes {
    let mut parsed = ParsedShapes::default();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut shape: Option<ShapeText> = None;
    let mut paragraph: Option<SlideText> = None;
    let mut in_run_text = false;
    let mut table: Option<Vec<Vec<String>>> = None;
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => shape = Some(ShapeText::default()),
                b"ph" => set_placeholder(&mut shape, e),
                b"p" => paragraph = Some(SlideText::new("", 0)),
                b"pPr" => set_level(&mut paragraph, e),
                b"t" => in_run_text = true,
                b"br" => push_text(&mut paragraph, "\n"),
                b"tbl" => table = Some(Vec::new()),
                b"tr" => row = Some(Vec::new()),
                b"tc" => cell = Some(String::new()),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" => set_placeholder(&mut shape, e),
                b"pPr" => set_level(&mut paragraph, e),
                b"br" => push_text(&mut paragraph, "\n"),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_run_text => {
                let text = e.unescape().unwrap_or_default();
                push_text(&mut paragraph, &text);
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_run_text = false,
                b"p" => {
                    if let Some(para) = paragraph.take() {
                        if let Some(cell) = cell.as_mut() {
                            if !cell.is_empty() {
                                cell.push('\n');
                            }
                            cell.push_str(&para.text);
                        } else if let Some(shape) = shape.as_mut() {
                            shape.paragraphs.push(para);
                        }
                    }
                }
                b"tc" => {
                    if let (Some(row), Some(text)) = (row.as_mut(), cell.take()) {
                        row.push(text.trim().to_string());
                    }
                }
                b"tr" => {
                    if let (Some(table), Some(cells)) = (table.as_mut(), row.take()) {
                        table.push(cells);
                    }
                }
                b"tbl" => {
                    if let Some(rows) = table.take() {
                        parsed.tables.push(rows);
                    }
                }
                b"sp" => {
                    if let Some(done) = shape.take() {
                        parsed.shapes.push(done);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (stopping at this part): {}", e);
                break;
            }
            _ => {}
        }
    }

    parsed
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn set_placeholder(shape: &mut Option<ShapeText>, e: &BytesStart<'_>) {
    if let Some(shape) = shape.as_mut() {
        shape.placeholder = Some(attribute(e, b"type").unwrap_or_else(|| "obj".to_string()));
    }
}

fn set_level(paragraph: &mut Option<SlideText>, e: &BytesStart<'_>) {
    if let Some(para) = paragraph.as_mut() {
        if let Some(level) = attribute(e, b"lvl").and_then(|v| v.parse().ok()) {
            para.level = level;
        }
    }
}

fn push_text(paragraph: &mut Option<SlideText>, text: &str) {
    if let Some(para) = paragraph.as_mut() {
        para.text.push_str(text);
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for part in target.split('/') {
        match part {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    // Remove common extensions first
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    // Try to find digits at the end
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
