//! The in-memory slide deck produced by the builder.

use crate::notes::{format_transcript, SpeakerNote};
use crate::style::FontSpec;
use crate::types::TableCell;
use serde::{Deserialize, Serialize};

/// Bullet decoration of a body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bullet {
    /// Whatever the placeholder's list style gives the line's level.
    Inherit,
    /// Explicitly no bullet.
    None,
}

/// One paragraph of body text. `text` may contain `\n` for line breaks
/// inside the paragraph (code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub level: u8,
    pub font: Option<FontSpec>,
    pub italic: bool,
    pub bullet: Bullet,
    /// Remove paragraph spacing before and after.
    pub tight: bool,
}

impl TextLine {
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level,
            font: None,
            italic: false,
            bullet: Bullet::Inherit,
            tight: false,
        }
    }
}

/// A rectangular table padded to a uniform column count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    pub columns: usize,
    pub rows: Vec<Vec<TableCell>>,
}

/// A rendered unit of slide body content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// The empty paragraph a fresh body region starts with.
    Placeholder,
    Text(TextLine),
    Table(TableBlock),
}

/// Ordered, append-only body content of a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyRegion {
    blocks: Vec<Block>,
}

impl Default for BodyRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyRegion {
    /// A fresh region holding only the empty placeholder paragraph.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::Placeholder],
        }
    }

    /// Append a block, replacing the initial placeholder on first use.
    pub fn push(&mut self, block: Block) {
        if matches!(self.blocks.as_slice(), [Block::Placeholder]) {
            self.blocks.clear();
        }
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Text lines in order.
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Text(line) => Some(line),
            _ => None,
        })
    }

    /// Tables in order.
    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }

    /// Whether nothing but the placeholder is present.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| matches!(b, Block::Placeholder))
    }
}

/// Which layout a slide uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideKind {
    Title,
    Content,
    Fallback,
}

/// One slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub kind: SlideKind,
    pub title: String,
    /// Subtitle, for title slides.
    pub subtitle: Option<String>,
    pub body: BodyRegion,
    pub notes: Option<String>,
}

impl Slide {
    pub fn title_slide(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            kind: SlideKind::Title,
            title: title.into(),
            subtitle: Some(subtitle.into()),
            body: BodyRegion::new(),
            notes: None,
        }
    }

    pub fn content(title: impl Into<String>) -> Self {
        Self {
            kind: SlideKind::Content,
            title: title.into(),
            subtitle: None,
            body: BodyRegion::new(),
            notes: None,
        }
    }

    pub fn fallback(title: impl Into<String>, message: impl Into<String>) -> Self {
        let mut slide = Self {
            kind: SlideKind::Fallback,
            ..Self::content(title)
        };
        slide.body.push(Block::Text(TextLine::new(message, 0)));
        slide
    }

    /// Attach notes text, keeping earlier notes for the same slide.
    pub fn add_notes(&mut self, text: &str) {
        match &mut self.notes {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(text);
            }
            None => self.notes = Some(text.to_string()),
        }
    }
}

/// A complete deck ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Document title for the package properties.
    pub title: Option<String>,
    pub slides: Vec<Slide>,
    /// Deduplicated notes in the order they were recorded.
    pub notes: Vec<SpeakerNote>,
}

impl Deck {
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Number of fallback slides (zero or one).
    pub fn fallback_count(&self) -> usize {
        self.slides
            .iter()
            .filter(|s| s.kind == SlideKind::Fallback)
            .count()
    }

    /// The plain-text notes transcript.
    pub fn transcript(&self) -> String {
        format_transcript(&self.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_replaced_by_first_block() {
        let mut body = BodyRegion::new();
        assert!(body.is_empty());
        assert_eq!(body.blocks(), &[Block::Placeholder]);

        body.push(Block::Text(TextLine::new("first", 0)));
        body.push(Block::Text(TextLine::new("second", 1)));
        assert_eq!(body.blocks().len(), 2);
        assert!(!body.is_empty());
        let texts: Vec<&str> = body.lines().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_add_notes_appends() {
        let mut slide = Slide::content("Tools");
        slide.add_notes("one");
        slide.add_notes("two");
        assert_eq!(slide.notes.as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_fallback_slide_has_message() {
        let slide = Slide::fallback("No Content Found", "Empty");
        assert_eq!(slide.kind, SlideKind::Fallback);
        assert_eq!(slide.body.lines().next().unwrap().text, "Empty");
    }
}
