//! Domain types for content flowing through the pipeline and for decks read
//! back from disk.

use crate::tree::NodeId;
use serde::{Deserialize, Serialize};

/// Whether a list is numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// A list with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListBlock {
    pub kind: ListKind,
    pub items: Vec<ListItem>,
}

/// One list item: its own line of text plus any nested lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    pub nested: Vec<ListBlock>,
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    pub text: String,
    /// Marked as a header cell in the source (`th`).
    pub header: bool,
}

impl TableCell {
    pub fn data(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            header: false,
        }
    }

    pub fn header(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            header: true,
        }
    }
}

/// The classified payload of a content node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentKind {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    List(ListBlock),
    Table { rows: Vec<Vec<TableCell>> },
    Code { text: String },
    Quote { text: String },
    Image { src: String, alt: String },
    /// Speaker-notes text split off a marker.
    Notes { text: String },
}

impl ContentKind {
    /// Short name used in logs and default slide titles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Paragraph { .. } => "paragraph",
            Self::List(_) => "list",
            Self::Table { .. } => "table",
            Self::Code { .. } => "code",
            Self::Quote { .. } => "quote",
            Self::Image { .. } => "image",
            Self::Notes { .. } => "notes",
        }
    }
}

/// A typed unit of slide content extracted from the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Pre-order id of the tree element this node came from.
    pub source: NodeId,
    pub kind: ContentKind,
}

impl ContentNode {
    pub fn new(source: NodeId, kind: ContentKind) -> Self {
        Self { source, kind }
    }

    /// The node's text for single-text kinds.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ContentKind::Heading { text, .. }
            | ContentKind::Paragraph { text }
            | ContentKind::Code { text }
            | ContentKind::Quote { text }
            | ContentKind::Notes { text } => Some(text),
            ContentKind::List(_) | ContentKind::Table { .. } | ContentKind::Image { .. } => None,
        }
    }
}

/// A deck read back from a `.pptx` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDeck {
    /// Original filename (without path).
    pub filename: String,

    /// Slides in presentation order.
    pub slides: Vec<ExtractedSlide>,
}

impl ExtractedDeck {
    /// Create an empty deck for the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: ExtractedSlide) {
        self.slides.push(slide);
    }

    /// Get all body lines from all slides, flattened.
    pub fn all_lines(&self) -> Vec<&str> {
        self.slides
            .iter()
            .flat_map(|s| s.lines.iter().map(|l| l.text.as_str()))
            .collect()
    }
}

/// A single slide read back from a `.pptx` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Title placeholder text, if any.
    pub title: Option<String>,

    /// Body and subtitle paragraphs, in reading order.
    pub lines: Vec<SlideText>,

    /// Tables on the slide as rows of cell text.
    pub tables: Vec<Vec<Vec<String>>>,

    /// Speaker notes for this slide.
    pub notes: Option<String>,
}

impl ExtractedSlide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            title: None,
            lines: Vec::new(),
            tables: Vec::new(),
            notes: None,
        }
    }

    /// Add a body line at the given indent level.
    pub fn add_line(&mut self, text: impl Into<String>, level: u8) {
        self.lines.push(SlideText::new(text, level));
    }

    /// Get non-empty text lines.
    pub fn non_empty_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .filter(|s| !s.trim().is_empty())
            .collect()
    }
}

/// One paragraph of body text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideText {
    /// The paragraph text; line breaks inside the paragraph are `\n`.
    pub text: String,

    /// Indent level (0 = top).
    pub level: u8,
}

impl SlideText {
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}
