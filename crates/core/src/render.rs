//! Per-kind rendering of content nodes into a slide body.
//!
//! Every function appends to a [`BodyRegion`] and never removes from it.
//! Failures are reported as [`crate::Error::RenderError`] for the caller to
//! log and skip; nothing here aborts a whole slide.

use crate::config::GeneratorConfig;
use crate::deck::{Block, BodyRegion, Bullet, TableBlock, TextLine};
use crate::error::Result;
use crate::style::{resolve_font, FontRole, FontSpec};
use crate::text::{exceeds_chars, is_bullet_like, truncate_chars};
use crate::types::{ContentKind, ContentNode, ListBlock, TableCell};

/// Appends one content node to a slide body.
pub trait NodeRenderer {
    fn render_node(&self, body: &mut BodyRegion, node: &ContentNode) -> Result<()>;
}

/// Renders content nodes onto slide bodies.
#[derive(Debug, Clone)]
pub struct SlideRenderer<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> SlideRenderer<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Depth-first list walk; levels stop growing at the configured cap.
    pub fn render_list(&self, body: &mut BodyRegion, list: &ListBlock, level: u8) {
        let shown_level = level.min(self.config.max_list_level);
        for item in &list.items {
            let text = item.text.trim();
            if !text.is_empty() {
                let mut line = TextLine::new(text, shown_level);
                line.font = self.font(FontRole::Default, text);
                line.tight = true;
                body.push(Block::Text(line));
            }
            for nested in &item.nested {
                self.render_list(body, nested, level.saturating_add(1));
            }
        }
    }

    /// Pad rows to a rectangle and append a table.
    ///
    /// The column count comes from rows that have cells; every row, empty
    /// ones included, is padded to it. A table without rows or columns is
    /// skipped.
    pub fn render_table(&self, body: &mut BodyRegion, rows: &[Vec<TableCell>]) {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || columns == 0 {
            log::debug!("Empty table skipped");
            return;
        }

        let max = self.config.max_cell_length;
        let rows = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<TableCell> = row
                    .iter()
                    .map(|cell| TableCell {
                        text: truncate_chars(&cell.text, max).to_string(),
                        header: cell.header,
                    })
                    .collect();
                cells.resize_with(columns, || TableCell::data(""));
                cells
            })
            .collect();

        body.push(Block::Table(TableBlock { columns, rows }));
    }

    /// Append a code block in the code font with no bullet.
    pub fn render_code(&self, body: &mut BodyRegion, text: &str) {
        let text = truncate_chars(text, self.config.max_slide_content_length);
        if text.trim().is_empty() {
            return;
        }
        let mut line = TextLine::new(text, 0);
        line.font = self.font(FontRole::Code, text);
        line.bullet = Bullet::None;
        body.push(Block::Text(line));
    }

    /// Append one line per non-empty paragraph line; bullet-like lines
    /// are indented one level.
    pub fn render_paragraph(&self, body: &mut BodyRegion, text: &str) {
        if !self.fits(text) {
            return;
        }
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let level = if is_bullet_like(line) { 1 } else { 0 };
            let mut rendered = TextLine::new(line, level);
            rendered.font = self.font(FontRole::Default, line);
            body.push(Block::Text(rendered));
        }
    }

    /// Append a quote as one italic, quoted line.
    pub fn render_quote(&self, body: &mut BodyRegion, text: &str) {
        if !self.fits(text) {
            return;
        }
        let quoted = format!("\"{}\"", text.trim());
        let mut line = TextLine::new(quoted, 0);
        line.font = self.font(FontRole::Default, text);
        line.italic = true;
        body.push(Block::Text(line));
    }

    fn fits(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        if exceeds_chars(text, self.config.max_slide_content_length) {
            log::debug!(
                "Skipping text over {} characters",
                self.config.max_slide_content_length
            );
            return false;
        }
        true
    }

    /// Font for a run, or `None` to inherit the placeholder's font.
    fn font(&self, role: FontRole, text: &str) -> Option<FontSpec> {
        match resolve_font(role, text, &self.config.fonts) {
            Ok(spec) => Some(spec),
            Err(e) => {
                log::warn!("No usable font ({}), inheriting placeholder font", e);
                None
            }
        }
    }
}

impl NodeRenderer for SlideRenderer<'_> {
    /// Append `node` to `body`.
    ///
    /// Notes and heading nodes are not body content and render nothing.
    fn render_node(&self, body: &mut BodyRegion, node: &ContentNode) -> Result<()> {
        match &node.kind {
            ContentKind::List(list) => {
                self.render_list(body, list, 0);
                Ok(())
            }
            ContentKind::Table { rows } => {
                self.render_table(body, rows);
                Ok(())
            }
            ContentKind::Code { text } => {
                self.render_code(body, text);
                Ok(())
            }
            ContentKind::Paragraph { text } => {
                self.render_paragraph(body, text);
                Ok(())
            }
            ContentKind::Quote { text } => {
                self.render_quote(body, text);
                Ok(())
            }
            ContentKind::Image { src, .. } => {
                log::debug!("Image '{}' has no slide rendering, skipped", src);
                Ok(())
            }
            ContentKind::Heading { text, .. } => {
                log::debug!("Heading '{}' inside a slide body ignored", text);
                Ok(())
            }
            ContentKind::Notes { .. } => Ok(()),
        }
    }
}
