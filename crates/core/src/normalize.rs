//! Flattening of the content tree into an ordered stream of content nodes.
//!
//! Block elements that carry their own text (headings, paragraphs, lists,
//! tables, code, quotes) are captured as a unit and never descended into, so
//! a bullet's inline text cannot resurface as a free-floating paragraph.
//! Generic containers are transparent; text sitting directly in them becomes
//! a paragraph. Runs of single-line `cm-line` fragments coalesce into one code
//! block. Text carrying a `speaker notes:` marker is split into body and a
//! notes node.

use crate::notes::split_notes;
use crate::text::normalize_block_text;
use crate::tree::{ContentTree, Element, ElementKind, NodeId, TreeNode};
use crate::types::{ContentKind, ContentNode, ListBlock, ListItem, ListKind, TableCell};
use std::collections::HashSet;

/// Class marking a raw code-line fragment (one line of an editor view).
pub const CODE_LINE_CLASS: &str = "cm-line";

/// Turns a content tree into an ordered, deduplicated node sequence.
#[derive(Debug, Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Flatten `tree` into content nodes in document order.
    pub fn normalize(&self, tree: &ContentTree) -> Vec<ContentNode> {
        let mut walk = Walk::default();
        walk.visit_children(tree.root());
        walk.flush_code_lines();
        log::debug!(
            "Normalized {} tree elements into {} content nodes",
            tree.len(),
            walk.out.len()
        );
        walk.out
    }
}

#[derive(Debug, Default)]
struct Walk {
    out: Vec<ContentNode>,
    code_lines: Vec<String>,
    code_source: Option<NodeId>,
    captured: HashSet<NodeId>,
}

impl Walk {
    fn emit(&mut self, source: NodeId, kind: ContentKind) {
        self.flush_code_lines();
        self.out.push(ContentNode::new(source, kind));
    }

    fn flush_code_lines(&mut self) {
        if self.code_lines.is_empty() {
            return;
        }
        let text = self.code_lines.join("\n");
        self.code_lines.clear();
        let source = self.code_source.take().unwrap_or_default();
        self.out.push(ContentNode::new(source, ContentKind::Code { text }));
    }

    /// Mark an element as captured; false if it already was.
    fn capture(&mut self, el: &Element) -> bool {
        if self.captured.insert(el.id) {
            true
        } else {
            log::debug!("Skipping already captured <{}> #{}", el.name, el.id);
            false
        }
    }

    /// Emit `text` through `make`, splitting off speaker notes first.
    fn emit_split(&mut self, source: NodeId, text: &str, make: impl FnOnce(String) -> ContentKind) {
        match split_notes(text) {
            Some(split) => {
                if !split.body.is_empty() {
                    self.emit(source, make(split.body));
                }
                if !split.notes.is_empty() {
                    self.emit(source, ContentKind::Notes { text: split.notes });
                }
            }
            None if !text.is_empty() => self.emit(source, make(text.to_string())),
            None => {}
        }
    }

    fn visit_children(&mut self, el: &Element) {
        let mut loose = String::new();
        for child in &el.children {
            match child {
                TreeNode::Text(t) => loose.push_str(t),
                TreeNode::Element(e) if e.kind() == ElementKind::LineBreak => loose.push('\n'),
                TreeNode::Element(e)
                    if e.kind() == ElementKind::Inline && !e.has_class(CODE_LINE_CLASS) =>
                {
                    loose.push_str(&e.raw_text());
                }
                TreeNode::Element(e) => {
                    self.flush_loose(el.id, &mut loose);
                    self.visit(e);
                }
            }
        }
        self.flush_loose(el.id, &mut loose);
    }

    fn flush_loose(&mut self, source: NodeId, loose: &mut String) {
        let text = normalize_block_text(loose);
        loose.clear();
        self.emit_split(source, &text, |text| ContentKind::Paragraph { text });
    }

    fn visit(&mut self, el: &Element) {
        if el.has_class(CODE_LINE_CLASS) {
            self.visit_code_line(el);
            return;
        }

        match el.kind() {
            ElementKind::Heading(level) => {
                if self.capture(el) {
                    let text = el.inline_text();
                    self.emit_split(el.id, &text, |text| ContentKind::Heading { level, text });
                }
            }
            ElementKind::Paragraph => {
                if self.capture(el) {
                    let text = el.block_text();
                    self.emit_split(el.id, &text, |text| ContentKind::Paragraph { text });
                    self.visit_images(el);
                }
            }
            ElementKind::Blockquote => {
                if self.capture(el) {
                    let text = el.block_text();
                    self.emit_split(el.id, &text, |text| ContentKind::Quote { text });
                }
            }
            ElementKind::UnorderedList | ElementKind::OrderedList => {
                if self.capture(el) {
                    let mut notes = Vec::new();
                    let list = self.list_block(el, &mut notes);
                    self.emit_list(el.id, list, notes);
                }
            }
            ElementKind::ListItem => {
                // A stray item outside any list is treated as a one-item list.
                if self.capture(el) {
                    let mut notes = Vec::new();
                    let item = self.list_item(el, &mut notes);
                    let list = ListBlock {
                        kind: ListKind::Unordered,
                        items: vec![item],
                    };
                    self.emit_list(el.id, list, notes);
                }
            }
            ElementKind::Table => {
                if self.capture(el) {
                    let rows = table_rows(el);
                    self.emit(el.id, ContentKind::Table { rows });
                }
            }
            ElementKind::Preformatted => {
                if self.capture(el) {
                    let raw = el.raw_text();
                    let text = raw.trim_start_matches(['\n', '\r']).trim_end();
                    if !text.is_empty() {
                        self.emit(el.id, ContentKind::Code { text: text.to_string() });
                    }
                }
            }
            ElementKind::Code => {
                if self.capture(el) {
                    let raw = el.raw_text();
                    let text = raw.trim();
                    if !text.is_empty() {
                        self.emit(el.id, ContentKind::Code { text: text.to_string() });
                    }
                }
            }
            ElementKind::Image => {
                if self.capture(el) {
                    self.emit(el.id, image_kind(el));
                }
            }
            ElementKind::LineBreak | ElementKind::Ignored => {}
            ElementKind::Container
            | ElementKind::Inline
            | ElementKind::TableRow
            | ElementKind::HeaderCell
            | ElementKind::DataCell => self.visit_children(el),
        }
    }

    fn visit_code_line(&mut self, el: &Element) {
        if !self.capture(el) {
            return;
        }
        let raw = el.raw_text();
        let line = raw.trim_end();
        match split_notes(line) {
            Some(split) => {
                if !split.body.is_empty() {
                    self.push_code_line(el.id, split.body);
                }
                if !split.notes.is_empty() {
                    self.emit(el.id, ContentKind::Notes { text: split.notes });
                }
            }
            None if !line.trim().is_empty() => self.push_code_line(el.id, line.to_string()),
            None => {}
        }
    }

    fn push_code_line(&mut self, source: NodeId, line: String) {
        self.code_source.get_or_insert(source);
        self.code_lines.push(line);
    }

    fn visit_images(&mut self, el: &Element) {
        let mut images = Vec::new();
        el.find_all(&|e: &Element| e.kind() == ElementKind::Image, &mut images);
        for img in images {
            if self.capture(img) {
                self.emit(img.id, image_kind(img));
            }
        }
    }

    fn emit_list(&mut self, source: NodeId, list: ListBlock, notes: Vec<String>) {
        if !list.items.is_empty() {
            self.emit(source, ContentKind::List(list));
        }
        for text in notes {
            self.emit(source, ContentKind::Notes { text });
        }
    }

    fn list_block(&mut self, el: &Element, notes: &mut Vec<String>) -> ListBlock {
        let kind = if el.kind() == ElementKind::OrderedList {
            ListKind::Ordered
        } else {
            ListKind::Unordered
        };
        let mut items: Vec<ListItem> = Vec::new();
        for child in el.child_elements() {
            match child.kind() {
                ElementKind::ListItem => {
                    self.captured.insert(child.id);
                    items.push(self.list_item(child, notes));
                }
                k if k.is_list() => {
                    // A list nested without an enclosing item hangs off the previous item.
                    self.captured.insert(child.id);
                    let nested = self.list_block(child, notes);
                    match items.last_mut() {
                        Some(last) => last.nested.push(nested),
                        None => items.push(ListItem {
                            text: String::new(),
                            nested: vec![nested],
                        }),
                    }
                }
                _ => {}
            }
        }
        ListBlock { kind, items }
    }

    fn list_item(&mut self, li: &Element, notes: &mut Vec<String>) -> ListItem {
        let mut text = li.own_text();
        if let Some(split) = split_notes(&text) {
            if !split.notes.is_empty() {
                notes.push(split.notes);
            }
            text = split.body;
        }

        let mut lists = Vec::new();
        li.find_all(&|e: &Element| e.kind().is_list(), &mut lists);
        let nested = lists
            .into_iter()
            .map(|list| {
                self.captured.insert(list.id);
                self.list_block(list, notes)
            })
            .collect();

        ListItem { text, nested }
    }
}

fn image_kind(el: &Element) -> ContentKind {
    ContentKind::Image {
        src: el.attr("src").unwrap_or_default().to_string(),
        alt: el.attr("alt").unwrap_or_default().to_string(),
    }
}

/// Rows of a table, without descending into nested tables.
fn table_rows(table: &Element) -> Vec<Vec<TableCell>> {
    let mut found = Vec::new();
    table.find_all(
        &|e: &Element| matches!(e.kind(), ElementKind::TableRow | ElementKind::Table),
        &mut found,
    );
    found
        .into_iter()
        .filter(|e| e.kind() == ElementKind::TableRow)
        .map(|tr| {
            tr.child_elements()
                .filter_map(|cell| match cell.kind() {
                    ElementKind::HeaderCell => Some(TableCell::header(cell.inline_text())),
                    ElementKind::DataCell => Some(TableCell::data(cell.inline_text())),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(root: Element) -> Vec<ContentNode> {
        Normalizer::new().normalize(&ContentTree::new(root))
    }

    fn kinds(nodes: &[ContentNode]) -> Vec<&'static str> {
        nodes.iter().map(|n| n.kind.label()).collect()
    }

    fn li(text: &str) -> Element {
        Element::new("li").with_text(text)
    }

    #[test]
    fn test_list_paragraphs_are_not_duplicated() {
        let nodes = normalize(
            Element::new("body").with_child(
                Element::new("ul")
                    .with_child(Element::new("li").with_child(Element::new("p").with_text("Use flux")))
                    .with_child(li("Tin the tip")),
            ),
        );
        assert_eq!(kinds(&nodes), vec!["list"]);
        let ContentKind::List(list) = &nodes[0].kind else {
            panic!("expected list");
        };
        let texts: Vec<&str> = list.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Use flux", "Tin the tip"]);
    }

    #[test]
    fn test_nested_lists_stay_inside_parent() {
        let nodes = normalize(
            Element::new("body").with_child(
                Element::new("ul").with_child(
                    Element::new("li")
                        .with_text("Parent")
                        .with_child(Element::new("ol").with_child(li("Child"))),
                ),
            ),
        );
        assert_eq!(nodes.len(), 1);
        let ContentKind::List(list) = &nodes[0].kind else {
            panic!("expected list");
        };
        assert_eq!(list.items[0].text, "Parent");
        assert_eq!(list.items[0].nested[0].kind, ListKind::Ordered);
        assert_eq!(list.items[0].nested[0].items[0].text, "Child");
    }

    #[test]
    fn test_code_lines_coalesce_until_other_content() {
        let nodes = normalize(
            Element::new("div")
                .with_child(Element::new("div").with_class("cm-line").with_text("fn main() {"))
                .with_child(Element::new("div").with_class("cm-line").with_text("    run();"))
                .with_child(Element::new("div").with_class("cm-line").with_text("}"))
                .with_child(Element::new("p").with_text("After"))
                .with_child(Element::new("div").with_class("cm-line").with_text("tail")),
        );
        assert_eq!(kinds(&nodes), vec!["code", "paragraph", "code"]);
        assert_eq!(nodes[0].text(), Some("fn main() {\n    run();\n}"));
        assert_eq!(nodes[2].text(), Some("tail"));
    }

    #[test]
    fn test_paragraph_with_notes_is_split() {
        let nodes = normalize(
            Element::new("body")
                .with_child(Element::new("p").with_text("Body text speaker notes: Say hello")),
        );
        assert_eq!(kinds(&nodes), vec!["paragraph", "notes"]);
        assert_eq!(nodes[0].text(), Some("Body text"));
        assert_eq!(nodes[1].text(), Some("Say hello"));
    }

    #[test]
    fn test_marker_only_paragraph_yields_only_notes() {
        let nodes = normalize(
            Element::new("body").with_child(
                Element::new("p")
                    .with_child(Element::new("strong").with_text("Speaker Notes:"))
                    .with_text(" Remember PPE"),
            ),
        );
        assert_eq!(kinds(&nodes), vec!["notes"]);
        assert_eq!(nodes[0].text(), Some("Remember PPE"));
    }

    #[test]
    fn test_list_item_notes_follow_the_list() {
        let nodes = normalize(
            Element::new("body").with_child(
                Element::new("ul")
                    .with_child(li("Point"))
                    .with_child(li("speaker notes: Explain the point")),
            ),
        );
        assert_eq!(kinds(&nodes), vec!["list", "notes"]);
        let ContentKind::List(list) = &nodes[0].kind else {
            panic!("expected list");
        };
        assert_eq!(list.items[1].text, "");
        assert_eq!(nodes[1].text(), Some("Explain the point"));
    }

    #[test]
    fn test_table_rows_and_header_cells() {
        let nodes = normalize(
            Element::new("body").with_child(
                Element::new("table")
                    .with_child(
                        Element::new("thead").with_child(
                            Element::new("tr")
                                .with_child(Element::new("th").with_text("Tool"))
                                .with_child(Element::new("th").with_text("Use")),
                        ),
                    )
                    .with_child(
                        Element::new("tbody").with_child(
                            Element::new("tr").with_child(Element::new("td").with_text("Iron")),
                        ),
                    ),
            ),
        );
        let ContentKind::Table { rows } = &nodes[0].kind else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 2);
        assert!(rows[0].iter().all(|c| c.header));
        assert_eq!(rows[1], vec![TableCell::data("Iron")]);
    }

    #[test]
    fn test_empty_table_row_kept() {
        let nodes = normalize(
            Element::new("body").with_child(
                Element::new("table")
                    .with_child(
                        Element::new("tr")
                            .with_child(Element::new("th").with_text("A"))
                            .with_child(Element::new("th").with_text("B")),
                    )
                    .with_child(Element::new("tr"))
                    .with_child(
                        Element::new("tr")
                            .with_child(Element::new("td").with_text("1"))
                            .with_child(Element::new("td").with_text("2")),
                    ),
            ),
        );
        let ContentKind::Table { rows } = &nodes[0].kind else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], vec![TableCell::data("1"), TableCell::data("2")]);
    }

    #[test]
    fn test_notes_line_splits_code_run() {
        let nodes = normalize(
            Element::new("div")
                .with_child(Element::new("div").with_class("cm-line").with_text("let a = 1;"))
                .with_child(
                    Element::new("div")
                        .with_class("cm-line")
                        .with_text("speaker notes: Mention scope"),
                )
                .with_child(Element::new("div").with_class("cm-line").with_text("let b = 2;")),
        );
        assert_eq!(kinds(&nodes), vec!["code", "notes", "code"]);
        assert_eq!(nodes[0].text(), Some("let a = 1;"));
        assert_eq!(nodes[1].text(), Some("Mention scope"));
        assert_eq!(nodes[2].text(), Some("let b = 2;"));
    }

    #[test]
    fn test_code_line_with_trailing_notes_keeps_code() {
        let nodes = normalize(
            Element::new("div")
                .with_child(Element::new("div").with_class("cm-line").with_text("fn main() {}"))
                .with_child(
                    Element::new("div")
                        .with_class("cm-line")
                        .with_text("run(); speaker notes: Point at run"),
                ),
        );
        assert_eq!(kinds(&nodes), vec!["code", "notes"]);
        assert_eq!(nodes[0].text(), Some("fn main() {}\nrun();"));
        assert_eq!(nodes[1].text(), Some("Point at run"));
    }

    #[test]
    fn test_loose_container_text_becomes_paragraph() {
        let nodes = normalize(
            Element::new("div")
                .with_text("Loose ")
                .with_child(Element::new("span").with_text("text"))
                .with_child(Element::new("h2").with_text("Slide 2: Next")),
        );
        assert_eq!(kinds(&nodes), vec!["paragraph", "heading"]);
        assert_eq!(nodes[0].text(), Some("Loose text"));
    }

    #[test]
    fn test_pre_and_standalone_code() {
        let nodes = normalize(
            Element::new("body")
                .with_child(
                    Element::new("pre").with_child(Element::new("code").with_text("line1\nline2\n")),
                )
                .with_child(Element::new("code").with_text(" inline ")),
        );
        assert_eq!(kinds(&nodes), vec!["code", "code"]);
        assert_eq!(nodes[0].text(), Some("line1\nline2"));
        assert_eq!(nodes[1].text(), Some("inline"));
    }

    #[test]
    fn test_each_source_captured_once() {
        let nodes = normalize(
            Element::new("body")
                .with_child(Element::new("h1").with_text("Title"))
                .with_child(Element::new("p").with_text("One"))
                .with_child(Element::new("blockquote").with_child(Element::new("p").with_text("Quote"))),
        );
        assert_eq!(kinds(&nodes), vec!["heading", "paragraph", "quote"]);
        let mut sources: Vec<NodeId> = nodes.iter().map(|n| n.source).collect();
        sources.dedup();
        assert_eq!(sources.len(), 3);
    }

    #[test]
    fn test_images_in_paragraphs() {
        let nodes = normalize(
            Element::new("body").with_child(
                Element::new("p").with_child(
                    Element::new("img")
                        .with_attr("src", "board.png")
                        .with_attr("alt", "Board"),
                ),
            ),
        );
        assert_eq!(
            nodes[0].kind,
            ContentKind::Image {
                src: "board.png".into(),
                alt: "Board".into()
            }
        );
    }
}
