//! Markdown input: render generated markdown into the content tree.
//!
//! Uses `pulldown-cmark` with pipe tables enabled and rebuilds the element
//! shape an HTML renderer would produce (`h1`, `p`, `ul > li`, `table > tr >
//! th|td`, `pre > code`, `blockquote`, `img`, ...).

use crate::tree::{ContentTree, Element};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Parse markdown into a content tree rooted at `body`.
pub fn parse_markdown(text: &str) -> ContentTree {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(text, Options::ENABLE_TABLES) {
        builder.handle(event);
    }
    ContentTree::new(builder.finish())
}

/// Parse markdown table rows.
///
/// A line is a row when it starts with `|` and is not made only of
/// separator characters (`|`, `-`, space, `:`). Cells come from splitting on
/// `|` after removing one leading and one trailing pipe.
pub fn parse_markdown_table<S: AsRef<str>>(lines: &[S]) -> Vec<Vec<String>> {
    lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| is_table_row(line))
        .map(|line| {
            let inner = line.strip_prefix('|').unwrap_or(line);
            let inner = inner.strip_suffix('|').unwrap_or(inner);
            inner.split('|').map(|cell| cell.trim().to_string()).collect()
        })
        .collect()
}

fn is_table_row(line: &str) -> bool {
    line.starts_with('|') && !line.chars().all(|c| matches!(c, '|' | '-' | ' ' | ':'))
}

/// Whether every non-empty line of a paragraph is a pipe-table line.
fn looks_like_pipe_table(text: &str) -> bool {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();
    lines.peek().is_some() && lines.all(|l| l.starts_with('|'))
}

fn table_from_rows(rows: Vec<Vec<String>>) -> Element {
    let mut table = Element::new("table");
    for row in rows {
        let mut tr = Element::new("tr");
        for cell in row {
            tr.push_child(Element::new("td").with_text(cell));
        }
        table.push_child(tr);
    }
    table
}

fn heading_rank(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Stack-based assembly of elements from parser events.
struct TreeBuilder {
    stack: Vec<Element>,
    in_table_head: bool,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Element::new("body")],
            in_table_head: false,
        }
    }

    fn top(&mut self) -> &mut Element {
        // The root `body` is never popped.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let code = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                        Element::new("code").with_class(format!("language-{}", lang))
                    }
                    _ => Element::new("code"),
                };
                self.stack.push(Element::new("pre"));
                self.stack.push(code);
            }
            Event::End(TagEnd::CodeBlock) => {
                self.close();
                self.close();
            }
            Event::Start(tag) => {
                let element = self.element_for(tag);
                self.stack.push(element);
            }
            Event::End(_) => self.close(),
            Event::Text(text) => self.top().push_text(&text),
            Event::Code(code) => {
                let code = Element::new("code").with_text(code.to_string());
                self.top().push_child(code);
            }
            Event::SoftBreak => self.top().push_text("\n"),
            Event::HardBreak => self.top().push_child(Element::new("br")),
            Event::TaskListMarker(checked) => {
                self.top().push_text(if checked { "[x] " } else { "[ ] " })
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                log::debug!("Ignoring raw HTML in markdown: {}", html.trim());
            }
            _ => {}
        }
    }

    fn element_for(&mut self, tag: Tag<'_>) -> Element {
        match tag {
            Tag::Paragraph => Element::new("p"),
            Tag::Heading { level, .. } => Element::new(format!("h{}", heading_rank(level))),
            Tag::BlockQuote(_) => Element::new("blockquote"),
            Tag::List(Some(start)) => Element::new("ol").with_attr("start", start.to_string()),
            Tag::List(None) => Element::new("ul"),
            Tag::Item => Element::new("li"),
            Tag::Table(_) => Element::new("table"),
            Tag::TableHead => {
                self.in_table_head = true;
                Element::new("tr")
            }
            Tag::TableRow => Element::new("tr"),
            Tag::TableCell => Element::new(if self.in_table_head { "th" } else { "td" }),
            Tag::Emphasis => Element::new("em"),
            Tag::Strong => Element::new("strong"),
            Tag::Strikethrough => Element::new("del"),
            Tag::Link { dest_url, .. } => Element::new("a").with_attr("href", dest_url.to_string()),
            Tag::Image { dest_url, .. } => Element::new("img").with_attr("src", dest_url.to_string()),
            _ => Element::new("div"),
        }
    }

    fn close(&mut self) {
        if self.stack.len() <= 1 {
            log::warn!("Unbalanced markdown end event ignored");
            return;
        }
        let Some(mut element) = self.stack.pop() else {
            return;
        };

        match element.name.as_str() {
            "p" => {
                let text = element.raw_text();
                if looks_like_pipe_table(&text) {
                    let lines: Vec<&str> = text.lines().collect();
                    let rows = parse_markdown_table(&lines);
                    if !rows.is_empty() {
                        log::debug!("Recovered a {}-row pipe table from paragraph text", rows.len());
                        element = table_from_rows(rows);
                    }
                }
            }
            "img" => {
                let alt = element.raw_text();
                element.children.clear();
                element = element.with_attr("alt", alt);
            }
            "tr" if self.in_table_head => self.in_table_head = false,
            _ => {}
        }

        self.top().push_child(element);
    }

    fn finish(mut self) -> Element {
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack.pop().unwrap_or_else(|| Element::new("body"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;
    use crate::tree::ElementKind;
    use crate::types::ContentKind;

    fn names(tree: &ContentTree) -> Vec<String> {
        tree.root().child_elements().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_parse_markdown_table_rows() {
        let rows = parse_markdown_table(&[
            "| Tool | Use |",
            "|:-----|----:|",
            "| Iron | Heat |",
            "not a row",
            "|a|b|c|",
        ]);
        assert_eq!(
            rows,
            vec![
                vec!["Tool".to_string(), "Use".to_string()],
                vec!["Iron".to_string(), "Heat".to_string()],
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_markdown_table_trims_single_pipe() {
        let rows = parse_markdown_table(&["||x||"]);
        assert_eq!(rows, vec![vec!["".to_string(), "x".to_string(), "".to_string()]]);
    }

    #[test]
    fn test_slide_markdown_structure() {
        let tree = parse_markdown(
            "# Slide 1: Intro to Soldering\n\n- Use flux\n- Tin the tip\n\nspeaker notes: Remember PPE\n",
        );
        assert_eq!(names(&tree), vec!["h1", "ul", "p"]);
        let ul = tree.root().child_elements().nth(1).unwrap();
        let items: Vec<String> = ul.child_elements().map(|li| li.own_text()).collect();
        assert_eq!(items, vec!["Use flux", "Tin the tip"]);
    }

    #[test]
    fn test_tables_get_header_cells() {
        let tree = parse_markdown("| A | B |\n|---|---|\n| 1 | 2 |\n");
        let table = tree.root().child_elements().next().unwrap();
        assert_eq!(table.kind(), ElementKind::Table);
        let mut cells = Vec::new();
        table.find_all(
            &|e: &Element| matches!(e.kind(), ElementKind::HeaderCell | ElementKind::DataCell),
            &mut cells,
        );
        let kinds: Vec<ElementKind> = cells.iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::HeaderCell,
                ElementKind::HeaderCell,
                ElementKind::DataCell,
                ElementKind::DataCell
            ]
        );
    }

    #[test]
    fn test_pipe_table_without_separator_is_recovered() {
        let tree = parse_markdown("| A | B |\n| 1 | 2 |\n");
        let first = tree.root().child_elements().next().unwrap();
        assert_eq!(first.kind(), ElementKind::Table);
    }

    #[test]
    fn test_code_block_and_image() {
        let tree = parse_markdown("```rust\nlet x = 1;\n```\n\n![Board layout](board.png)\n");
        let pre = tree.root().child_elements().next().unwrap();
        assert_eq!(pre.kind(), ElementKind::Preformatted);
        let code = pre.child_elements().next().unwrap();
        assert_eq!(code.name, "code");
        assert!(code.has_class("language-rust"));
        assert_eq!(pre.raw_text(), "let x = 1;\n");

        let p = tree.root().child_elements().nth(1).unwrap();
        let img = p.child_elements().next().unwrap();
        assert_eq!(img.attr("src"), Some("board.png"));
        assert_eq!(img.attr("alt"), Some("Board layout"));
    }

    #[test]
    fn test_lazy_notes_line_leaves_list_item() {
        let tree = parse_markdown("- Item one\nspeaker notes: Say this\n");
        let nodes = Normalizer::new().normalize(&tree);
        let kinds: Vec<&str> = nodes.iter().map(|n| n.kind.label()).collect();
        assert_eq!(kinds, vec!["list", "notes"]);
        let ContentKind::List(list) = &nodes[0].kind else {
            panic!("expected list");
        };
        assert_eq!(list.items[0].text, "Item one");
        assert_eq!(nodes[1].text(), Some("Say this"));
    }

    #[test]
    fn test_nested_list_markdown() {
        let tree = parse_markdown("- a\n  - b\n    - c\n");
        let ul = tree.root().child_elements().next().unwrap();
        let li = ul.child_elements().next().unwrap();
        assert_eq!(li.own_text(), "a");
        assert!(li.child_elements().any(|e| e.kind().is_list()));
    }
}
