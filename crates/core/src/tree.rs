//! The hierarchical content tree that markdown and HTML inputs are loaded into.
//!
//! The tree mirrors the rendered-HTML shape of a markdown document: block
//! elements (`h1`..`h6`, `p`, `ul`, `table`, `pre`, ...) holding inline
//! elements and text. Every element gets a stable pre-order index when the
//! tree is built, which later stages use as the node's identity.

use crate::text::{collapse_whitespace, normalize_block_text};

/// Stable identity of an element: its pre-order position in the tree.
pub type NodeId = usize;

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// A nested element.
    Element(Element),
    /// A run of text.
    Text(String),
}

/// Structural classification of an element, derived from its tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `h1`..`h6`.
    Heading(u8),
    Paragraph,
    UnorderedList,
    OrderedList,
    ListItem,
    Table,
    TableRow,
    HeaderCell,
    DataCell,
    /// Preformatted block (`pre`).
    Preformatted,
    /// Inline or block `code`.
    Code,
    Blockquote,
    Image,
    LineBreak,
    /// Generic block grouping (`div`, `section`, `body`, table sections, ...).
    Container,
    /// Inline formatting (`span`, `strong`, `a`, ...).
    Inline,
    /// Content that never reaches a slide (`head`, `script`, `style`, ...).
    Ignored,
}

impl ElementKind {
    /// Classify a tag name (case-insensitive).
    pub fn from_tag(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "h1" => Self::Heading(1),
            "h2" => Self::Heading(2),
            "h3" => Self::Heading(3),
            "h4" => Self::Heading(4),
            "h5" => Self::Heading(5),
            "h6" => Self::Heading(6),
            "p" => Self::Paragraph,
            "ul" => Self::UnorderedList,
            "ol" => Self::OrderedList,
            "li" => Self::ListItem,
            "table" => Self::Table,
            "tr" => Self::TableRow,
            "th" => Self::HeaderCell,
            "td" => Self::DataCell,
            "pre" => Self::Preformatted,
            "code" => Self::Code,
            "blockquote" => Self::Blockquote,
            "img" => Self::Image,
            "br" => Self::LineBreak,
            "span" | "strong" | "b" | "em" | "i" | "a" | "u" | "s" | "del" | "mark" | "small"
            | "sub" | "sup" | "kbd" | "abbr" | "label" => Self::Inline,
            "head" | "script" | "style" | "noscript" | "template" | "title" | "meta" | "link"
            | "svg" | "button" => Self::Ignored,
            _ => Self::Container,
        }
    }

    /// Whether this element starts a new line when its text is flattened.
    fn is_block(&self) -> bool {
        !matches!(self, Self::Inline | Self::Code | Self::LineBreak | Self::Image)
    }

    /// Whether this element is an ordered or unordered list.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::UnorderedList | Self::OrderedList)
    }
}

/// One element of the content tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Pre-order index, assigned by [`ContentTree::new`].
    pub id: NodeId,
    /// Lower-case tag name.
    pub name: String,
    /// CSS classes, in source order.
    pub classes: Vec<String>,
    /// Remaining attributes.
    pub attrs: Vec<(String, String)>,
    /// Child nodes.
    pub children: Vec<TreeNode>,
}

impl Element {
    /// Create an empty element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into().to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add a CSS class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Add an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Append a text child.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(TreeNode::Text(text.into()));
        self
    }

    /// Append an element child.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(TreeNode::Element(child));
        self
    }

    /// Append an element child in place.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(TreeNode::Element(child));
    }

    /// Append text in place, merging with a trailing text node.
    pub fn push_text(&mut self, text: &str) {
        if let Some(TreeNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(TreeNode::Text(text.to_string()));
        }
    }

    /// Structural kind of this element.
    pub fn kind(&self) -> ElementKind {
        ElementKind::from_tag(&self.name)
    }

    /// Whether the element carries the given CSS class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Look up an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over element children.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            TreeNode::Element(e) => Some(e),
            TreeNode::Text(_) => None,
        })
    }

    /// Unmodified concatenation of all descendant text; `br` becomes a newline.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out, false);
        out
    }

    /// Descendant text with block boundaries as newlines and whitespace
    /// collapsed within each line.
    pub fn block_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out, true);
        normalize_block_text(&out)
    }

    /// Descendant text flattened onto a single line.
    pub fn inline_text(&self) -> String {
        collapse_whitespace(&self.raw_text())
    }

    /// Text of this element excluding nested lists, the way a list item's own
    /// line is displayed.
    pub fn own_text(&self) -> String {
        let parts: Vec<String> = self
            .children
            .iter()
            .filter_map(|child| match child {
                TreeNode::Text(t) => Some(collapse_whitespace(t)),
                TreeNode::Element(e) if e.kind().is_list() => None,
                TreeNode::Element(e) => Some(e.inline_text()),
            })
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(" ")
    }

    /// All descendant elements matching `pred`, in document order, without
    /// descending into matches.
    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if pred(child) {
                out.push(child);
            } else {
                child.find_all(pred, out);
            }
        }
    }
}

fn collect_text(el: &Element, out: &mut String, block_breaks: bool) {
    for child in &el.children {
        match child {
            TreeNode::Text(t) => out.push_str(t),
            TreeNode::Element(e) => match e.kind() {
                ElementKind::LineBreak => out.push('\n'),
                ElementKind::Ignored => {}
                kind if block_breaks && kind.is_block() => {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    collect_text(e, out, block_breaks);
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                _ => collect_text(e, out, block_breaks),
            },
        }
    }
}

/// A content tree with stable node identities.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTree {
    root: Element,
}

impl ContentTree {
    /// Wrap a root element, assigning pre-order ids to every element.
    pub fn new(mut root: Element) -> Self {
        let mut next = 0;
        assign_ids(&mut root, &mut next);
        Self { root }
    }

    /// An empty document (a bare `body`).
    pub fn empty() -> Self {
        Self::new(Element::new("body"))
    }

    /// Merge several trees into one, in order, under a fresh `body`.
    pub fn concat(trees: impl IntoIterator<Item = ContentTree>) -> Self {
        let mut root = Element::new("body");
        for tree in trees {
            root.push_child(tree.root);
        }
        Self::new(root)
    }

    /// The root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Total number of elements in the tree.
    pub fn len(&self) -> usize {
        fn count(el: &Element) -> usize {
            1 + el.child_elements().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Whether the root has no children at all.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

fn assign_ids(el: &mut Element, next: &mut NodeId) {
    el.id = *next;
    *next += 1;
    for child in &mut el.children {
        if let TreeNode::Element(e) = child {
            assign_ids(e, next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_kind_from_tag() {
        assert_eq!(ElementKind::from_tag("H2"), ElementKind::Heading(2));
        assert_eq!(ElementKind::from_tag("ul"), ElementKind::UnorderedList);
        assert_eq!(ElementKind::from_tag("strong"), ElementKind::Inline);
        assert_eq!(ElementKind::from_tag("section"), ElementKind::Container);
        assert_eq!(ElementKind::from_tag("script"), ElementKind::Ignored);
    }

    #[test]
    fn test_ids_are_preorder() {
        let tree = ContentTree::new(
            Element::new("body")
                .with_child(Element::new("h1").with_text("A"))
                .with_child(
                    Element::new("ul").with_child(Element::new("li").with_text("x")),
                )
                .with_child(Element::new("p").with_text("B")),
        );
        let root = tree.root();
        let ids: Vec<NodeId> = root.child_elements().map(|e| e.id).collect();
        assert_eq!(root.id, 0);
        assert_eq!(ids, vec![1, 2, 4]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_own_text_excludes_nested_lists() {
        let li = Element::new("li")
            .with_text("Parent ")
            .with_child(Element::new("strong").with_text("bold"))
            .with_child(Element::new("ul").with_child(Element::new("li").with_text("child")));
        assert_eq!(li.own_text(), "Parent bold");
    }

    #[test]
    fn test_block_text_breaks_between_blocks() {
        let quote = Element::new("blockquote")
            .with_child(Element::new("p").with_text("first   line"))
            .with_child(Element::new("p").with_text("second"));
        assert_eq!(quote.block_text(), "first line\nsecond");
    }

    #[test]
    fn test_raw_text_keeps_line_breaks() {
        let p = Element::new("p")
            .with_text("a")
            .with_child(Element::new("br"))
            .with_text("b");
        assert_eq!(p.raw_text(), "a\nb");
        assert_eq!(p.inline_text(), "a b");
    }

    #[test]
    fn test_concat_renumbers() {
        let a = ContentTree::new(Element::new("body").with_child(Element::new("p").with_text("a")));
        let b = ContentTree::new(Element::new("body").with_child(Element::new("p").with_text("b")));
        let merged = ContentTree::concat([a, b]);
        assert_eq!(merged.len(), 5);
        let mut paragraphs = Vec::new();
        merged
            .root()
            .find_all(&|e: &Element| e.kind() == ElementKind::Paragraph, &mut paragraphs);
        assert_eq!(paragraphs.len(), 2);
        assert_ne!(paragraphs[0].id, paragraphs[1].id);
    }
}
