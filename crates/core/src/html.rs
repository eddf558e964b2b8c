//! HTML input: load a rendered or scraped page into the content tree.

use crate::tree::{ContentTree, Element, ElementKind};
use scraper::{ElementRef, Html, Node};

/// Parse an HTML document or fragment into a content tree.
///
/// When the markup has a `body`, the tree is rooted there; otherwise the
/// whole document becomes the root. `head`, `script`, and `style` content is
/// dropped. Class lists are kept so editor code-line fragments stay
/// recognisable.
pub fn parse_html(html: &str) -> ContentTree {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let body = root
        .children()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "body");

    let element = match body {
        Some(body) => convert(body),
        None => convert(root),
    };
    ContentTree::new(element)
}

fn convert(node: ElementRef<'_>) -> Element {
    let value = node.value();
    let mut element = Element::new(value.name());
    element.classes = value.classes().map(str::to_string).collect();
    element.attrs = value
        .attrs()
        .filter(|(key, _)| *key != "class")
        .map(|(key, v)| (key.to_string(), v.to_string()))
        .collect();

    for child in node.children() {
        match child.value() {
            Node::Text(text) => element.push_text(&text.text),
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    if ElementKind::from_tag(child_ref.value().name()) == ElementKind::Ignored {
                        continue;
                    }
                    element.push_child(convert(child_ref));
                }
            }
            _ => {}
        }
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;
    use crate::types::ContentKind;

    #[test]
    fn test_parse_html_uses_body() {
        let tree = parse_html(
            "<html><head><title>x</title></head><body><h1>Slide 1: Intro</h1><p>Hi</p></body></html>",
        );
        assert_eq!(tree.root().name, "body");
        let names: Vec<&str> = tree.root().child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["h1", "p"]);
    }

    #[test]
    fn test_parse_html_keeps_classes_and_drops_scripts() {
        let tree = parse_html(
            r#"<div class="cm-content"><div class="cm-line">let a = 1;</div><script>alert(1)</script></div>"#,
        );
        let div = tree.root().child_elements().next().unwrap();
        assert!(div.has_class("cm-content"));
        let children: Vec<&Element> = div.child_elements().collect();
        assert_eq!(children.len(), 1);
        assert!(children[0].has_class("cm-line"));
    }

    #[test]
    fn test_html_code_lines_normalize_to_one_block() {
        let tree = parse_html(
            r#"<div><div class="cm-line">line one</div><div class="cm-line">line two</div><h2>Next</h2></div>"#,
        );
        let nodes = Normalizer::new().normalize(&tree);
        assert_eq!(
            nodes[0].kind,
            ContentKind::Code {
                text: "line one\nline two".into()
            }
        );
        assert_eq!(nodes[1].kind.label(), "heading");
    }

    #[test]
    fn test_html_attributes() {
        let tree = parse_html(r#"<p><img src="a.png" alt="A" class="wide"></p>"#);
        let p = tree.root().child_elements().next().unwrap();
        let img = p.child_elements().next().unwrap();
        assert_eq!(img.attr("src"), Some("a.png"));
        assert_eq!(img.attr("alt"), Some("A"));
        assert!(img.attr("class").is_none());
        assert!(img.has_class("wide"));
    }
}
