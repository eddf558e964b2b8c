//! Partitioning of the content stream into slides.
//!
//! A title slide is lifted out of the stream first: the first title-level
//! heading or paragraph, the first subheading after it, and the first notes
//! node, each removed from the stream once taken. The remainder is grouped so
//! that every heading opens a slide and other content joins the open slide,
//! or a default-titled one when none is open.

use crate::text::{clean_title, strip_slide_prefix, strip_subtitle_prefix};
use crate::types::{ContentKind, ContentNode};

/// Parts of the synthesized title slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleParts {
    /// Title text, or `" "` when the stream had none.
    pub heading: String,
    /// Subtitle text, or `" "` when the stream had none.
    pub subheading: String,
    /// Notes for the title slide, or empty.
    pub notes: String,
}

/// Placeholder text for a missing title or subtitle.
pub const BLANK_PLACEHOLDER: &str = " ";

/// A run of nodes that becomes one content slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideGroup {
    pub title: String,
    /// Body and notes nodes, in order. Never contains headings.
    pub nodes: Vec<ContentNode>,
}

/// The stream split into slides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    /// Notes that arrived before any slide was open.
    pub leading_notes: Vec<String>,
    pub groups: Vec<SlideGroup>,
}

/// Default title for a slide opened by non-heading content.
pub fn default_title(kind: &ContentKind) -> &'static str {
    match kind {
        ContentKind::List(_) => "List",
        ContentKind::Code { .. } => "Code",
        _ => "Content",
    }
}

/// Paragraphs and headings can fill the title slide. The title itself must
/// come from an `h1`/`h2`; the subheading may be a heading of any level.
fn is_title_candidate(node: &ContentNode, any_level: bool) -> bool {
    match node.kind {
        ContentKind::Heading { level, .. } => any_level || level <= 2,
        ContentKind::Paragraph { .. } => true,
        _ => false,
    }
}

/// Remove and return the title slide's heading, subheading, and notes.
///
/// The scan runs until all three are found or the stream is exhausted. The
/// subheading is the next candidate after the heading, whatever its level.
pub fn extract_title_parts(nodes: &mut Vec<ContentNode>, max_title_len: usize) -> TitleParts {
    let mut heading: Option<String> = None;
    let mut subheading: Option<String> = None;
    let mut notes: Option<String> = None;

    let mut i = 0;
    while i < nodes.len() {
        if heading.is_some() && subheading.is_some() && notes.is_some() {
            break;
        }
        let node = &nodes[i];

        if let ContentKind::Notes { text } = &node.kind {
            if notes.is_none() {
                notes = Some(text.trim().to_string());
                nodes.remove(i);
                continue;
            }
            i += 1;
            continue;
        }

        if !is_title_candidate(node, heading.is_some()) {
            i += 1;
            continue;
        }
        let text = node.text().unwrap_or_default();

        if heading.is_none() {
            heading = Some(clean_title(text, max_title_len));
            nodes.remove(i);
        } else if subheading.is_none() {
            let stripped = strip_slide_prefix(text.trim());
            subheading = Some(strip_subtitle_prefix(stripped).to_string());
            nodes.remove(i);
        } else {
            i += 1;
        }
    }

    let non_blank = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
    TitleParts {
        heading: non_blank(heading).unwrap_or_else(|| BLANK_PLACEHOLDER.to_string()),
        subheading: non_blank(subheading).unwrap_or_else(|| BLANK_PLACEHOLDER.to_string()),
        notes: notes.unwrap_or_default(),
    }
}

/// Group the remaining stream into slides.
pub fn segment(nodes: Vec<ContentNode>, max_title_len: usize) -> Segmentation {
    let mut segmentation = Segmentation::default();

    for node in nodes {
        match &node.kind {
            ContentKind::Heading { text, .. } => {
                let title = clean_title(text, max_title_len);
                log::debug!("Opening slide '{}'", title);
                segmentation.groups.push(SlideGroup {
                    title,
                    nodes: Vec::new(),
                });
            }
            ContentKind::Notes { text } if segmentation.groups.is_empty() => {
                segmentation.leading_notes.push(text.clone());
            }
            kind => {
                if segmentation.groups.is_empty() {
                    let title = default_title(kind);
                    log::debug!("Opening default slide '{}' for {}", title, kind.label());
                    segmentation.groups.push(SlideGroup {
                        title: title.to_string(),
                        nodes: Vec::new(),
                    });
                }
                if let Some(group) = segmentation.groups.last_mut() {
                    group.nodes.push(node);
                }
            }
        }
    }

    segmentation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ListBlock, ListKind};

    fn heading(id: usize, level: u8, text: &str) -> ContentNode {
        ContentNode::new(id, ContentKind::Heading { level, text: text.into() })
    }

    fn para(id: usize, text: &str) -> ContentNode {
        ContentNode::new(id, ContentKind::Paragraph { text: text.into() })
    }

    fn notes(id: usize, text: &str) -> ContentNode {
        ContentNode::new(id, ContentKind::Notes { text: text.into() })
    }

    fn list(id: usize) -> ContentNode {
        ContentNode::new(
            id,
            ContentKind::List(ListBlock {
                kind: ListKind::Unordered,
                items: vec![],
            }),
        )
    }

    #[test]
    fn test_title_parts_consumed_from_stream() {
        let mut nodes = vec![
            heading(1, 1, "Slide 1: Intro to Soldering"),
            list(2),
            notes(3, "Remember PPE"),
            para(4, "Subtitle: Irons and tips"),
            heading(5, 1, "Slide 2: Tools"),
        ];
        let parts = extract_title_parts(&mut nodes, 100);
        assert_eq!(parts.heading, "Intro to Soldering");
        assert_eq!(parts.subheading, "Irons and tips");
        assert_eq!(parts.notes, "Remember PPE");
        let remaining: Vec<usize> = nodes.iter().map(|n| n.source).collect();
        assert_eq!(remaining, vec![2, 5]);
    }

    #[test]
    fn test_second_heading_becomes_subheading() {
        let mut nodes = vec![
            heading(1, 1, "Slide 1: Intro"),
            heading(2, 1, "Slide 2: Tools"),
            list(3),
            heading(4, 2, "Slide 3: Safety"),
        ];
        let parts = extract_title_parts(&mut nodes, 100);
        assert_eq!(parts.heading, "Intro");
        assert_eq!(parts.subheading, "Tools");
        let remaining: Vec<usize> = nodes.iter().map(|n| n.source).collect();
        assert_eq!(remaining, vec![3, 4]);
    }

    #[test]
    fn test_deep_heading_becomes_subheading() {
        let mut nodes = vec![
            heading(1, 4, "Not a title"),
            heading(2, 1, "Soldering"),
            heading(3, 3, "Subtitle: For new graduates"),
            list(4),
        ];
        let parts = extract_title_parts(&mut nodes, 100);
        assert_eq!(parts.heading, "Soldering");
        assert_eq!(parts.subheading, "For new graduates");
        let remaining: Vec<usize> = nodes.iter().map(|n| n.source).collect();
        assert_eq!(remaining, vec![1, 4]);
    }

    #[test]
    fn test_missing_title_parts_default() {
        let mut nodes = vec![list(1)];
        let parts = extract_title_parts(&mut nodes, 100);
        assert_eq!(parts.heading, BLANK_PLACEHOLDER);
        assert_eq!(parts.subheading, BLANK_PLACEHOLDER);
        assert_eq!(parts.notes, "");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_only_first_notes_taken() {
        let mut nodes = vec![notes(1, "first"), notes(2, "second")];
        let parts = extract_title_parts(&mut nodes, 100);
        assert_eq!(parts.notes, "first");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text(), Some("second"));
    }

    #[test]
    fn test_deep_headings_are_not_titles() {
        let mut nodes = vec![heading(1, 3, "Deep"), para(2, "Opening line")];
        let parts = extract_title_parts(&mut nodes, 100);
        assert_eq!(parts.heading, "Opening line");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_segment_groups_by_heading() {
        let seg = segment(
            vec![
                notes(1, "early"),
                list(2),
                heading(3, 2, "Slide 3: Safety"),
                para(4, "Wear goggles"),
                notes(5, "Stress goggles"),
            ],
            100,
        );
        assert_eq!(seg.leading_notes, vec!["early".to_string()]);
        assert_eq!(seg.groups.len(), 2);
        assert_eq!(seg.groups[0].title, "List");
        assert_eq!(seg.groups[0].nodes.len(), 1);
        assert_eq!(seg.groups[1].title, "Safety");
        assert_eq!(seg.groups[1].nodes.len(), 2);
    }

    #[test]
    fn test_default_titles() {
        assert_eq!(default_title(&ContentKind::Code { text: "x".into() }), "Code");
        assert_eq!(default_title(&ContentKind::Paragraph { text: "x".into() }), "Content");
        let seg = segment(vec![ContentNode::new(1, ContentKind::Code { text: "x".into() })], 100);
        assert_eq!(seg.groups[0].title, "Code");
    }

    #[test]
    fn test_long_heading_truncated() {
        let seg = segment(vec![heading(1, 1, &"a".repeat(150))], 100);
        assert_eq!(seg.groups[0].title.chars().count(), 103);
    }
}
