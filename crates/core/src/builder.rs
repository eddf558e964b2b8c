//! Assembly of a [`Deck`] from a content tree.
//!
//! Runs normalize → title extraction → segmentation → per-slide rendering
//! and notes attachment, then adds the fallback slide when no body slide was
//! produced.

use crate::config::GeneratorConfig;
use crate::deck::{Deck, Slide};
use crate::normalize::Normalizer;
use crate::notes::NotesLedger;
use crate::render::{NodeRenderer, SlideRenderer};
use crate::segment::{extract_title_parts, segment, BLANK_PLACEHOLDER};
use crate::text::clean_title;
use crate::tree::ContentTree;
use crate::types::ContentKind;

/// Mutable state of one deck build.
#[derive(Debug, Default)]
pub struct GeneratorState {
    pub notes: NotesLedger,
    /// Slides created so far; the ordinal of the newest slide.
    pub slide_count: usize,
}

impl GeneratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new slide and return its 1-based ordinal.
    pub fn next_slide(&mut self) -> usize {
        self.slide_count += 1;
        self.slide_count
    }

    /// Record notes for `slide`, attaching them when they are new.
    pub fn attach_notes(&mut self, slide: &mut Slide, ordinal: usize, text: &str) {
        if let Some(text) = self.notes.record(ordinal, text) {
            slide.add_notes(&text);
        }
    }
}

/// Builds decks from content trees.
#[derive(Debug, Clone)]
pub struct DeckBuilder<'a, R = SlideRenderer<'a>> {
    config: &'a GeneratorConfig,
    normalizer: Normalizer,
    renderer: R,
}

impl<'a> DeckBuilder<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self::with_renderer(config, SlideRenderer::new(config))
    }
}

impl<'a, R: NodeRenderer> DeckBuilder<'a, R> {
    /// Build with a custom node renderer.
    pub fn with_renderer(config: &'a GeneratorConfig, renderer: R) -> Self {
        Self {
            config,
            normalizer: Normalizer::new(),
            renderer,
        }
    }

    /// Build a deck. `title` names the document and stands in for the
    /// title-slide heading when the content has none.
    pub fn build(&self, tree: &ContentTree, title: Option<&str>) -> Deck {
        let mut state = GeneratorState::new();
        let mut nodes = self.normalizer.normalize(tree);

        let parts = extract_title_parts(&mut nodes, self.config.max_title_length);
        let caller_title = title
            .map(|t| clean_title(t, self.config.max_title_length))
            .filter(|t| !t.trim().is_empty());
        let heading = match (&caller_title, parts.heading.as_str()) {
            (Some(t), BLANK_PLACEHOLDER) => t.clone(),
            _ => parts.heading.clone(),
        };

        let mut title_slide = Slide::title_slide(heading.clone(), parts.subheading);
        let title_ordinal = state.next_slide();
        state.attach_notes(&mut title_slide, title_ordinal, &parts.notes);

        let segmentation = segment(nodes, self.config.max_title_length);
        for text in &segmentation.leading_notes {
            state.attach_notes(&mut title_slide, title_ordinal, text);
        }

        let mut slides = vec![title_slide];
        for group in segmentation.groups {
            let mut slide = Slide::content(group.title);
            let ordinal = state.next_slide();
            for node in &group.nodes {
                if let ContentKind::Notes { text } = &node.kind {
                    state.attach_notes(&mut slide, ordinal, text);
                    continue;
                }
                if let Err(e) = self.renderer.render_node(&mut slide.body, node) {
                    log::warn!(
                        "Skipping {} on slide {} ('{}'): {}",
                        node.kind.label(),
                        ordinal,
                        slide.title,
                        e
                    );
                }
            }
            slides.push(slide);
        }

        if slides.len() == 1 {
            log::warn!("No body content found, adding fallback slide");
            state.next_slide();
            slides.push(Slide::fallback(
                self.config.fallback_title.clone(),
                self.config.fallback_body.clone(),
            ));
        }

        let doc_title = caller_title.or_else(|| {
            let h = heading.trim();
            (!h.is_empty()).then(|| h.to_string())
        });
        log::info!(
            "Built deck with {} slides and {} notes",
            state.slide_count,
            state.notes.len()
        );
        Deck {
            title: doc_title,
            slides,
            notes: state.notes.into_entries(),
        }
    }
}
