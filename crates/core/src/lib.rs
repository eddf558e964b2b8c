//! Core of the markdown-to-slide-deck engine: content trees, the
//! normalizer, segmenter, renderer, and notes extraction that turn
//! generated markdown or HTML into an in-memory deck.

pub mod batch;
pub mod builder;
pub mod config;
pub mod deck;
pub mod error;
pub mod format;
pub mod html;
pub mod markdown;
pub mod normalize;
pub mod notes;
pub mod render;
pub mod segment;
pub mod style;
pub mod text;
pub mod tree;
pub mod types;

pub use batch::{collect_markdown, parse_microskills, CompletionService, MicroSkill, TrainingBrief};
pub use builder::{DeckBuilder, GeneratorState};
pub use config::{FontConfig, GeneratorConfig};
pub use deck::{Block, BodyRegion, Bullet, Deck, Slide, SlideKind, TableBlock, TextLine};
pub use error::{Error, Result};
pub use format::{load_source, SourceFormat};
pub use html::parse_html;
pub use markdown::{parse_markdown, parse_markdown_table};
pub use normalize::Normalizer;
pub use notes::{NotesLedger, SpeakerNote};
pub use render::{NodeRenderer, SlideRenderer};
pub use tree::{ContentTree, Element, NodeId};
pub use types::{ContentKind, ContentNode, ExtractedDeck, ExtractedSlide, SlideText};
