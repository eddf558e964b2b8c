//! The end-to-end pipeline: content tree in, `.pptx` plus transcript out.

use crate::persist::{persist_outputs, transcript_path};
use crate::writer::PptxWriter;
use deck_core::{ContentTree, Deck, DeckBuilder, GeneratorConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub output: PathBuf,
    pub transcript: PathBuf,
    pub slides: usize,
    pub notes: usize,
    /// Whether the fallback slide had to be added.
    pub fallback: bool,
}

/// Builds and saves presentations. Each call owns its own build state.
#[derive(Debug, Clone, Default)]
pub struct PresentationGenerator {
    config: GeneratorConfig,
}

impl PresentationGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build the in-memory deck without writing anything.
    pub fn build_deck(&self, tree: &ContentTree, title: Option<&str>) -> Deck {
        DeckBuilder::new(&self.config).build(tree, title)
    }

    /// Build, serialize, and atomically save the deck and its transcript.
    pub fn try_create_presentation(
        &self,
        tree: &ContentTree,
        output: &Path,
        title: Option<&str>,
    ) -> Result<GenerationReport> {
        let deck = self.build_deck(tree, title);
        let bytes = PptxWriter::new(&self.config).write_to_vec(&deck)?;
        let transcript = transcript_path(output, &self.config.notes_suffix);
        persist_outputs(
            output,
            &bytes,
            &transcript,
            &deck.transcript(),
            self.config.min_free_space,
        )?;

        log::info!(
            "Saved {} ({} slides) and {}",
            output.display(),
            deck.slide_count(),
            transcript.display()
        );
        Ok(GenerationReport {
            output: output.to_path_buf(),
            transcript,
            slides: deck.slide_count(),
            notes: deck.notes.len(),
            fallback: deck.fallback_count() > 0,
        })
    }

    /// Like [`try_create_presentation`](Self::try_create_presentation), but
    /// logs any failure and reports success as a bool.
    pub fn create_presentation(&self, tree: &ContentTree, output: &Path, title: Option<&str>) -> bool {
        match self.try_create_presentation(tree, output, title) {
            Ok(_) => true,
            Err(e) => {
                log::error!("Failed to create presentation {}: {}", output.display(), e);
                false
            }
        }
    }
}
