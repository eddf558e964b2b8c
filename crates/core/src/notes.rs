//! Speaker-notes detection, deduplication, and the plain-text transcript.
//!
//! Generated slide text carries notes inline after a `speaker notes:` marker.
//! The marker may share a block with body text, so every text block is split
//! at the first marker into body and notes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// The notes marker, case-insensitive, with optional spacing around the colon.
static NOTES_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)speaker notes\s*:\s*").unwrap());

/// Text split at a notes marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesSplit {
    /// Text before the marker, trimmed (possibly empty).
    pub body: String,
    /// Text after the marker, trimmed (possibly empty).
    pub notes: String,
}

/// Split `text` at the first notes marker. Returns `None` without a marker.
pub fn split_notes(text: &str) -> Option<NotesSplit> {
    let m = NOTES_MARKER_REGEX.find(text)?;
    Some(NotesSplit {
        body: text[..m.start()].trim().to_string(),
        notes: text[m.end()..].trim().to_string(),
    })
}

/// Notes recorded for one slide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeakerNote {
    /// 1-based slide ordinal.
    pub slide: usize,
    /// Trimmed, non-empty notes text.
    pub text: String,
}

/// Ordered set of `(slide, text)` notes; repeats are dropped.
#[derive(Debug, Clone, Default)]
pub struct NotesLedger {
    seen: HashSet<(usize, String)>,
    entries: Vec<SpeakerNote>,
}

impl NotesLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record notes for a slide. Returns the trimmed text when it is new,
    /// `None` when it is empty or already recorded for that slide.
    pub fn record(&mut self, slide: usize, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let key = (slide, text.to_string());
        if self.seen.contains(&key) {
            log::debug!("Dropping repeated notes for slide {}", slide);
            return None;
        }
        self.seen.insert(key);
        self.entries.push(SpeakerNote {
            slide,
            text: text.to_string(),
        });
        Some(text.to_string())
    }

    pub fn entries(&self) -> &[SpeakerNote] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<SpeakerNote> {
        self.entries
    }
}

/// Render notes as the companion transcript, one block per entry:
///
/// ```text
/// Slide 1:
/// Remember PPE
///
/// ```
pub fn format_transcript(notes: &[SpeakerNote]) -> String {
    notes
        .iter()
        .map(|note| format!("Slide {}:\n{}\n\n", note.slide, note.text.trim()))
        .collect()
}
