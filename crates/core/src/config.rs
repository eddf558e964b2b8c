//! Generator configuration.

use crate::error::{Error, Result};
use crate::style::FONT_SIZE_RANGE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Font names and sizes (in points) per text role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub default: String,
    pub code: String,
    pub heading: String,
    pub fallback: String,
    pub default_size: u32,
    pub code_size: u32,
    pub heading_size: u32,
    pub fallback_size: u32,
    /// Size applied to every layout placeholder before content is added.
    pub layout_size: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            default: "Calibri".to_string(),
            code: "Courier New".to_string(),
            heading: "Calibri".to_string(),
            fallback: "Arial".to_string(),
            default_size: 24,
            code_size: 20,
            heading_size: 28,
            fallback_size: 22,
            layout_size: 22,
        }
    }
}

/// Tunables for building and persisting a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Longest paragraph/quote rendered, and the cut-off for code blocks.
    pub max_slide_content_length: usize,
    /// Slide titles longer than this are cut and get an ellipsis.
    pub max_title_length: usize,
    /// Table cell text is cut to this many characters.
    pub max_cell_length: usize,
    /// Deepest list indent level rendered.
    pub max_list_level: u8,
    /// Minimum free bytes in the output directory before writing.
    pub min_free_space: u64,
    pub fonts: FontConfig,
    pub fallback_title: String,
    pub fallback_body: String,
    /// Appended to the deck's file stem to name the notes transcript.
    pub notes_suffix: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_slide_content_length: 1000,
            max_title_length: 100,
            max_cell_length: 200,
            max_list_level: 4,
            min_free_space: 10 * 1024 * 1024,
            fonts: FontConfig::default(),
            fallback_title: "No Content Found".to_string(),
            fallback_body: "The canvas appears to be empty or could not be processed."
                .to_string(),
            notes_suffix: "_speaker_notes".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parse overrides from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.max_slide_content_length == 0 {
            return Err(Error::ConfigError(
                "max_slide_content_length must be positive".to_string(),
            ));
        }
        if self.max_title_length == 0 || self.max_cell_length == 0 {
            return Err(Error::ConfigError(
                "title and cell lengths must be positive".to_string(),
            ));
        }
        if self.max_list_level > 8 {
            return Err(Error::ConfigError(format!(
                "max_list_level {} exceeds the 8 levels a text frame supports",
                self.max_list_level
            )));
        }
        let fonts = &self.fonts;
        for (name, size) in [
            ("default_size", fonts.default_size),
            ("code_size", fonts.code_size),
            ("heading_size", fonts.heading_size),
            ("fallback_size", fonts.fallback_size),
            ("layout_size", fonts.layout_size),
        ] {
            if !FONT_SIZE_RANGE.contains(&size) {
                return Err(Error::ConfigError(format!(
                    "fonts.{} {} is outside {}..={} pt",
                    name,
                    size,
                    FONT_SIZE_RANGE.start(),
                    FONT_SIZE_RANGE.end()
                )));
            }
        }
        if self.notes_suffix.contains(['/', '\\']) {
            return Err(Error::ConfigError(
                "notes_suffix must not contain path separators".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_max_slide_content_length(mut self, len: usize) -> Self {
        self.max_slide_content_length = len;
        self
    }

    pub fn with_max_list_level(mut self, level: u8) -> Self {
        self.max_list_level = level;
        self
    }

    pub fn with_min_free_space(mut self, bytes: u64) -> Self {
        self.min_free_space = bytes;
        self
    }

    pub fn with_fonts(mut self, fonts: FontConfig) -> Self {
        self.fonts = fonts;
        self
    }
}
