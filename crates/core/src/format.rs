//! Input source formats and loading.

use crate::error::{Error, Result};
use crate::html::parse_html;
use crate::markdown::parse_markdown;
use crate::tree::ContentTree;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The markup a source document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// Markdown with pipe tables.
    Markdown,
    /// An HTML page or fragment.
    Html,
}

impl SourceFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "md" | "markdown" | "txt" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// Detect format from content: markup starting with `<` is HTML.
    pub fn from_content(text: &str) -> Self {
        if text.trim_start().starts_with('<') {
            Self::Html
        } else {
            Self::Markdown
        }
    }

    /// Detect format for a file, by extension first and content second.
    pub fn detect(path: &Path, text: &str) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or_else(|| Self::from_content(text))
    }

    /// Parse `text` into a content tree.
    pub fn parse(self, text: &str) -> ContentTree {
        match self {
            Self::Markdown => parse_markdown(text),
            Self::Html => parse_html(text),
        }
    }
}

/// Read and parse a source file.
pub fn load_source(path: &Path) -> Result<(SourceFormat, ContentTree)> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|_| {
        Error::UnsupportedFormat(format!("{} is not UTF-8 text", path.display()))
    })?;
    let format = SourceFormat::detect(path, &text);
    log::debug!("Loading {} as {:?}", path.display(), format);
    Ok((format, format.parse(&text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_extension("MD"), Some(SourceFormat::Markdown));
        assert_eq!(SourceFormat::from_extension("htm"), Some(SourceFormat::Html));
        assert_eq!(SourceFormat::from_extension("pptx"), None);
    }

    #[test]
    fn test_format_from_content() {
        assert_eq!(SourceFormat::from_content("  <div>x</div>"), SourceFormat::Html);
        assert_eq!(SourceFormat::from_content("# Slide 1: x"), SourceFormat::Markdown);
        assert_eq!(
            SourceFormat::detect(Path::new("canvas"), "<p>hi</p>"),
            SourceFormat::Html
        );
    }

    #[test]
    fn test_load_source_rejects_binary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        let err = load_source(file.path()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_source_markdown() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        file.write_all(b"# Slide 1: Intro\n").unwrap();
        let (format, tree) = load_source(file.path()).unwrap();
        assert_eq!(format, SourceFormat::Markdown);
        assert_eq!(tree.root().child_elements().next().unwrap().name, "h1");
    }
}
