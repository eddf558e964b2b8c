//! Text cleanup shared by the loaders, segmenter, and renderer.
//!
//! Handles whitespace collapsing, `Slide N:` / `Subtitle:` prefix removal,
//! character-based truncation, and bullet-like line detection. Normalized
//! text never carries characters XML cannot represent.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse runs of horizontal whitespace into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

/// Regex to collapse any whitespace, including line breaks.
static ANY_WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Leading `Slide 3:` style prefix the generator puts on headings.
static SLIDE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^slide\s*\d+\s*:\s*").unwrap());

/// Leading `Subtitle:` label.
static SUBTITLE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^subtitle\s*:\s*").unwrap());

/// Lines that read like a bullet even though they were not a list.
static BULLET_LIKE_REGEXES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"^[-•·]\s+").unwrap(),
        Regex::new(r"^\d+\.\s+").unwrap(),
        Regex::new(r"^[a-zA-Z]\.\s+").unwrap(),
    ]
});

/// Marker appended to truncated titles.
pub const ELLIPSIS: &str = "...";

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Drop characters XML 1.0 cannot carry (C0 controls other than tab and
/// line breaks, U+FFFE, U+FFFF).
pub fn strip_invalid_xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

/// Flatten text onto one line: NFC-normalize, collapse all whitespace, trim.
pub fn collapse_whitespace(text: &str) -> String {
    let composed: String = strip_invalid_xml_chars(text).nfc().collect();
    ANY_WHITESPACE_REGEX
        .replace_all(&composed, " ")
        .trim()
        .to_string()
}

/// Normalize multi-line text: NFC, unify line endings, collapse whitespace
/// within each line, and drop empty lines.
pub fn normalize_block_text(text: &str) -> String {
    let composed: String = strip_invalid_xml_chars(text).nfc().collect();
    composed
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Whether `text` has more than `max` characters.
pub fn exceeds_chars(text: &str, max: usize) -> bool {
    text.chars().nth(max).is_some()
}

/// Remove a leading `Slide N:` prefix.
pub fn strip_slide_prefix(text: &str) -> &str {
    match SLIDE_PREFIX_REGEX.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Remove a leading `Subtitle:` label and trim.
pub fn strip_subtitle_prefix(text: &str) -> &str {
    match SUBTITLE_PREFIX_REGEX.find(text) {
        Some(m) => text[m.end()..].trim(),
        None => text.trim(),
    }
}

/// Clean a heading into a slide title: strip the `Slide N:` prefix and cap
/// the length, appending an ellipsis when cut.
pub fn clean_title(text: &str, max: usize) -> String {
    let stripped = strip_slide_prefix(text.trim()).trim();
    if exceeds_chars(stripped, max) {
        format!("{}{}", truncate_chars(stripped, max), ELLIPSIS)
    } else {
        stripped.to_string()
    }
}

/// Whether a line looks like a bullet (`- x`, `1. x`, `a. x`).
pub fn is_bullet_like(line: &str) -> bool {
    let line = line.trim_start();
    BULLET_LIKE_REGEXES.iter().any(|re| re.is_match(line))
}
