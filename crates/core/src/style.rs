//! Fonts, units, and the fixed slide geometry.
//!
//! Font selection is a chain of pure steps: pick the preferred font for a
//! role, validate it, and fall back to the configured safe font when the
//! preferred one is unusable.

use crate::config::FontConfig;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Characters that make short text read like code.
static CODE_LIKE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[{}();=<>]").unwrap());

/// Longest typeface name a run property can carry.
pub const MAX_FONT_NAME_LEN: usize = 31;

/// Font sizes PowerPoint accepts, in points.
pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=4000;

/// English Metric Units, the OOXML length unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Emu(pub i64);

impl Emu {
    pub const PER_INCH: i64 = 914_400;
    pub const PER_CM: i64 = 360_000;
    pub const PER_POINT: i64 = 12_700;

    pub fn inches(value: f64) -> Self {
        Self((value * Self::PER_INCH as f64).round() as i64)
    }

    pub fn cm(value: f64) -> Self {
        Self((value * Self::PER_CM as f64).round() as i64)
    }

    pub fn points(value: f64) -> Self {
        Self((value * Self::PER_POINT as f64).round() as i64)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl std::ops::Add for Emu {
    type Output = Emu;

    fn add(self, rhs: Emu) -> Emu {
        Emu(self.0 + rhs.0)
    }
}

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Upper-case hex form used in `a:srgbClr`.
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Fill of table header cells.
pub const HEADER_FILL: Rgb = Rgb(68, 114, 196);
/// Text colour of table header cells.
pub const HEADER_TEXT: Rgb = Rgb(255, 255, 255);

/// A positioned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

/// Inner margins of a text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insets {
    pub left: Emu,
    pub right: Emu,
    pub top: Emu,
    pub bottom: Emu,
}

/// Slide size: 10in x 7.5in.
pub fn slide_size() -> (Emu, Emu) {
    (Emu::inches(10.0), Emu::inches(7.5))
}

/// Where the body placeholder sits on content slides.
pub fn body_frame() -> Frame {
    Frame {
        left: Emu::cm(1.27),
        top: Emu::cm(5.28),
        width: Emu::cm(16.13),
        height: Emu::cm(8.48),
    }
}

pub fn body_insets() -> Insets {
    Insets {
        left: Emu::cm(0.25),
        right: Emu::cm(0.25),
        top: Emu::cm(0.13),
        bottom: Emu::cm(0.13),
    }
}

/// Frame for the `index`-th table on a slide given the heights of earlier
/// tables; tables stack downward from 1.77in.
pub fn table_frame(rows: usize, above: &[Emu]) -> Frame {
    let height_in = (0.5 + 0.4 * rows as f64).min(5.5);
    let gap = Emu::inches(0.2);
    let top = above
        .iter()
        .fold(Emu::inches(1.77), |top, h| top + *h + gap);
    Frame {
        left: Emu::inches(0.5),
        top,
        width: Emu::inches(9.0),
        height: Emu::inches(height_in),
    }
}

/// What a run of text is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontRole {
    Default,
    Code,
    Heading,
}

/// A validated typeface and size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSpec {
    pub name: String,
    /// Size in points.
    pub size: u32,
}

impl FontSpec {
    /// Validate a typeface name and size.
    pub fn checked(name: &str, size: u32) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(Error::FontError("empty font name".to_string()));
        }
        if trimmed.chars().count() > MAX_FONT_NAME_LEN {
            return Err(Error::FontError(format!("font name too long: {}", trimmed)));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(Error::FontError(format!(
                "font name has control characters: {:?}",
                trimmed
            )));
        }
        if !FONT_SIZE_RANGE.contains(&size) {
            return Err(Error::FontError(format!("font size out of range: {}pt", size)));
        }
        Ok(Self {
            name: trimmed.to_string(),
            size,
        })
    }

    /// Size in hundredths of a point, as OOXML `sz` wants it.
    pub fn size_hundredths(&self) -> u32 {
        self.size * 100
    }
}

/// The preferred typeface and size for `role` and `text`, before validation.
///
/// Default-role text with non-ASCII characters uses the fallback face; short
/// code-looking default text uses the code face.
pub fn preferred_font<'a>(role: FontRole, text: &str, fonts: &'a FontConfig) -> (&'a str, u32) {
    match role {
        FontRole::Code => (&fonts.code, fonts.code_size),
        FontRole::Heading => (&fonts.heading, fonts.heading_size),
        FontRole::Default => {
            if !text.is_ascii() {
                (&fonts.fallback, fonts.default_size)
            } else if CODE_LIKE_REGEX.is_match(text) && text.split_whitespace().count() < 10 {
                (&fonts.code, fonts.default_size)
            } else {
                (&fonts.default, fonts.default_size)
            }
        }
    }
}

/// The safe fallback typeface.
pub fn fallback_font(fonts: &FontConfig) -> Result<FontSpec> {
    FontSpec::checked(&fonts.fallback, fonts.fallback_size)
}

/// Resolve a font through the chain preferred → fallback.
pub fn resolve_font(role: FontRole, text: &str, fonts: &FontConfig) -> Result<FontSpec> {
    let (name, size) = preferred_font(role, text, fonts);
    match FontSpec::checked(name, size) {
        Ok(spec) => Ok(spec),
        Err(e) => {
            log::warn!("Preferred font rejected ({}), trying fallback", e);
            fallback_font(fonts)
        }
    }
}

/// Default font applied to layout placeholders.
pub fn layout_font(fonts: &FontConfig) -> Result<FontSpec> {
    FontSpec::checked(&fonts.default, fonts.layout_size).or_else(|_| fallback_font(fonts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emu_conversions() {
        assert_eq!(Emu::inches(1.0).value(), 914_400);
        assert_eq!(Emu::cm(1.27).value(), 457_200);
        assert_eq!(Emu::points(2.0).value(), 25_400);
        assert_eq!(slide_size(), (Emu(9_144_000), Emu(6_858_000)));
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(HEADER_FILL.hex(), "4472C4");
        assert_eq!(HEADER_TEXT.hex(), "FFFFFF");
    }

    #[test]
    fn test_table_frame_height_is_capped() {
        assert_eq!(table_frame(2, &[]).height, Emu::inches(1.3));
        assert_eq!(table_frame(40, &[]).height, Emu::inches(5.5));
    }

    #[test]
    fn test_tables_stack_downward() {
        let first = table_frame(3, &[]);
        let second = table_frame(3, &[first.height]);
        assert_eq!(first.top, Emu::inches(1.77));
        assert_eq!(
            second.top.value(),
            first.top.value() + first.height.value() + Emu::inches(0.2).value()
        );
    }

    #[test]
    fn test_checked_font() {
        assert!(FontSpec::checked("Calibri", 24).is_ok());
        assert!(FontSpec::checked("  ", 24).is_err());
        assert!(FontSpec::checked("Calibri", 0).is_err());
        assert!(FontSpec::checked(&"x".repeat(40), 24).is_err());
        assert!(FontSpec::checked("Bad\u{7}Font", 24).is_err());
        assert_eq!(FontSpec::checked(" Arial ", 22).unwrap().name, "Arial");
    }

    #[test]
    fn test_preferred_font_by_role() {
        let fonts = FontConfig::default();
        assert_eq!(preferred_font(FontRole::Code, "x", &fonts), ("Courier New", 20));
        assert_eq!(preferred_font(FontRole::Heading, "x", &fonts), ("Calibri", 28));
        assert_eq!(
            preferred_font(FontRole::Default, "Use flux", &fonts),
            ("Calibri", 24)
        );
        assert_eq!(
            preferred_font(FontRole::Default, "Résistance", &fonts),
            ("Arial", 24)
        );
        assert_eq!(
            preferred_font(FontRole::Default, "x = f(y);", &fonts),
            ("Courier New", 24)
        );
    }

    #[test]
    fn test_resolve_font_falls_back() {
        let fonts = FontConfig {
            default: String::new(),
            ..FontConfig::default()
        };
        let spec = resolve_font(FontRole::Default, "text", &fonts).unwrap();
        assert_eq!(spec, FontSpec { name: "Arial".into(), size: 22 });
    }

    #[test]
    fn test_resolve_font_fails_when_chain_exhausted() {
        let fonts = FontConfig {
            default: String::new(),
            fallback: String::new(),
            ..FontConfig::default()
        };
        assert!(resolve_font(FontRole::Default, "text", &fonts).is_err());
        assert!(layout_font(&fonts).is_err());
    }
}
