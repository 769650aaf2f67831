//! Characters and spans.

use serde::{Deserialize, Serialize};

use super::Matrix;
use crate::error::Result;

/// Horizontal or vertical writing mode of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingMode {
    /// Glyphs advance along x.
    #[default]
    Horizontal,
    /// Glyphs advance along y.
    Vertical,
}

impl WritingMode {
    /// Map the integer `wmode` attribute; any non-zero value is vertical.
    pub fn from_wmode(wmode: i32) -> Self {
        if wmode == 0 {
            WritingMode::Horizontal
        } else {
            WritingMode::Vertical
        }
    }
}

/// A single positioned glyph.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Character {
    /// Position in text space, before the span's CTM
    pub pre_x: f32,
    pub pre_y: f32,

    /// Position in page space
    pub x: f32,
    pub y: f32,

    /// Glyph id (0 when the stream does not provide one)
    pub gid: u32,

    /// Unicode code point
    pub ucs: u32,

    /// Advance width in font units (scaled by the span's TRM)
    pub adv: f32,
}

impl Character {
    pub fn is_space(&self) -> bool {
        self.ucs == u32::from(' ')
    }

    pub fn is_hyphen(&self) -> bool {
        self.ucs == u32::from('-')
    }

    /// The code point as a `char`, if valid.
    pub fn as_char(&self) -> Option<char> {
        char::from_u32(self.ucs)
    }
}

/// A run of characters sharing one font and matrix state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Current transformation matrix
    pub ctm: Matrix,

    /// Text rendering matrix (font scale)
    pub trm: Matrix,

    /// Font name with any subset prefix removed
    pub font_name: String,

    pub bold: bool,
    pub italic: bool,
    pub wmode: WritingMode,

    pub chars: Vec<Character>,
}

impl Span {
    /// Create an empty span. A subset prefix such as `ABCDEF+` is stripped
    /// from `font_name` and bold/italic are derived from what remains.
    pub fn new(ctm: Matrix, trm: Matrix, font_name: &str, wmode: WritingMode) -> Self {
        let font_name = strip_subset_prefix(font_name);
        let (bold, italic) = font_flags(font_name);
        Self {
            ctm,
            trm,
            font_name: font_name.to_string(),
            bold,
            italic,
            wmode,
            chars: Vec::new(),
        }
    }

    /// Empty span with the same matrices, font and flags.
    pub fn empty_like(&self) -> Self {
        Self {
            ctm: self.ctm,
            trm: self.trm,
            font_name: self.font_name.clone(),
            bold: self.bold,
            italic: self.italic,
            wmode: self.wmode,
            chars: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn first_char(&self) -> Option<&Character> {
        self.chars.first()
    }

    pub fn last_char(&self) -> Option<&Character> {
        self.chars.last()
    }

    /// Flow angle of the span in radians.
    pub fn angle(&self) -> f32 {
        self.ctm.angle()
    }

    /// Font size in points: `|TRM| * |CTM|`.
    pub fn font_size(&self) -> f32 {
        self.trm.expansion() * self.ctm.expansion()
    }

    /// Distance from first to last character plus the last advance.
    pub fn adv_total(&self) -> f32 {
        match (self.chars.first(), self.chars.last()) {
            (Some(first), Some(last)) => {
                let dx = last.x - first.x;
                let dy = last.y - first.y;
                (dx * dx + dy * dy).sqrt() + last.adv * self.trm.expansion()
            }
            _ => 0.0,
        }
    }

    /// Direction of glyph advance in text space.
    pub fn advance_dir(&self) -> (f32, f32) {
        match self.wmode {
            WritingMode::Horizontal => self.trm.transform_vector(1.0, 0.0),
            WritingMode::Vertical => self.trm.transform_vector(0.0, 1.0),
        }
    }

    /// Append a character, reporting allocation failure.
    pub fn push_char(&mut self, c: Character) -> Result<()> {
        self.chars.try_reserve(1)?;
        self.chars.push(c);
        Ok(())
    }

    /// Append a character whose page position is derived from its
    /// text-space position through the span's CTM.
    pub fn push_at(&mut self, pre_x: f32, pre_y: f32, ucs: u32, gid: u32, adv: f32) -> Result<()> {
        let (x, y) = self.ctm.transform_point(pre_x, pre_y);
        self.push_char(Character {
            pre_x,
            pre_y,
            x,
            y,
            gid,
            ucs,
            adv,
        })
    }

    /// Append a synthetic space placed where the last character ends.
    pub fn push_space(&mut self, adv: f32) -> Result<()> {
        let (pre_x, pre_y) = match self.chars.last() {
            Some(last) => {
                let (dx, dy) = self.advance_dir();
                (last.pre_x + last.adv * dx, last.pre_y + last.adv * dy)
            }
            None => (0.0, 0.0),
        };
        self.push_at(pre_x, pre_y, u32::from(' '), 0, adv)
    }

    /// Text of the span; invalid code points become U+FFFD.
    pub fn text(&self) -> String {
        self.chars
            .iter()
            .map(|c| c.as_char().unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

fn strip_subset_prefix(name: &str) -> &str {
    match name.find('+') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

fn font_flags(name: &str) -> (bool, bool) {
    let lower = name.to_lowercase();
    let bold = lower.contains("bold");
    let italic = lower.contains("italic") || lower.contains("oblique");
    (bold, italic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(
            Matrix::IDENTITY,
            Matrix::new(10.0, 0.0, 0.0, 10.0, 0.0, 0.0),
            "ABCDEF+Helvetica-BoldOblique",
            WritingMode::Horizontal,
        )
    }

    #[test]
    fn test_font_name_and_flags() {
        let s = span();
        assert_eq!(s.font_name, "Helvetica-BoldOblique");
        assert!(s.bold);
        assert!(s.italic);

        let plain = Span::new(Matrix::IDENTITY, Matrix::IDENTITY, "Times", WritingMode::Horizontal);
        assert!(!plain.bold);
        assert!(!plain.italic);
    }

    #[test]
    fn test_adv_total() {
        let mut s = span();
        s.push_at(0.0, 0.0, 'a' as u32, 0, 0.5).unwrap();
        assert!((s.adv_total() - 5.0).abs() < 1e-5);
        s.push_at(5.0, 0.0, 'b' as u32, 0, 0.5).unwrap();
        assert!((s.adv_total() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_push_space_follows_last_char() {
        let mut s = span();
        s.push_at(0.0, 0.0, 'a' as u32, 0, 0.6).unwrap();
        s.push_space(0.0).unwrap();
        let space = s.last_char().unwrap();
        assert!(space.is_space());
        assert!((space.x - 6.0).abs() < 1e-5);
        assert_eq!(s.text(), "a ");
    }

    #[test]
    fn test_writing_mode() {
        assert_eq!(WritingMode::from_wmode(0), WritingMode::Horizontal);
        assert_eq!(WritingMode::from_wmode(1), WritingMode::Vertical);
    }
}
