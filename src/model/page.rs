//! Page-level types: the span arena and the line/paragraph views over it.

use serde::{Deserialize, Serialize};

use super::{Character, Image, Span, WritingMode};
use crate::error::Result;

/// Index of a span in [`Page::spans`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(pub usize);

/// Index of a line in [`Page::lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub usize);

/// Spans judged to lie on one line, in reading order.
///
/// A line only holds handles; its spans are owned by the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub spans: Vec<SpanId>,
}

impl Line {
    /// Line holding a single span.
    pub fn single(span: SpanId) -> Self {
        Self { spans: vec![span] }
    }

    pub fn first_span<'a>(&self, spans: &'a [Span]) -> Option<&'a Span> {
        self.spans.first().map(|id| &spans[id.0])
    }

    pub fn last_span<'a>(&self, spans: &'a [Span]) -> Option<&'a Span> {
        self.spans.last().map(|id| &spans[id.0])
    }

    /// First character of the line, skipping empty spans.
    pub fn first_char<'a>(&self, spans: &'a [Span]) -> Option<&'a Character> {
        self.spans.iter().find_map(|id| spans[id.0].first_char())
    }

    /// Last character of the line, skipping empty spans.
    pub fn last_char<'a>(&self, spans: &'a [Span]) -> Option<&'a Character> {
        self.spans.iter().rev().find_map(|id| spans[id.0].last_char())
    }

    /// Angle of the first span.
    pub fn angle(&self, spans: &[Span]) -> f32 {
        self.first_span(spans).map(Span::angle).unwrap_or(0.0)
    }

    pub fn wmode(&self, spans: &[Span]) -> WritingMode {
        self.first_span(spans).map(|s| s.wmode).unwrap_or_default()
    }

    /// Largest TRM scale among the line's spans.
    pub fn font_size_max(&self, spans: &[Span]) -> f32 {
        self.spans
            .iter()
            .map(|id| spans[id.0].trm.expansion())
            .fold(0.0, f32::max)
    }

    pub fn text(&self, spans: &[Span]) -> String {
        self.spans.iter().map(|id| spans[id.0].text()).collect()
    }
}

/// Lines judged to form one paragraph, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub lines: Vec<LineId>,
}

impl Paragraph {
    /// Paragraph holding a single line.
    pub fn single(line: LineId) -> Self {
        Self { lines: vec![line] }
    }

    pub fn first_line<'a>(&self, lines: &'a [Line]) -> Option<&'a Line> {
        self.lines.first().map(|id| &lines[id.0])
    }

    pub fn last_line<'a>(&self, lines: &'a [Line]) -> Option<&'a Line> {
        self.lines.last().map(|id| &lines[id.0])
    }
}

/// A single page: owns its spans and images.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Spans in stream order
    pub spans: Vec<Span>,

    /// Images in stream order
    pub images: Vec<Image>,

    /// Lines over `spans`, filled by layout reconstruction
    pub lines: Vec<Line>,

    /// Paragraphs over `lines`, filled by layout reconstruction
    pub paragraphs: Vec<Paragraph>,
}

impl Page {
    /// Create an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a span, returning its handle.
    pub fn push_span(&mut self, span: Span) -> Result<SpanId> {
        self.spans.try_reserve(1)?;
        self.spans.push(span);
        Ok(SpanId(self.spans.len() - 1))
    }

    pub fn span(&self, id: SpanId) -> &Span {
        &self.spans[id.0]
    }

    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.0]
    }

    /// Lines of a paragraph, in order.
    pub fn paragraph_lines<'a>(
        &'a self,
        paragraph: &'a Paragraph,
    ) -> impl Iterator<Item = &'a Line> + 'a {
        paragraph.lines.iter().map(move |id| &self.lines[id.0])
    }

    /// Text of a paragraph with its lines concatenated.
    pub fn paragraph_text(&self, paragraph: &Paragraph) -> String {
        self.paragraph_lines(paragraph)
            .map(|line| line.text(&self.spans))
            .collect()
    }

    /// Plain text of the page: one paragraph per line of output.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| self.paragraph_text(p))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Total number of characters in all spans.
    pub fn char_count(&self) -> usize {
        self.spans.iter().map(|s| s.chars.len()).sum()
    }

    /// Check if the page has no spans and no images.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Matrix;

    fn page_with(texts: &[&str]) -> Page {
        let mut page = Page::new();
        for text in texts {
            let mut span = Span::new(
                Matrix::IDENTITY,
                Matrix::IDENTITY,
                "Times",
                WritingMode::Horizontal,
            );
            for (i, c) in text.chars().enumerate() {
                span.push_at(i as f32, 0.0, c as u32, 0, 1.0).unwrap();
            }
            page.push_span(span).unwrap();
        }
        page
    }

    #[test]
    fn test_line_views() {
        let mut page = page_with(&["", "ab", "cd"]);
        page.lines.push(Line {
            spans: vec![SpanId(0), SpanId(1), SpanId(2)],
        });
        let line = &page.lines[0];
        assert_eq!(line.text(&page.spans), "abcd");
        assert_eq!(line.first_char(&page.spans).unwrap().ucs, 'a' as u32);
        assert_eq!(line.last_char(&page.spans).unwrap().ucs, 'd' as u32);
    }

    #[test]
    fn test_paragraph_text() {
        let mut page = page_with(&["one ", "two"]);
        page.lines.push(Line::single(SpanId(0)));
        page.lines.push(Line::single(SpanId(1)));
        page.paragraphs.push(Paragraph {
            lines: vec![LineId(0), LineId(1)],
        });
        assert_eq!(page.plain_text(), "one two");
        assert_eq!(page.char_count(), 7);
    }
}
