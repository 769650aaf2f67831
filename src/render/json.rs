//! JSON dump of a reconstructed document.

use serde::Serialize;

use crate::error::Result;
use crate::model::{Document, Image, Line, Matrix, Page, Paragraph, Span, WritingMode};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON.
///
/// Pages list their paragraphs with the text of each line and the font
/// data of each span, followed by image metadata. Image bytes are omitted.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let view = DocumentView::new(doc);
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&view)?,
        JsonFormat::Compact => serde_json::to_string(&view)?,
    };
    Ok(json)
}

#[derive(Serialize)]
struct DocumentView<'a> {
    page_count: usize,
    pages: Vec<PageView<'a>>,
}

#[derive(Serialize)]
struct PageView<'a> {
    paragraphs: Vec<ParagraphView<'a>>,
    images: &'a [Image],
}

#[derive(Serialize)]
struct ParagraphView<'a> {
    text: String,
    lines: Vec<LineView<'a>>,
}

#[derive(Serialize)]
struct LineView<'a> {
    text: String,
    spans: Vec<SpanView<'a>>,
}

#[derive(Serialize)]
struct SpanView<'a> {
    font_name: &'a str,
    font_size: f32,
    bold: bool,
    italic: bool,
    wmode: WritingMode,
    ctm: Matrix,
    trm: Matrix,
    text: String,
}

impl<'a> DocumentView<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            page_count: doc.page_count(),
            pages: doc.pages.iter().map(PageView::new).collect(),
        }
    }
}

impl<'a> PageView<'a> {
    fn new(page: &'a Page) -> Self {
        Self {
            paragraphs: page
                .paragraphs
                .iter()
                .map(|p| ParagraphView::new(page, p))
                .collect(),
            images: &page.images,
        }
    }
}

impl<'a> ParagraphView<'a> {
    fn new(page: &'a Page, paragraph: &'a Paragraph) -> Self {
        Self {
            text: page.paragraph_text(paragraph),
            lines: page
                .paragraph_lines(paragraph)
                .map(|line| LineView::new(&page.spans, line))
                .collect(),
        }
    }
}

impl<'a> LineView<'a> {
    fn new(spans: &'a [Span], line: &'a Line) -> Self {
        Self {
            text: line.text(spans),
            spans: line
                .spans
                .iter()
                .map(|id| SpanView::new(&spans[id.0]))
                .collect(),
        }
    }
}

impl<'a> SpanView<'a> {
    fn new(span: &'a Span) -> Self {
        Self {
            font_name: &span.font_name,
            font_size: span.font_size(),
            bold: span.bold,
            italic: span.italic,
            wmode: span.wmode,
            ctm: span.ctm,
            trm: span.trm,
            text: span.text(),
        }
    }
}
