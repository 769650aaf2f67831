//! WordprocessingML content emission.

use crate::error::Result;
use crate::model::{Character, Document, Image, Line, Matrix, Page, Paragraph, Span};

use super::rotation::{emu, paragraph_rotation, TextBox, TEXT_BOX_CLOSE};
use super::ContentOptions;

/// Side length of an image without geometry, in points.
const DEFAULT_IMAGE_SIZE: f32 = 144.0;

/// Font of the empty spacing paragraphs.
const SPACING_FONT: &str = "OpenSans";
const SPACING_FONT_SIZE: f32 = 10.0;

/// Convert a reconstructed document to a `<w:body>` content fragment.
pub fn document_to_docx_content(doc: &Document, options: &ContentOptions) -> Result<String> {
    let renderer = DocxRenderer::new(options.clone());
    renderer.render(doc)
}

/// Font state shared by consecutive characters of one run.
#[derive(Debug, Clone, PartialEq)]
struct RunStyle<'a> {
    font_name: &'a str,
    bold: bool,
    italic: bool,
    font_size: f32,
}

impl<'a> RunStyle<'a> {
    fn of(span: &'a Span) -> Self {
        Self {
            font_name: &span.font_name,
            bold: span.bold,
            italic: span.italic,
            font_size: rounded_font_size(span),
        }
    }
}

/// `|TRM|·|CTM|` rounded to two decimals.
fn rounded_font_size(span: &Span) -> f32 {
    (span.font_size() * 100.0).round() / 100.0
}

/// WordprocessingML content renderer.
pub struct DocxRenderer {
    options: ContentOptions,
    out: String,
    drawing_id: u32,
}

impl DocxRenderer {
    /// Create a new renderer.
    pub fn new(options: ContentOptions) -> Self {
        Self {
            options,
            out: String::new(),
            drawing_id: 0,
        }
    }

    /// Render a document to a content fragment.
    pub fn render(mut self, doc: &Document) -> Result<String> {
        for (i, page) in doc.pages.iter().enumerate() {
            log::debug!(
                "emitting page {}: {} paragraphs, {} images",
                i + 1,
                page.paragraphs.len(),
                page.images.len()
            );
            self.render_page(page)?;
        }
        Ok(self.out)
    }

    fn render_page(&mut self, page: &Page) -> Result<()> {
        let mut ctm_prev: Option<Matrix> = None;
        let mut i = 0;
        while i < page.paragraphs.len() {
            let paragraph = &page.paragraphs[i];
            let angle = paragraph_rotation(page, paragraph);

            if self.options.rotation && angle != 0.0 {
                let end = page.paragraphs[i..]
                    .iter()
                    .position(|p| paragraph_rotation(page, p) != angle)
                    .map_or(page.paragraphs.len(), |n| i + n);
                self.render_text_box(page, &page.paragraphs[i..end], angle)?;
                ctm_prev = last_ctm(page, &page.paragraphs[end - 1]).or(ctm_prev);
                i = end;
                continue;
            }

            if self.options.spacing {
                let first_ctm = first_ctm(page, paragraph);
                if let (Some(prev), Some(first)) = (ctm_prev, first_ctm) {
                    if !prev.same_linear(&first) {
                        self.empty_paragraph()?;
                    }
                }
                self.empty_paragraph()?;
            }
            self.render_paragraph(page, paragraph)?;
            ctm_prev = last_ctm(page, paragraph).or(ctm_prev);
            i += 1;
        }

        if self.options.images {
            for image in &page.images {
                self.render_image(image)?;
            }
        }
        Ok(())
    }

    fn render_text_box(
        &mut self,
        page: &Page,
        paragraphs: &[Paragraph],
        angle: f32,
    ) -> Result<()> {
        let Some(text_box) = TextBox::measure(page, paragraphs, angle) else {
            for paragraph in paragraphs {
                self.render_paragraph(page, paragraph)?;
            }
            return Ok(());
        };
        log::trace!(
            "text box of {} paragraphs at ({}, {}) size {}x{} rotated {}°",
            paragraphs.len(),
            text_box.x,
            text_box.y,
            text_box.w,
            text_box.h,
            angle.to_degrees()
        );
        let id = self.next_drawing_id();
        self.push(&text_box.open_markup(id))?;
        for paragraph in paragraphs {
            self.render_paragraph(page, paragraph)?;
        }
        self.push(TEXT_BOX_CLOSE)
    }

    fn render_paragraph(&mut self, page: &Page, paragraph: &Paragraph) -> Result<()> {
        self.push("\n\n<w:p>")?;
        let mut run: Option<RunStyle<'_>> = None;
        for line in page.paragraph_lines(paragraph) {
            self.render_line(page, line, &mut run)?;
        }
        if run.is_some() {
            self.run_finish()?;
        }
        self.push("\n</w:p>")
    }

    fn render_line<'p>(
        &mut self,
        page: &'p Page,
        line: &Line,
        run: &mut Option<RunStyle<'p>>,
    ) -> Result<()> {
        for id in &line.spans {
            let span = page.span(*id);
            if span.is_empty() {
                continue;
            }
            let style = RunStyle::of(span);
            if run.as_ref() != Some(&style) {
                if run.is_some() {
                    self.run_finish()?;
                }
                self.run_start(&style)?;
                *run = Some(style);
            }
            for c in &span.chars {
                self.push_char(c)?;
            }
        }
        let ends_in_hyphen = line
            .last_char(&page.spans)
            .map_or(false, Character::is_hyphen);
        if ends_in_hyphen && self.out.ends_with('-') {
            self.out.pop();
        }
        Ok(())
    }

    fn run_start(&mut self, style: &RunStyle<'_>) -> Result<()> {
        let font = escape_xml(style.font_name);
        let half_points = (style.font_size * 2.0).round() as i64;
        let mut markup = format!(
            "\n<w:r><w:rPr><w:rFonts w:ascii=\"{}\" w:hAnsi=\"{}\"/>",
            font, font
        );
        if style.bold {
            markup.push_str("<w:b/>");
        }
        if style.italic {
            markup.push_str("<w:i/>");
        }
        markup.push_str(&format!(
            "<w:sz w:val=\"{}\"/><w:szCs w:val=\"{}\"/></w:rPr><w:t xml:space=\"preserve\">",
            half_points, half_points
        ));
        self.push(&markup)
    }

    fn run_finish(&mut self) -> Result<()> {
        self.push("</w:t></w:r>")
    }

    /// An empty paragraph used for vertical spacing.
    fn empty_paragraph(&mut self) -> Result<()> {
        self.push("\n\n<w:p>")?;
        self.run_start(&RunStyle {
            font_name: SPACING_FONT,
            bold: false,
            italic: false,
            font_size: SPACING_FONT_SIZE,
        })?;
        self.run_finish()?;
        self.push("\n</w:p>")
    }

    fn render_image(&mut self, image: &Image) -> Result<()> {
        let (w, h) = image
            .geometry
            .map_or((DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE), |g| (g.w, g.h));
        let cx = emu(w);
        let cy = emu(h);
        let id = self.next_drawing_id();
        let name = escape_xml(&image.name);
        let markup = format!(
            concat!(
                "\n\n<w:p>\n<w:r><w:drawing>",
                "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
                "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
                "<wp:effectExtent l=\"0\" t=\"0\" r=\"0\" b=\"0\"/>",
                "<wp:docPr id=\"{id}\" name=\"Picture {id}\"/>",
                "<wp:cNvGraphicFramePr>",
                "<a:graphicFrameLocks xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" noChangeAspect=\"1\"/>",
                "</wp:cNvGraphicFramePr>",
                "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
                "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
                "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
                "<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>",
                "<pic:blipFill><a:blip r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
                "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
                "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
                "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>\n</w:p>"
            ),
            cx = cx,
            cy = cy,
            id = id,
            name = name,
            rel = image.id,
        );
        self.push(&markup)
    }

    fn next_drawing_id(&mut self) -> u32 {
        self.drawing_id += 1;
        self.drawing_id
    }

    fn push_char(&mut self, c: &Character) -> Result<()> {
        match c.ucs {
            0x3C => self.push("&lt;"),
            0x3E => self.push("&gt;"),
            0x26 => self.push("&amp;"),
            0x22 => self.push("&quot;"),
            0x27 => self.push("&apos;"),
            0xFB00 => self.push("ff"),
            0xFB01 => self.push("fi"),
            0xFB02 => self.push("fl"),
            0xFB03 => self.push("ffi"),
            0xFB04 => self.push("ffl"),
            0x20..=0x7E => {
                self.out.try_reserve(1)?;
                self.out.push(c.ucs as u8 as char);
                Ok(())
            }
            ucs => self.push(&format!("&#x{:x};", ucs)),
        }
    }

    fn push(&mut self, s: &str) -> Result<()> {
        self.out.try_reserve(s.len())?;
        self.out.push_str(s);
        Ok(())
    }
}

fn first_ctm(page: &Page, paragraph: &Paragraph) -> Option<Matrix> {
    paragraph
        .first_line(&page.lines)?
        .first_span(&page.spans)
        .map(|span| span.ctm)
}

fn last_ctm(page: &Page, paragraph: &Paragraph) -> Option<Matrix> {
    paragraph
        .last_line(&page.lines)?
        .last_span(&page.spans)
        .map(|span| span.ctm)
}

/// Escape the five XML metacharacters.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
