//! Geometry of rotated text boxes.

use crate::model::{Page, Paragraph};

/// English Metric Units per point.
pub(crate) const EMU_PER_PT: f32 = 12700.0;

/// DrawingML angles are in 1/60000 of a degree.
const ROT_UNITS_PER_DEG: f64 = 60000.0;

/// Rotation of a paragraph's first span, `atan2(ctm.b, ctm.a)`.
pub(crate) fn paragraph_rotation(page: &Page, paragraph: &Paragraph) -> f32 {
    paragraph
        .first_line(&page.lines)
        .and_then(|line| line.first_span(&page.spans))
        .map(|span| span.ctm.rotation())
        .unwrap_or(0.0)
}

/// Placement of a rotated text box, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TextBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub angle: f32,
}

impl TextBox {
    /// Measure the box holding `paragraphs`, all rotated by `angle`.
    ///
    /// Returns `None` when the paragraphs hold no characters.
    pub fn measure(page: &Page, paragraphs: &[Paragraph], angle: f32) -> Option<Self> {
        let first_span = paragraphs
            .first()?
            .first_line(&page.lines)?
            .first_span(&page.spans)?;
        let origin = paragraphs
            .iter()
            .find_map(|p| p.first_line(&page.lines)?.first_char(&page.spans))?;
        let ctm = first_span.ctm;
        let det = ctm.a * ctm.d - ctm.b * ctm.c;
        if det == 0.0 {
            return None;
        }
        let scale = ctm.expansion();

        let mut w = 0f32;
        let mut h = 0f32;
        let spans = paragraphs
            .iter()
            .flat_map(|p| page.paragraph_lines(p))
            .flat_map(|line| line.spans.iter().map(|id| page.span(*id)));
        for span in spans {
            let Some(last) = span.last_char() else {
                continue;
            };
            let (dir_x, dir_y) = span.advance_dir();
            let (end_x, end_y) = ctm.transform_point(
                last.pre_x + last.adv * dir_x,
                last.pre_y + last.adv * dir_y,
            );
            let dx = end_x - origin.x;
            let dy = end_y - origin.y;
            let u = (ctm.d * dx - ctm.b * dy) / det * scale;
            let v = (ctm.a * dy - ctm.c * dx) / det * scale;
            w = w.max(u);
            h = h.max(v + span.font_size());
        }

        let (sin, cos) = angle.sin_cos();
        Some(Self {
            x: origin.x + w / 2.0 * cos - h / 2.0 * sin - w / 2.0,
            y: origin.y + w / 2.0 * sin + h / 2.0 * cos - h / 2.0,
            w,
            h,
            angle,
        })
    }

    /// Rotation in DrawingML units, normalized to one clockwise turn.
    pub fn rot(&self) -> i64 {
        let full = 360.0 * ROT_UNITS_PER_DEG;
        let rot = (f64::from(self.angle).to_degrees() * ROT_UNITS_PER_DEG).round();
        rot.rem_euclid(full) as i64
    }

    /// Open a floating text box anchored to the page. `id` must be unique
    /// within the document.
    pub fn open_markup(&self, id: u32) -> String {
        let x = emu(self.x);
        let y = emu(self.y);
        let cx = emu(self.w);
        let cy = emu(self.h);
        format!(
            concat!(
                "\n\n<w:p>\n<w:r><w:drawing>",
                "<wp:anchor distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\" simplePos=\"0\" ",
                "relativeHeight=\"{id}\" behindDoc=\"0\" locked=\"0\" layoutInCell=\"1\" ",
                "allowOverlap=\"1\">",
                "<wp:simplePos x=\"0\" y=\"0\"/>",
                "<wp:positionH relativeFrom=\"page\"><wp:posOffset>{x}</wp:posOffset></wp:positionH>",
                "<wp:positionV relativeFrom=\"page\"><wp:posOffset>{y}</wp:posOffset></wp:positionV>",
                "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
                "<wp:effectExtent l=\"0\" t=\"0\" r=\"0\" b=\"0\"/>",
                "<wp:wrapNone/>",
                "<wp:docPr id=\"{id}\" name=\"Text Box {id}\"/>",
                "<wp:cNvGraphicFramePr/>",
                "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
                "<a:graphicData uri=\"http://schemas.microsoft.com/office/word/2010/wordprocessingShape\">",
                "<wps:wsp><wps:cNvSpPr txBox=\"1\"/>",
                "<wps:spPr><a:xfrm rot=\"{rot}\"><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
                "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></wps:spPr>",
                "<wps:txbx><w:txbxContent>"
            ),
            id = id,
            x = x,
            y = y,
            cx = cx,
            cy = cy,
            rot = self.rot(),
        )
    }
}

/// Closes what [`TextBox::open_markup`] opened.
pub(crate) const TEXT_BOX_CLOSE: &str = concat!(
    "\n</w:txbxContent></wps:txbx>",
    "<wps:bodyPr rot=\"0\" wrap=\"none\" lIns=\"0\" tIns=\"0\" rIns=\"0\" bIns=\"0\"/>",
    "</wps:wsp></a:graphicData></a:graphic></wp:anchor></w:drawing></w:r>\n</w:p>"
);

/// Points to EMU.
pub(crate) fn emu(points: f32) -> i64 {
    (points * EMU_PER_PT).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Line, LineId, Matrix, Span, SpanId, WritingMode};
    use std::f32::consts::FRAC_PI_2;

    fn rotated_page(ctm: Matrix, text: &str) -> Page {
        let mut span = Span::new(
            ctm,
            Matrix::new(10.0, 0.0, 0.0, 10.0, 0.0, 0.0),
            "Times",
            WritingMode::Horizontal,
        );
        for (i, c) in text.chars().enumerate() {
            span.push_at(6.0 * i as f32, 0.0, c as u32, 0, 0.6).unwrap();
        }
        let mut page = Page::new();
        page.push_span(span).unwrap();
        page.lines.push(Line::single(SpanId(0)));
        page.paragraphs.push(Paragraph::single(LineId(0)));
        page
    }

    #[test]
    fn test_unrotated_box_matches_text_extent() {
        let page = rotated_page(Matrix::new(1.0, 0.0, 0.0, 1.0, 100.0, 200.0), "abcde");
        let text_box = TextBox::measure(&page, &page.paragraphs, 0.0).unwrap();
        assert!((text_box.w - 30.0).abs() < 1e-3);
        assert!((text_box.h - 10.0).abs() < 1e-3);
        assert!((text_box.x - 100.0).abs() < 1e-3);
        assert!((text_box.y - 200.0).abs() < 1e-3);
        assert_eq!(text_box.rot(), 0);
    }

    #[test]
    fn test_quarter_turn_keeps_extent() {
        let page = rotated_page(Matrix::new(0.0, 1.0, -1.0, 0.0, 100.0, 200.0), "abcde");
        let angle = paragraph_rotation(&page, &page.paragraphs[0]);
        assert!((angle - FRAC_PI_2).abs() < 1e-6);

        let text_box = TextBox::measure(&page, &page.paragraphs, angle).unwrap();
        assert!((text_box.w - 30.0).abs() < 1e-3);
        assert!((text_box.h - 10.0).abs() < 1e-3);
        // cos θ = 0, sin θ = 1
        assert!((text_box.x - (100.0 - 5.0 - 15.0)).abs() < 1e-3);
        assert!((text_box.y - (200.0 + 15.0 - 5.0)).abs() < 1e-3);
        assert_eq!(text_box.rot(), 90 * 60000);
    }

    #[test]
    fn test_markup_units() {
        let text_box = TextBox {
            x: 1.0,
            y: 2.0,
            w: 3.0,
            h: 4.0,
            angle: -FRAC_PI_2,
        };
        let markup = text_box.open_markup(7);
        assert!(markup.contains("<wp:posOffset>12700</wp:posOffset>"));
        assert!(markup.contains("<wp:posOffset>25400</wp:posOffset>"));
        assert!(markup.contains("<wp:extent cx=\"38100\" cy=\"50800\"/>"));
        assert!(markup.contains("rot=\"16200000\""));
        assert!(markup.contains("<wp:docPr id=\"7\""));
    }
}
