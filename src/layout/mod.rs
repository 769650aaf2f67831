//! Layout reconstruction: spans into lines, lines into paragraphs.
//!
//! Both passes work on index handles into the page's span arena. They mark
//! merged items dead in a [`Tombstones`] store and compact at the end, so no
//! span is ever moved or copied while lines are being built.

mod lines;
mod paragraphs;
mod tombstone;

pub use lines::make_lines;
pub use paragraphs::{compare_paragraphs, make_paragraphs};
pub use tombstone::Tombstones;

use std::f32::consts::{PI, TAU};

use crate::error::Result;
use crate::model::{Document, Line, Page, Span};
use crate::stats::ExtractionStats;

/// Whether `line_b` may follow `line_a`.
///
/// Both lines must be non-empty, share a writing mode and the linear part
/// of their first span's CTM, and `line_b` must flow at `angle_a`.
pub(crate) fn compatible(line_a: &Line, line_b: &Line, angle_a: f32, spans: &[Span]) -> bool {
    if std::ptr::eq(line_a, line_b) {
        return false;
    }
    let (Some(span_a), Some(span_b)) = (line_a.first_span(spans), line_b.first_span(spans))
    else {
        return false;
    };
    span_a.wmode == span_b.wmode
        && span_a.ctm.same_linear(&span_b.ctm)
        && span_b.angle() == angle_a
}

/// Absolute difference between two angles, wrapped into `[0, π]`.
pub(crate) fn angle_difference(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(TAU);
    if d > PI {
        TAU - d
    } else {
        d
    }
}

/// Signed distance from `(ax, ay)` to `(bx, by)` perpendicular to a flow at
/// `angle`; positive when `b` comes later.
pub(crate) fn line_distance(ax: f32, ay: f32, bx: f32, by: f32, angle: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    dx * angle.sin() + dy * angle.cos()
}

/// Rebuild the lines and paragraphs of one page.
///
/// Any previous lines and paragraphs are replaced. On error the page keeps
/// its old structure, though spans may already carry inserted spaces.
pub fn join_page(page: &mut Page, stats: &mut ExtractionStats) -> Result<()> {
    let lines = make_lines(&mut page.spans)?;
    let paragraphs = make_paragraphs(&mut page.spans, &lines)?;

    stats.line_count += lines.len() as u32;
    stats.paragraph_count += paragraphs.len() as u32;
    page.lines = lines;
    page.paragraphs = paragraphs;
    Ok(())
}

/// Rebuild lines and paragraphs on every page of `doc`.
pub fn join_document(doc: &mut Document, stats: &mut ExtractionStats) -> Result<()> {
    for (i, page) in doc.pages.iter_mut().enumerate() {
        join_page(page, stats)?;
        log::debug!(
            "page {}: {} spans, {} lines, {} paragraphs",
            i + 1,
            page.spans.len(),
            page.lines.len(),
            page.paragraphs.len()
        );
    }
    log::info!(
        "reconstructed {} lines in {} paragraphs over {} pages",
        stats.line_count,
        stats.paragraph_count,
        doc.page_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Matrix, WritingMode};

    fn word(text: &str, x: f32, y: f32) -> Span {
        let mut span = Span::new(
            Matrix::IDENTITY,
            Matrix::new(10.0, 0.0, 0.0, 10.0, 0.0, 0.0),
            "Helvetica",
            WritingMode::Horizontal,
        );
        let pitch = 36.0 / 5.4;
        for (i, c) in text.chars().enumerate() {
            span.push_at(x + pitch * i as f32, y, c as u32, 0, pitch / 10.0)
                .unwrap();
        }
        span
    }

    fn page_of(spans: Vec<Span>) -> Page {
        let mut page = Page::new();
        for span in spans {
            page.push_span(span).unwrap();
        }
        page
    }

    #[test]
    fn test_angle_difference_wraps() {
        assert!((angle_difference(0.1, -0.1) - 0.2).abs() < 1e-6);
        assert!(angle_difference(PI - 0.01, -PI + 0.01) < 0.03);
        assert!((angle_difference(0.0, PI) - PI).abs() < 1e-6);
    }

    #[test]
    fn test_line_distance_follows_flow() {
        // Horizontal flow: later lines are further down the page.
        assert_eq!(line_distance(0.0, 0.0, 50.0, 12.0, 0.0), 12.0);
        assert_eq!(line_distance(0.0, 12.0, 0.0, 0.0, 0.0), -12.0);
    }

    #[test]
    fn test_hello_world() {
        let mut page = page_of(vec![word("Hello", 0.0, 0.0), word("world", 36.0, 0.0)]);
        let mut stats = ExtractionStats::new();
        join_page(&mut page, &mut stats).unwrap();

        assert_eq!(page.lines.len(), 1);
        assert_eq!(page.paragraphs.len(), 1);
        assert_eq!(page.plain_text(), "Hello world");
        assert_eq!(stats.line_count, 1);
        assert_eq!(stats.paragraph_count, 1);
    }

    #[test]
    fn test_span_order_does_not_matter() {
        let rows = [
            ("alpha", 0.0, 0.0),
            ("beta", 40.0, 0.0),
            ("gamma", 0.0, 12.0),
            ("delta", 0.0, 60.0),
        ];
        let orders: [[usize; 4]; 4] = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];

        let mut texts = Vec::new();
        for order in orders {
            let spans = order
                .iter()
                .map(|&i| word(rows[i].0, rows[i].1, rows[i].2))
                .collect();
            let mut page = page_of(spans);
            join_page(&mut page, &mut ExtractionStats::new()).unwrap();
            texts.push(page.plain_text());
        }

        assert_eq!(texts[0], "alpha beta gamma\ndelta");
        assert!(texts.iter().all(|t| *t == texts[0]));
    }

    #[test]
    fn test_join_document_counts_all_pages() {
        let mut doc = Document::new();
        doc.pages.push(page_of(vec![word("one", 0.0, 0.0)]));
        doc.pages.push(page_of(vec![word("two", 0.0, 0.0), word("three", 0.0, 40.0)]));
        let mut stats = ExtractionStats::new();
        join_document(&mut doc, &mut stats).unwrap();
        assert_eq!(stats.line_count, 3);
        assert_eq!(stats.paragraph_count, 3);
        assert_eq!(doc.plain_text(), "one\n\ntwo\nthree");
    }
}
