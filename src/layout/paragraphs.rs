//! Joining lines into paragraphs.

use std::cmp::Ordering;
use std::f32::consts::FRAC_PI_2;

use super::tombstone::Tombstones;
use super::{compatible, line_distance};
use crate::error::Result;
use crate::model::{Line, LineId, Paragraph, Span};

/// Lines further apart than this many font sizes start a new paragraph.
const LINE_GAP_RATIO: f32 = 1.5;

/// Group lines into paragraphs and sort them into reading order.
///
/// Each paragraph is joined with the nearest compatible paragraph that
/// starts after it along the flow direction, provided the gap is less than
/// 1.5 times the font size of that paragraph's first line. A trailing
/// hyphen on the earlier paragraph is removed at the join; otherwise a
/// space is appended.
pub fn make_paragraphs(spans: &mut [Span], lines: &[Line]) -> Result<Vec<Paragraph>> {
    let mut paragraphs = Tombstones::build(lines.len(), |i| Paragraph::single(LineId(i)))?;
    let n = paragraphs.len();
    let mut joins = 0usize;

    let mut a = 0;
    while a < n {
        let Some((b, distance)) = find_nearest(&paragraphs, lines, spans, a) else {
            a += 1;
            continue;
        };

        let size_b = paragraphs
            .get(b)
            .and_then(|p| p.first_line(lines))
            .map(|line| line.font_size_max(spans))
            .unwrap_or(0.0);
        if distance >= LINE_GAP_RATIO * size_b {
            log::trace!(
                "not joining paragraphs {} and {}: distance {} font size {}",
                a,
                b,
                distance,
                size_b
            );
            a += 1;
            continue;
        }

        join(&mut paragraphs, lines, spans, a, b)?;
        joins += 1;
        if b < a {
            a += 1;
        }
    }

    let mut result = paragraphs.compact();
    sort_paragraphs(&mut result, lines, spans);
    log::debug!(
        "turned {} lines into {} paragraphs ({} joins)",
        lines.len(),
        result.len(),
        joins
    );
    Ok(result)
}

fn find_nearest(
    paragraphs: &Tombstones<Paragraph>,
    lines: &[Line],
    spans: &[Span],
    a: usize,
) -> Option<(usize, f32)> {
    let line_a = paragraphs.get(a)?.last_line(lines)?;
    let angle_a = line_a.angle(spans);
    let origin = line_a.first_char(spans)?;

    let mut nearest: Option<(usize, f32)> = None;
    for b in 0..paragraphs.len() {
        if b == a {
            continue;
        }
        let Some(line_b) = paragraphs.get(b).and_then(|p| p.first_line(lines)) else {
            continue;
        };
        if !compatible(line_a, line_b, angle_a, spans) {
            continue;
        }
        let Some(start_b) = line_b.first_char(spans) else {
            continue;
        };
        let distance = line_distance(origin.x, origin.y, start_b.x, start_b.y, angle_a);
        if distance > 0.0 && nearest.map_or(true, |(_, best)| distance < best) {
            nearest = Some((b, distance));
        }
    }
    nearest
}

fn join(
    paragraphs: &mut Tombstones<Paragraph>,
    lines: &[Line],
    spans: &mut [Span],
    a: usize,
    b: usize,
) -> Result<()> {
    let Some(paragraph_b) = paragraphs.take(b) else {
        return Ok(());
    };
    let Some(paragraph_a) = paragraphs.get_mut(a) else {
        return Ok(());
    };

    if let Some(line_a) = paragraph_a.last_line(lines) {
        let tail = line_a
            .spans
            .iter()
            .rev()
            .copied()
            .find(|id| !spans[id.0].is_empty());
        if let Some(id) = tail {
            let span = &mut spans[id.0];
            if span.last_char().is_some_and(|c| c.is_hyphen()) {
                span.chars.pop();
            } else {
                span.push_space(0.0)?;
            }
        }
    }

    paragraph_a.lines.try_reserve(paragraph_b.lines.len())?;
    paragraph_a.lines.extend(paragraph_b.lines);
    Ok(())
}

/// Reading-order comparison of two paragraphs.
///
/// Paragraphs with different CTMs are grouped by the CTM's linear part.
/// Within a group the paragraph whose first line comes earlier along the
/// flow direction sorts first; paragraphs more than 90° apart compare equal.
pub fn compare_paragraphs(
    a: &Paragraph,
    b: &Paragraph,
    lines: &[Line],
    spans: &[Span],
) -> Ordering {
    let (Some(line_a), Some(line_b)) = (a.first_line(lines), b.first_line(lines)) else {
        return Ordering::Equal;
    };
    let (Some(span_a), Some(span_b)) = (line_a.first_span(spans), line_b.first_span(spans))
    else {
        return Ordering::Equal;
    };

    let by_ctm = span_a.ctm.cmp4(&span_b.ctm);
    if by_ctm != Ordering::Equal {
        return by_ctm;
    }

    let angle_a = line_a.angle(spans);
    let angle_b = line_b.angle(spans);
    if (angle_a - angle_b).abs() > FRAC_PI_2 {
        return Ordering::Equal;
    }
    let angle = (angle_a + angle_b) / 2.0;

    let (Some(start_a), Some(start_b)) = (line_a.first_char(spans), line_b.first_char(spans))
    else {
        return Ordering::Equal;
    };
    let distance = line_distance(start_a.x, start_a.y, start_b.x, start_b.y, angle);
    if distance > 0.0 {
        Ordering::Less
    } else if distance < 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Stable insertion sort with [`compare_paragraphs`].
///
/// The comparison is not a total order, so a library sort could reorder
/// arbitrarily or panic; insertion sort gives a well-defined result.
fn sort_paragraphs(paragraphs: &mut [Paragraph], lines: &[Line], spans: &[Span]) {
    for i in 1..paragraphs.len() {
        let mut j = i;
        while j > 0
            && compare_paragraphs(&paragraphs[j - 1], &paragraphs[j], lines, spans)
                == Ordering::Greater
        {
            paragraphs.swap(j - 1, j);
            j -= 1;
        }
    }
}
