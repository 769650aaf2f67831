//! Joining spans into lines.

use super::tombstone::Tombstones;
use super::{angle_difference, compatible};
use crate::error::Result;
use crate::model::{Character, Line, Span, SpanId};

/// Lines whose end-to-start vector deviates from the flow angle by more
/// than this are not joined.
const ANGLE_TOLERANCE_DEG: f32 = 1.0;

/// A gap wider than this fraction of the average advance gets a space.
const SPACE_GAP_RATIO: f32 = 0.25;

/// Distance from the end of `a` to the start of `b`.
fn spans_adv(span_a: &Span, a: &Character, b: &Character) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt() - a.adv * span_a.trm.expansion()
}

/// Group spans into lines.
///
/// Starts with one line per span, then repeatedly appends to each line the
/// nearest compatible line that starts where it ends, in the direction of
/// its flow angle. A space is inserted at the join when the gap is wide
/// relative to the average character advance. Lines without any characters
/// are dropped. The order of the returned lines is unspecified.
pub fn make_lines(spans: &mut [Span]) -> Result<Vec<Line>> {
    let mut lines = Tombstones::build(spans.len(), |i| Line::single(SpanId(i)))?;
    let n = lines.len();
    let mut joins = 0usize;

    let mut a = 0;
    while a < n {
        let Some(nearest) = find_nearest(&lines, spans, a) else {
            a += 1;
            continue;
        };
        join(&mut lines, spans, a, nearest)?;
        joins += 1;
        // A line taken from further on has not been extended yet, so the
        // combined line needs another look.
        if nearest.index < a {
            a += 1;
        }
    }

    let mut result = lines.compact();
    result.retain(|line| line.first_char(spans).is_some());
    log::debug!(
        "turned {} spans into {} lines ({} joins)",
        spans.len(),
        result.len(),
        joins
    );
    Ok(result)
}

#[derive(Debug, Clone, Copy)]
struct Nearest {
    index: usize,
    adv: f32,
}

fn find_nearest(lines: &Tombstones<Line>, spans: &[Span], a: usize) -> Option<Nearest> {
    let line_a = lines.get(a)?;
    let span_a = line_a.last_span(spans)?;
    let last_a = span_a.last_char()?;
    let angle_a = span_a.angle();

    let mut nearest: Option<Nearest> = None;
    for b in 0..lines.len() {
        if b == a {
            continue;
        }
        let Some(line_b) = lines.get(b) else {
            continue;
        };
        if !compatible(line_a, line_b, angle_a, spans) {
            continue;
        }
        let Some(first_b) = line_b.first_span(spans).and_then(Span::first_char) else {
            continue;
        };

        let dx = first_b.x - last_a.x;
        let dy = first_b.y - last_a.y;
        let angle_a_b = (-dy).atan2(dx);
        if angle_difference(angle_a_b, angle_a).to_degrees() > ANGLE_TOLERANCE_DEG {
            continue;
        }

        let adv = spans_adv(span_a, last_a, first_b);
        if nearest.map_or(true, |best| adv < best.adv) {
            nearest = Some(Nearest { index: b, adv });
        }
    }
    nearest
}

fn join(
    lines: &mut Tombstones<Line>,
    spans: &mut [Span],
    a: usize,
    nearest: Nearest,
) -> Result<()> {
    let Some(line_b) = lines.take(nearest.index) else {
        return Ok(());
    };
    let Some(line_a) = lines.get_mut(a) else {
        return Ok(());
    };
    let (Some(&span_a_id), Some(&span_b_id)) = (line_a.spans.last(), line_b.spans.first())
    else {
        return Ok(());
    };

    let span_a = &spans[span_a_id.0];
    let span_b = &spans[span_b_id.0];
    if let (Some(last_a), Some(first_b)) = (span_a.last_char(), span_b.first_char()) {
        if !last_a.is_space() && !first_b.is_space() {
            let average_adv = (span_a.adv_total() + span_b.adv_total())
                / (span_a.chars.len() + span_b.chars.len()) as f32;
            if nearest.adv > SPACE_GAP_RATIO * average_adv {
                let scale = span_a.trm.expansion();
                let adv = if scale > 0.0 { nearest.adv / scale } else { 0.0 };
                log::trace!(
                    "inserting space between '{}' and '{}': gap {} average {}",
                    span_a.text(),
                    span_b.text(),
                    nearest.adv,
                    average_adv
                );
                spans[span_a_id.0].push_space(adv)?;
            }
        }
    }

    line_a.spans.try_reserve(line_b.spans.len())?;
    line_a.spans.extend(line_b.spans);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Matrix, WritingMode};

    fn span_at(text: &str, x: f32, y: f32, pitch: f32) -> Span {
        let mut span = Span::new(
            Matrix::IDENTITY,
            Matrix::new(10.0, 0.0, 0.0, 10.0, 0.0, 0.0),
            "Times",
            WritingMode::Horizontal,
        );
        for (i, c) in text.chars().enumerate() {
            span.push_at(x + pitch * i as f32, y, c as u32, 0, pitch / 10.0).unwrap();
        }
        span
    }

    fn texts(lines: &[Line], spans: &[Span]) -> Vec<String> {
        let mut texts: Vec<_> = lines.iter().map(|l| l.text(spans)).collect();
        texts.sort();
        texts
    }

    #[test]
    fn test_adjacent_spans_join_without_space() {
        let mut spans = vec![span_at("abc", 15.0, 0.0, 5.0), span_at("xy", 5.0, 0.0, 5.0)];
        let lines = make_lines(&mut spans).unwrap();
        assert_eq!(texts(&lines, &spans), ["xyabc"]);
    }

    #[test]
    fn test_wide_gap_inserts_space() {
        let mut spans = vec![span_at("ab", 0.0, 0.0, 5.0), span_at("cd", 20.0, 0.0, 5.0)];
        let lines = make_lines(&mut spans).unwrap();
        assert_eq!(texts(&lines, &spans), ["ab cd"]);
    }

    #[test]
    fn test_existing_space_not_doubled() {
        let mut spans = vec![span_at("ab ", 0.0, 0.0, 5.0), span_at("cd", 30.0, 0.0, 5.0)];
        let lines = make_lines(&mut spans).unwrap();
        assert_eq!(texts(&lines, &spans), ["ab cd"]);
    }

    #[test]
    fn test_different_baselines_stay_apart() {
        let mut spans = vec![span_at("top", 0.0, 0.0, 5.0), span_at("bottom", 0.0, 14.0, 5.0)];
        let lines = make_lines(&mut spans).unwrap();
        assert_eq!(texts(&lines, &spans), ["bottom", "top"]);
    }

    #[test]
    fn test_incompatible_matrices_stay_apart() {
        let mut spans = vec![span_at("ab", 0.0, 0.0, 5.0), span_at("cd", 10.0, 0.0, 5.0)];
        spans[1].ctm = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let lines = make_lines(&mut spans).unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_empty_spans_dropped() {
        let mut spans = vec![span_at("", 0.0, 0.0, 5.0), span_at("a", 0.0, 0.0, 5.0)];
        let lines = make_lines(&mut spans).unwrap();
        assert_eq!(texts(&lines, &spans), ["a"]);
    }
}
