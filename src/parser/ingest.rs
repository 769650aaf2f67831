//! Building a [`Document`] from a tag stream.
//!
//! Expected structure:
//!
//! ```text
//! <page>
//!     <span ctm="a b c d e f" trm="a b c d e f" font_name=".." wmode="0">
//!         <char x=".." y=".." adv=".." ucs=".."/>
//!         ...
//!     </span>
//!     <image type="png" datasize="N">hex bytes</image>
//!     ...
//! </page>
//! ...
//! ```
//!
//! While characters are appended each span's tail is cleaned up: spurious
//! spaces are dropped and characters that do not follow on from the previous
//! one are moved into a new span. Layout reconstruction merges the pieces
//! back together.

use super::{IngestOptions, Tag, TagSource};
use crate::error::{Error, Result};
use crate::model::{Document, Image, ImageGeometry, Matrix, Page, Span, WritingMode};
use crate::stats::ExtractionStats;

/// Maximum relative error, in font sizes, before a character starts a new span.
const SPLIT_TOLERANCE: f32 = 0.01;

/// Outcome of cleaning the end of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndClean {
    Unchanged,
    /// The space before the last character was removed.
    RemovedSpace,
    /// The last character was moved into a new span.
    Split,
}

/// Read a whole tag stream into a document.
pub fn read_document<T: TagSource>(
    tags: &mut T,
    options: &IngestOptions,
    stats: &mut ExtractionStats,
) -> Result<Document> {
    Ingester {
        tags,
        options,
        stats,
        image_count: 0,
    }
    .run()
}

struct Ingester<'a, T: TagSource> {
    tags: &'a mut T,
    options: &'a IngestOptions,
    stats: &'a mut ExtractionStats,
    image_count: usize,
}

impl<T: TagSource> Ingester<'_, T> {
    fn run(mut self) -> Result<Document> {
        let mut document = Document::new();
        while let Some(tag) = self.tags.next_tag()? {
            if tag.name == "?xml" {
                continue;
            }
            if !tag.is_open("page") {
                return Err(Error::malformed(format!(
                    "expected <page> but found {}",
                    tag.describe()
                )));
            }
            log::trace!("loading spans for page {}", document.pages.len());
            let page = self.read_page()?;
            log::debug!(
                "page {}: {} spans, {} images",
                document.pages.len(),
                page.spans.len(),
                page.images.len()
            );
            self.stats.add_page();
            self.stats.span_count += page.spans.len() as u32;
            document.pages.try_reserve(1)?;
            document.pages.push(page);
        }
        log::info!(
            "read {} pages: {} spans ({} split, {} autosplit)",
            self.stats.page_count,
            self.stats.span_count,
            self.stats.split_span_count,
            self.stats.autosplit_span_count
        );
        Ok(document)
    }

    fn next_required(&mut self, context: &str) -> Result<Tag> {
        self.tags.next_tag()?.ok_or_else(|| {
            Error::malformed(format!("unexpected end of stream in {}", context))
        })
    }

    fn read_page(&mut self) -> Result<Page> {
        let mut page = Page::new();
        loop {
            let tag = self.next_required("<page>")?;
            if tag.is_close("page") {
                return Ok(page);
            }
            if tag.is_open("span") {
                self.read_span(&mut page, &tag)?;
            } else if tag.is_open("image") {
                self.read_image(&mut page, &tag)?;
            } else if !tag.is_close("image") {
                return Err(Error::malformed(format!(
                    "expected <span> or <image> but found {}",
                    tag.describe()
                )));
            }
        }
    }

    fn read_span(&mut self, page: &mut Page, tag: &Tag) -> Result<()> {
        let ctm: Matrix = tag.parse("ctm")?;
        let trm: Matrix = tag.parse("trm")?;
        let font_name = tag.require("font_name")?;
        let wmode = WritingMode::from_wmode(tag.parse("wmode")?);
        page.push_span(Span::new(ctm, trm, font_name, wmode))?;

        let mut offset_x = 0.0f32;
        let mut offset_y = 0.0f32;
        loop {
            let tag = self.next_required("<span>")?;
            if tag.is_close("span") {
                return Ok(());
            }
            if tag.is_close("char") {
                continue;
            }
            if !tag.is_open("char") {
                return Err(Error::malformed(format!(
                    "expected <char> but found {}",
                    tag.describe()
                )));
            }

            let pre_x: f32 = tag.parse("x")?;
            let pre_y: f32 = tag.parse("y")?;
            let adv: f32 = tag.parse("adv")?;
            let ucs: u32 = tag.parse("ucs")?;
            let gid: u32 = tag.parse_opt("gid")?.unwrap_or(0);

            if self.options.autosplit && pre_y - offset_y != 0.0 {
                if autosplit(page, pre_x - offset_x, pre_y - offset_y)? {
                    self.stats.autosplit_span_count += 1;
                }
                offset_x = pre_x;
                offset_y = pre_y;
            }

            let span = last_span(page)?;
            span.push_at(pre_x - offset_x, pre_y - offset_y, ucs, gid, adv)?;

            match end_clean(page)? {
                EndClean::Split => self.stats.split_span_count += 1,
                EndClean::RemovedSpace => self.stats.removed_space_count += 1,
                EndClean::Unchanged => {}
            }
        }
    }

    fn read_image(&mut self, page: &mut Page, tag: &Tag) -> Result<()> {
        let kind = tag.require("type")?;
        let geometry = read_geometry(tag)?;

        if kind == "pixmap" {
            log::debug!("skipping pixmap image, geometry {:?}", geometry);
            self.stats.add_skipped_pixmap();
            return Ok(());
        }

        let datasize: usize = tag.parse("datasize")?;
        if !self.options.extract_images {
            log::debug!("skipping {} image of {} bytes", kind, datasize);
            return Ok(());
        }

        let data = decode_hex(&tag.text)?;
        if data.len() != datasize {
            return Err(Error::malformed(format!(
                "<image> declares {} bytes but contains {}",
                datasize,
                data.len()
            )));
        }

        let mut image = Image::new(kind, data, self.image_count);
        if let Some(geometry) = geometry {
            image = image.with_geometry(geometry);
        }
        log::debug!("image {} ({}, {} bytes)", image.name, image.kind, datasize);
        self.image_count += 1;
        self.stats.add_image();
        page.images.try_reserve(1)?;
        page.images.push(image);
        Ok(())
    }
}

fn last_span(page: &mut Page) -> Result<&mut Span> {
    page.spans
        .last_mut()
        .ok_or_else(|| Error::malformed("<char> outside of a span"))
}

/// Move the current span's origin to the text-space point `(dx, dy)`
/// relative to the previous origin, starting a new span if the current one
/// already has characters. Returns true if a span was added.
fn autosplit(page: &mut Page, dx: f32, dy: f32) -> Result<bool> {
    let span = last_span(page)?;
    let e = span.ctm.e + span.ctm.a * dx + span.ctm.b * dy;
    let f = span.ctm.f + span.ctm.c * dx + span.ctm.d * dy;
    let mut added = false;
    if !span.is_empty() {
        let copy = span.empty_like();
        page.push_span(copy)?;
        added = true;
    }
    let span = last_span(page)?;
    log::trace!(
        "autosplit: ctm translation ({}, {}) -> ({}, {})",
        span.ctm.e,
        span.ctm.f,
        e,
        f
    );
    span.ctm.e = e;
    span.ctm.f = f;
    Ok(added)
}

/// Examine the last two characters of the page's last span.
///
/// If the penultimate character is a space that the last character
/// overlaps, or the gap it leaves is implausibly narrow, the space is
/// removed. Otherwise, if the last character is not where the previous
/// character's advance predicts, it is moved into a new span with the same
/// matrices and font.
pub fn end_clean(page: &mut Page) -> Result<EndClean> {
    let span = match page.spans.last_mut() {
        Some(span) => span,
        None => return Ok(EndClean::Unchanged),
    };
    let n = span.chars.len();
    if n < 2 {
        return Ok(EndClean::Unchanged);
    }

    let font_size = span.font_size();
    let (dir_x, dir_y) = span.advance_dir();
    let prev = span.chars[n - 2];
    let last = span.chars[n - 1];
    let predicted_x = prev.pre_x + prev.adv * dir_x;
    let predicted_y = prev.pre_y + prev.adv * dir_y;
    let err_x = (last.pre_x - predicted_x) / font_size;
    let err_y = (last.pre_y - predicted_y) / font_size;

    if prev.is_space() {
        let overlaps = err_x < -prev.adv / 2.0 && err_x > -prev.adv;
        let narrow = (last.pre_x - prev.pre_x) / font_size < last.adv / 10.0;
        if overlaps || narrow {
            log::trace!("removing space before final char in '{}'", span.text());
            span.chars.remove(n - 2);
            return Ok(EndClean::RemovedSpace);
        }
        return Ok(EndClean::Unchanged);
    }

    if err_x.abs() > SPLIT_TOLERANCE || err_y.abs() > SPLIT_TOLERANCE {
        log::trace!(
            "splitting last char into new span: err=({}, {}) in '{}'",
            err_x,
            err_y,
            span.text()
        );
        let mut split = span.empty_like();
        if let Some(c) = span.chars.pop() {
            split.push_char(c)?;
        }
        page.push_span(split)?;
        return Ok(EndClean::Split);
    }

    Ok(EndClean::Unchanged)
}

fn read_geometry(tag: &Tag) -> Result<Option<ImageGeometry>> {
    let x = tag.parse_opt("x")?;
    let y = tag.parse_opt("y")?;
    let w = tag.parse_opt("w")?;
    let h = tag.parse_opt("h")?;
    Ok(match (x, y, w, h) {
        (Some(x), Some(y), Some(w), Some(h)) => Some(ImageGeometry { x, y, w, h }),
        _ => None,
    })
}

/// Decode lowercase (or uppercase) hex, ignoring whitespace.
fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(Error::malformed("odd number of hex digits in <image>"));
    }
    let mut out = Vec::new();
    out.try_reserve_exact(digits.len() / 2)?;
    for pair in digits.chunks_exact(2) {
        let hi = hex_value(pair[0])?;
        let lo = hex_value(pair[1])?;
        out.push(hi << 4 | lo);
    }
    Ok(out)
}

fn hex_value(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(Error::malformed(format!(
            "bad hex digit '{}' in <image>",
            digit as char
        ))),
    }
}
