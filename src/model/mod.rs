//! Document model for positioned-glyph content.
//!
//! A [`Document`] owns its [`Page`]s; each page owns its [`Span`]s (and
//! through them every [`Character`]) plus its [`Image`]s. [`Line`] and
//! [`Paragraph`] are handle lists over a page's spans and lines, so they can
//! be rebuilt or dropped without touching the character data.

mod document;
mod image;
mod matrix;
mod page;
mod span;

pub use document::Document;
pub use image::{Image, ImageGeometry};
pub use matrix::Matrix;
pub use page::{Line, LineId, Page, Paragraph, SpanId};
pub use span::{Character, Span, WritingMode};
