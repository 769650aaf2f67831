//! Glyph stream parsing.

mod ingest;
mod options;
mod tags;

pub use ingest::{end_clean, read_document, EndClean};
pub use options::IngestOptions;
pub use tags::{Tag, TagSource, XmlTagReader};
