//! # glyphdocx
//!
//! Rebuilds readable documents from positioned-glyph streams and writes
//! them as `.docx` packages.
//!
//! The input is a stream of `page`, `span`, `char` and `image` tags as
//! produced by a PDF interpreter. Characters are grouped into lines and
//! paragraphs from their geometry alone, then emitted as WordprocessingML
//! runs and packed into a store-only ZIP.
//!
//! ## Quick Start
//!
//! ```no_run
//! use glyphdocx::{ContentOptions, IngestOptions};
//!
//! fn main() -> glyphdocx::Result<()> {
//!     let mut doc = glyphdocx::read_file("page.xml", &IngestOptions::default())?;
//!     glyphdocx::join_document(&mut doc)?;
//!
//!     let content = glyphdocx::document_to_docx_content(&doc, &ContentOptions::default())?;
//!     glyphdocx::write_docx(&content, &doc, "page.docx")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - [`parser`]: tag stream to [`Document`] (spans of positioned characters)
//! - [`layout`]: spans to lines, lines to paragraphs in reading order
//! - [`render`]: paragraphs to a `<w:body>` content fragment, or JSON
//! - [`package`]: content spliced into a template and zipped by [`archive`]
//! - [`buffer`]: the byte streams everything reads from and writes to

pub mod archive;
pub mod buffer;
pub mod error;
pub mod layout;
pub mod model;
pub mod package;
pub mod parser;
pub mod render;
pub mod stats;

// Re-export commonly used types
pub use buffer::{ReadBuffer, Sink, Source, Status, WriteBuffer};
pub use error::{Error, Result};
pub use model::{Character, Document, Image, Line, Matrix, Page, Paragraph, Span, WritingMode};
pub use package::{docx_content_to_docx, docx_from_template, Template};
pub use parser::{IngestOptions, TagSource, XmlTagReader};
pub use render::{document_to_docx_content, to_json, ContentOptions, JsonFormat};
pub use stats::ExtractionStats;

use std::path::Path;

use crate::buffer::{FileSink, FileSource, MemorySource};

/// Build a document from a tag stream.
///
/// Lines and paragraphs are left empty; see [`join_document`].
///
/// # Example
///
/// ```
/// use glyphdocx::{IngestOptions, XmlTagReader};
///
/// let xml = r#"<page><span ctm="1 0 0 1 0 0" trm="10 0 0 10 0 0" font_name="Times" wmode="0">
///     <char x="0" y="0" adv="0.5" ucs="72"/></span></page>"#;
/// let doc = glyphdocx::intermediate_to_document(
///     XmlTagReader::from_str(xml),
///     &IngestOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(doc.page_count(), 1);
/// ```
pub fn intermediate_to_document<T: TagSource>(
    source: T,
    options: &IngestOptions,
) -> Result<Document> {
    let mut stats = ExtractionStats::new();
    intermediate_to_document_with_stats(source, options, &mut stats)
}

/// Build a document from a tag stream, counting into `stats`.
pub fn intermediate_to_document_with_stats<T: TagSource>(
    mut source: T,
    options: &IngestOptions,
    stats: &mut ExtractionStats,
) -> Result<Document> {
    parser::read_document(&mut source, options, stats)
}

/// Read a document from an intermediate file.
pub fn read_file<P: AsRef<Path>>(path: P, options: &IngestOptions) -> Result<Document> {
    let mut stats = ExtractionStats::new();
    read_file_with_stats(path, options, &mut stats)
}

/// Read a document from an intermediate file, counting into `stats`.
pub fn read_file_with_stats<P: AsRef<Path>>(
    path: P,
    options: &IngestOptions,
    stats: &mut ExtractionStats,
) -> Result<Document> {
    let source = FileSource::open(path.as_ref())?;
    let reader = XmlTagReader::from_buffer(ReadBuffer::open(source));
    intermediate_to_document_with_stats(reader, options, stats)
}

/// Read a document from intermediate data held in memory.
pub fn read_bytes(data: &[u8], options: &IngestOptions) -> Result<Document> {
    let source = MemorySource::new(data);
    let reader = XmlTagReader::from_buffer(ReadBuffer::open(source));
    intermediate_to_document(reader, options)
}

/// Reconstruct lines and paragraphs on every page.
pub fn join_document(doc: &mut Document) -> Result<()> {
    let mut stats = ExtractionStats::new();
    layout::join_document(doc, &mut stats)
}

/// Run the whole pipeline into `sink` using the built-in template.
///
/// The sink is closed and handed back once the package is complete.
///
/// # Example
///
/// ```
/// use glyphdocx::buffer::VecSink;
/// use glyphdocx::{ContentOptions, IngestOptions, XmlTagReader};
///
/// let xml = "<page></page>";
/// let sink = glyphdocx::intermediate_to_docx(
///     XmlTagReader::from_str(xml),
///     &IngestOptions::default(),
///     &ContentOptions::default(),
///     VecSink::new(),
/// )
/// .unwrap();
/// assert!(sink.as_bytes().starts_with(b"PK\x03\x04"));
/// ```
pub fn intermediate_to_docx<T: TagSource, S: Sink>(
    source: T,
    ingest: &IngestOptions,
    content: &ContentOptions,
    sink: S,
) -> Result<S> {
    let mut doc = intermediate_to_document(source, ingest)?;
    join_document(&mut doc)?;
    let text = document_to_docx_content(&doc, content)?;

    let mut buffer = WriteBuffer::open(sink);
    docx_content_to_docx(&text, &doc, &Template::builtin(), &mut buffer)?;
    if buffer.close()? == Status::Eof {
        return Err(Error::Eof("sink did not accept the whole package".to_string()));
    }
    Ok(buffer.into_inner())
}

/// Write `content` and the document's images to a `.docx` file using the
/// built-in template.
pub fn write_docx<P: AsRef<Path>>(content: &str, doc: &Document, path: P) -> Result<()> {
    let mut buffer = WriteBuffer::open(FileSink::create(path.as_ref())?);
    docx_content_to_docx(content, doc, &Template::builtin(), &mut buffer)?;
    if buffer.close()? == Status::Eof {
        return Err(Error::Eof(format!(
            "could not flush {}",
            path.as_ref().display()
        )));
    }
    Ok(())
}

/// Convert an intermediate file to a `.docx` file with default options.
///
/// # Example
///
/// ```no_run
/// let stats = glyphdocx::convert_file("page.xml", "page.docx").unwrap();
/// println!("{}", stats);
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<ExtractionStats> {
    let mut stats = ExtractionStats::new();
    let mut doc = read_file_with_stats(input, &IngestOptions::default(), &mut stats)?;
    layout::join_document(&mut doc, &mut stats)?;
    let content = document_to_docx_content(&doc, &ContentOptions::default())?;
    write_docx(&content, &doc, output)?;
    Ok(stats)
}
