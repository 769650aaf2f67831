//! Error types for glyphdocx library.

use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

/// Result type alias for glyphdocx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a glyph stream to docx.
#[derive(Error, Debug)]
pub enum Error {
    /// Memory for a span, line or paragraph list could not be reserved.
    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// The tag stream is missing an attribute, has an invalid value, or
    /// contains an unexpected tag.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A template part is missing one of the anchors content is spliced at.
    #[error("Template structure error: {0}")]
    TemplateStructure(String),

    /// I/O error from a read or write callback.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A write could not be completed because the sink stopped accepting data.
    #[error("Unexpected end of stream: {0}")]
    Eof(String),

    /// An output path contains sequences that are not allowed.
    #[error("Unsafe path: {0}")]
    UnsafePath(String),

    /// Zip archive limits exceeded or a template archive is unreadable.
    #[error("Zip error: {0}")]
    Zip(String),

    /// The tag stream could not be tokenized.
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(e) => Error::Io(io::Error::new(e.kind(), e.to_string())),
            _ => Error::Xml(err.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Zip(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl Error {
    /// Shorthand for a [`Error::MalformedInput`] with a formatted message.
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedInput(msg.into())
    }
}
