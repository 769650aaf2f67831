//! Rendering module for converting reconstructed documents to output formats.

mod docx;
mod json;
mod options;
mod rotation;

pub use docx::{document_to_docx_content, DocxRenderer};
pub use json::{to_json, JsonFormat};
pub use options::ContentOptions;

pub(crate) use docx::escape_xml;
