//! Text splicing of content and image declarations into template parts.

use crate::error::{Error, Result};
use crate::model::Image;
use crate::render::escape_xml;

const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

fn missing(anchor: &str, part: &str) -> Error {
    Error::TemplateStructure(format!("could not find '{}' in {}", anchor, part))
}

/// Declare every image type not yet declared, right after `<Types …>`.
pub(crate) fn content_types(text: &str, images: &[&Image]) -> Result<String> {
    let types_at = text
        .find("<Types")
        .ok_or_else(|| missing("<Types", "[Content_Types].xml"))?;
    let insert_at = text[types_at..]
        .find('>')
        .map(|i| types_at + i + 1)
        .ok_or_else(|| missing("<Types ...>", "[Content_Types].xml"))?;
    if !text[insert_at..].contains("</Types>") {
        return Err(missing("</Types>", "[Content_Types].xml"));
    }

    let mut declared: Vec<&str> = Vec::new();
    let mut insert = String::new();
    for image in images {
        let kind = image.kind.as_str();
        let already = format!("Extension=\"{}\"", escape_xml(kind));
        if declared.contains(&kind) || text.contains(&already) {
            continue;
        }
        declared.push(kind);
        insert.push_str(&format!(
            "<Default {} ContentType=\"{}\"/>",
            already,
            escape_xml(&image.content_type())
        ));
    }

    splice(text, insert_at, insert_at, &insert)
}

/// Add one relationship per image right before `</Relationships>`.
pub(crate) fn relationships(text: &str, images: &[&Image]) -> Result<String> {
    let open_at = text
        .find("<Relationships")
        .ok_or_else(|| missing("<Relationships", "word/_rels/document.xml.rels"))?;
    let insert_at = text[open_at..]
        .find("</Relationships>")
        .map(|i| open_at + i)
        .ok_or_else(|| missing("</Relationships>", "word/_rels/document.xml.rels"))?;

    let mut insert = String::new();
    for image in images {
        insert.push_str(&format!(
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"media/{}\"/>",
            escape_xml(&image.id),
            IMAGE_RELATIONSHIP,
            escape_xml(&image.name)
        ));
    }

    splice(text, insert_at, insert_at, &insert)
}

/// Replace the body of `word/document.xml` with `content`, keeping a
/// trailing `<w:sectPr` section.
pub(crate) fn document_body(text: &str, content: &str) -> Result<String> {
    const BODY_OPEN: &str = "<w:body>";
    const BODY_CLOSE: &str = "</w:body>";

    let begin = text
        .find(BODY_OPEN)
        .map(|i| i + BODY_OPEN.len())
        .ok_or_else(|| missing(BODY_OPEN, "word/document.xml"))?;
    let mut end = text[begin..]
        .rfind(BODY_CLOSE)
        .map(|i| begin + i)
        .ok_or_else(|| missing(BODY_CLOSE, "word/document.xml"))?;
    if let Some(sect) = text[begin..end].rfind("<w:sectPr") {
        end = begin + sect;
    }

    splice(text, begin, end, content)
}

fn splice(text: &str, begin: usize, end: usize, insert: &str) -> Result<String> {
    let mut out = String::new();
    out.try_reserve_exact(text.len() - (end - begin) + insert.len())?;
    out.push_str(&text[..begin]);
    out.push_str(insert);
    out.push_str(&text[end..]);
    Ok(out)
}
