//! Assembly of `.docx` packages from emitted content and a template.

mod splice;
mod template;

pub use template::{Template, TemplatePart};

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::ZipWriter;
use crate::buffer::{FileSink, Sink, Status, WriteBuffer};
use crate::error::{Error, Result};
use crate::model::{Document, Image};

/// Write a `.docx` package to `buffer`.
///
/// Every template part is written in template order, with `content`
/// spliced into `word/document.xml` and the document's images declared in
/// the content types and relationships. The image bytes follow as
/// `word/media/{name}`. The buffer is left open.
pub fn docx_content_to_docx<S: Sink>(
    content: &str,
    doc: &Document,
    template: &Template,
    buffer: &mut WriteBuffer<S>,
) -> Result<()> {
    let images: Vec<&Image> = doc.images().collect();
    log::debug!(
        "writing package: {} template parts, {} images, {} bytes of content",
        template.parts.len(),
        images.len(),
        content.len()
    );

    let mut zip = ZipWriter::open(buffer);
    for part in &template.parts {
        let data = spliced_part(part, content, &images)?;
        zip.write_file(&data, &part.name)?;
    }
    for image in &images {
        zip.write_file(&image.data, &image.part_name())?;
    }
    zip.close()
}

/// Apply the splice for `part`, if it is one of the three spliced parts.
fn spliced_part<'a>(
    part: &'a TemplatePart,
    content: &str,
    images: &[&Image],
) -> Result<Cow<'a, [u8]>> {
    match part.name.as_str() {
        template::CONTENT_TYPES | template::DOCUMENT_RELS | template::DOCUMENT => {}
        _ => return Ok(Cow::Borrowed(&part.data)),
    }
    let text = std::str::from_utf8(&part.data).map_err(|e| {
        Error::TemplateStructure(format!("{} is not UTF-8: {}", part.name, e))
    })?;
    let spliced = match part.name.as_str() {
        template::CONTENT_TYPES => splice::content_types(text, images)?,
        template::DOCUMENT_RELS => splice::relationships(text, images)?,
        _ => splice::document_body(text, content)?,
    };
    Ok(Cow::Owned(spliced.into_bytes()))
}

/// Reject paths that could be misread when passed around as shell words.
fn check_path_safe(path: &Path) -> Result<()> {
    let text = path.to_string_lossy();
    if text.contains("..") || text.contains(|c: char| matches!(c, '\'' | '"' | ' ')) {
        return Err(Error::UnsafePath(text.into_owned()));
    }
    Ok(())
}

/// Directory that receives the unpacked package, `{path_out}.dir`.
pub fn preserve_dir_path(path_out: &Path) -> PathBuf {
    let mut dir = path_out.as_os_str().to_owned();
    dir.push(".dir");
    PathBuf::from(dir)
}

/// Write a `.docx` to `path_out` built from `template`.
///
/// With `preserve_dir` the spliced parts and images are also left
/// unpacked under `{path_out}.dir/`, replacing any previous contents.
pub fn docx_from_template(
    content: &str,
    doc: &Document,
    template: &Template,
    path_out: &Path,
    preserve_dir: bool,
) -> Result<()> {
    check_path_safe(path_out)?;

    let mut buffer = WriteBuffer::open(FileSink::create(path_out)?);
    docx_content_to_docx(content, doc, template, &mut buffer)?;
    if buffer.close()? == Status::Eof {
        return Err(Error::Eof(format!("could not flush {}", path_out.display())));
    }
    log::info!("wrote {}", path_out.display());

    if preserve_dir {
        let dir = preserve_dir_path(path_out);
        write_unpacked(content, doc, template, &dir)?;
        log::info!("left unpacked package in {}", dir.display());
    }
    Ok(())
}

fn write_unpacked(content: &str, doc: &Document, template: &Template, dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    let images: Vec<&Image> = doc.images().collect();
    let mut files: Vec<(PathBuf, Cow<'_, [u8]>)> = Vec::new();
    for part in &template.parts {
        files.push((part.name.clone().into(), spliced_part(part, content, &images)?));
    }
    for image in &images {
        files.push((image.part_name().into(), Cow::Borrowed(&image.data)));
    }

    for (name, data) in files {
        if name.components().any(|c| !matches!(c, std::path::Component::Normal(_))) {
            return Err(Error::UnsafePath(name.display().to_string()));
        }
        let path = dir.join(&name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &data)?;
    }
    Ok(())
}
