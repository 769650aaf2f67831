//! Package templates: the parts a `.docx` is assembled from.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::Result;

pub(crate) const CONTENT_TYPES: &str = "[Content_Types].xml";
pub(crate) const DOCUMENT: &str = "word/document.xml";
pub(crate) const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";

/// One named part of a template package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePart {
    /// Path inside the package
    pub name: String,

    /// Raw part bytes; the spliced parts must be UTF-8
    pub data: Vec<u8>,
}

/// An ordered set of package parts into which content is spliced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub parts: Vec<TemplatePart>,
}

impl Template {
    /// The minimal built-in package.
    pub fn builtin() -> Self {
        let parts = BUILTIN
            .iter()
            .map(|(name, text)| TemplatePart {
                name: (*name).to_string(),
                data: text.as_bytes().to_vec(),
            })
            .collect();
        Self { parts }
    }

    /// Load every entry of an existing `.docx`, in archive order.
    pub fn from_docx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        log::debug!("loading template {}", path.as_ref().display());
        Self::from_reader(file)
    }

    /// Load every entry of a `.docx` read from `reader`.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ::zip::ZipArchive::new(reader)?;
        let mut parts = Vec::new();
        parts.try_reserve_exact(archive.len())?;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::new();
            data.try_reserve_exact(entry.size() as usize)?;
            entry.read_to_end(&mut data)?;
            parts.push(TemplatePart {
                name: entry.name().to_string(),
                data,
            });
        }
        log::debug!("template has {} parts", parts.len());
        Ok(Self { parts })
    }

    /// The part called `name`, if present.
    pub fn part(&self, name: &str) -> Option<&TemplatePart> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN: [(&str, &str); 9] = [
    (
        CONTENT_TYPES,
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
            "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
            "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
            "<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>",
            "<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>",
            "<Override PartName=\"/word/settings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml\"/>",
            "<Override PartName=\"/word/fontTable.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.fontTable+xml\"/>",
            "<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>",
            "<Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>",
            "</Types>"
        ),
    ),
    (
        "_rels/.rels",
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
            "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>",
            "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>",
            "<Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties\" Target=\"docProps/app.xml\"/>",
            "</Relationships>"
        ),
    ),
    (
        "docProps/app.xml",
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\" ",
            "xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\">",
            "<Template></Template><TotalTime>0</TotalTime><Application>glyphdocx</Application>",
            "</Properties>"
        ),
    ),
    (
        "docProps/core.xml",
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" ",
            "xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" ",
            "xmlns:dcmitype=\"http://purl.org/dc/dcmitype/\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">",
            "<dc:title></dc:title><cp:revision>1</cp:revision>",
            "</cp:coreProperties>"
        ),
    ),
    (
        DOCUMENT,
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" ",
            "xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\" ",
            "xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" ",
            "xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\" ",
            "xmlns:wps=\"http://schemas.microsoft.com/office/word/2010/wordprocessingShape\">",
            "<w:body>",
            "<w:p/>",
            "<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/>",
            "<w:pgMar w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\" ",
            "w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>",
            "</w:body>",
            "</w:document>"
        ),
    ),
    (
        "word/fontTable.xml",
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<w:fonts xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
            "<w:font w:name=\"Times New Roman\"><w:family w:val=\"roman\"/><w:pitch w:val=\"variable\"/></w:font>",
            "<w:font w:name=\"OpenSans\"><w:family w:val=\"swiss\"/><w:pitch w:val=\"variable\"/></w:font>",
            "</w:fonts>"
        ),
    ),
    (
        "word/settings.xml",
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<w:settings xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
            "<w:defaultTabStop w:val=\"720\"/><w:compat/>",
            "</w:settings>"
        ),
    ),
    (
        "word/styles.xml",
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
            "<w:docDefaults><w:rPrDefault><w:rPr>",
            "<w:rFonts w:ascii=\"Times New Roman\" w:hAnsi=\"Times New Roman\"/>",
            "<w:sz w:val=\"24\"/><w:szCs w:val=\"24\"/>",
            "</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr>",
            "<w:spacing w:after=\"0\" w:line=\"240\" w:lineRule=\"auto\"/>",
            "</w:pPr></w:pPrDefault></w:docDefaults>",
            "<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/></w:style>",
            "</w:styles>"
        ),
    ),
    (
        DOCUMENT_RELS,
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
            "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
            "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/fontTable\" Target=\"fontTable.xml\"/>",
            "<Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings\" Target=\"settings.xml\"/>",
            "</Relationships>"
        ),
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_builtin_has_nine_parts() {
        let template = Template::builtin();
        assert_eq!(template.parts.len(), 9);
        for name in [CONTENT_TYPES, DOCUMENT, DOCUMENT_RELS] {
            let part = template.part(name).unwrap();
            assert!(std::str::from_utf8(&part.data).is_ok());
        }
        assert!(template.part("word/media/image1.png").is_none());
    }

    #[test]
    fn test_from_reader_keeps_archive_order() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = ::zip::ZipWriter::new(&mut cursor);
            let options = ::zip::write::FileOptions::default()
                .compression_method(::zip::CompressionMethod::Stored);
            writer.start_file("b.xml", options).unwrap();
            writer.write_all(b"<b/>").unwrap();
            writer.add_directory("word/", options).unwrap();
            writer.start_file("a.xml", options).unwrap();
            writer.write_all(b"<a/>").unwrap();
            writer.finish().unwrap();
        }
        cursor.set_position(0);

        let template = Template::from_reader(cursor).unwrap();
        assert_eq!(template.part_names().collect::<Vec<_>>(), ["b.xml", "a.xml"]);
        assert_eq!(template.part("a.xml").unwrap().data, b"<a/>");
    }

    #[test]
    fn test_from_docx_missing_file() {
        assert!(Template::from_docx("/nonexistent/template.docx").is_err());
    }
}
