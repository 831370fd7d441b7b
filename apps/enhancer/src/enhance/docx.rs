//! Minimal WordprocessingML writer: one document, one paragraph.

use std::borrow::Cow;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Fixed name of the exported file on disk.
pub const EXPORT_FILE_NAME: &str = "Enhanced_Resume.docx";
/// Name suggested to the browser for the download.
pub const DOWNLOAD_FILE_NAME: &str = "enhanced_resume.docx";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"</Types>"#
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#
);

const DOCUMENT_HEAD: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:body>"#
);

const DOCUMENT_TAIL: &str = r#"<w:sectPr/></w:body></w:document>"#;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("Failed to build docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders `text` as a `.docx` package holding a single paragraph.
/// Line breaks inside the text become `<w:br/>` within that paragraph.
pub fn render_docx(text: &str) -> Result<Vec<u8>, DocxError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(ROOT_RELS_XML.as_bytes())?;

    zip.start_file("word/document.xml", options)?;
    zip.write_all(document_xml(text).as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

/// Writes rendered bytes to `<dir>/Enhanced_Resume.docx`, creating `dir` if needed.
pub async fn export_docx(dir: &Path, bytes: &[u8]) -> Result<PathBuf, DocxError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(EXPORT_FILE_NAME);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

fn document_xml(text: &str) -> String {
    let mut xml = String::with_capacity(DOCUMENT_HEAD.len() + text.len() * 2);
    xml.push_str(DOCUMENT_HEAD);
    xml.push_str("<w:p><w:r>");
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        xml.push_str(r#"<w:t xml:space="preserve">"#);
        xml.push_str(&escape_xml(line));
        xml.push_str("</w:t>");
    }
    xml.push_str("</w:r></w:p>");
    xml.push_str(DOCUMENT_TAIL);
    xml
}

/// Escapes markup characters and drops control characters XML 1.0 forbids
/// (PDF-extracted text often carries form feeds).
fn escape_xml(text: &str) -> Cow<'_, str> {
    let needs_work = text
        .chars()
        .any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'') || is_forbidden_control(c));
    if !needs_work {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_forbidden_control(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

const fn is_forbidden_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut out = String::new();
        entry.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_render_docx_contains_required_parts() {
        let bytes = render_docx("Jane Doe").unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"[Content_Types].xml"));
        assert!(names.contains(&"_rels/.rels"));
        assert!(names.contains(&"word/document.xml"));
    }

    #[test]
    fn test_document_is_a_single_paragraph_with_line_breaks() {
        let bytes = render_docx("JANE DOE\nSenior Engineer\nRust, Go").unwrap();
        let xml = read_entry(&bytes, "word/document.xml");
        assert_eq!(xml.matches("<w:p>").count(), 1);
        assert_eq!(xml.matches("<w:br/>").count(), 2);
        assert!(xml.contains(">Senior Engineer</w:t>"));
    }

    #[test]
    fn test_markup_characters_are_escaped() {
        let bytes = render_docx("R&D <lead> \"quoted\"").unwrap();
        let xml = read_entry(&bytes, "word/document.xml");
        assert!(xml.contains("R&amp;D &lt;lead&gt; &quot;quoted&quot;"));
    }

    #[test]
    fn test_forbidden_control_characters_are_dropped() {
        assert_eq!(escape_xml("page\u{c}two\tcol"), "pagetwo\tcol");
        assert!(matches!(escape_xml("plain"), Cow::Borrowed("plain")));
    }

    #[tokio::test]
    async fn test_export_writes_fixed_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("session");
        let bytes = render_docx("Jane").unwrap();

        let path = export_docx(&target, &bytes).await.unwrap();

        assert_eq!(path, target.join("Enhanced_Resume.docx"));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
