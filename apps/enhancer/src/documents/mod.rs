//! Text extraction for uploaded resumes, job descriptions and ingested PDFs.
//!
//! PDF text is pulled page by page and concatenated in page order; plain text is
//! decoded as strict UTF-8 and returned untouched.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("PDF extraction error: {0}")]
    Pdf(String),

    #[error("File is not valid UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Decides how to read an upload from its declared MIME type, falling back
    /// to the file extension when the type is missing or generic.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Result<Self, ExtractError> {
        let mime = content_type
            .map(|c| c.split(';').next().unwrap_or(c).trim().to_ascii_lowercase())
            .unwrap_or_default();

        match mime.as_str() {
            "application/pdf" => return Ok(Self::Pdf),
            "text/plain" | "text/markdown" => return Ok(Self::PlainText),
            _ => {}
        }

        let extension = file_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt" | "md") => Ok(Self::PlainText),
            _ => Err(ExtractError::Unsupported(
                file_name.or(content_type).unwrap_or("unknown").to_string(),
            )),
        }
    }
}

/// How PDF pages are stitched back together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageJoin {
    /// Pages appended back to back (uploads).
    Concatenate,
    /// Every page followed by a newline (collection ingestion).
    NewlinePerPage,
}

/// Extracts text from an in-memory document.
///
/// PDF parsing is CPU-bound; async callers should run this on `spawn_blocking`.
pub fn extract_text(kind: DocumentKind, bytes: &[u8], join: PageJoin) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::Pdf => {
            let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
                .map_err(|e| ExtractError::Pdf(e.to_string()))?;
            Ok(join_pages(pages, join))
        }
        DocumentKind::PlainText => Ok(String::from_utf8(bytes.to_vec())?),
    }
}

/// Reads and extracts a PDF from disk.
pub fn read_pdf(path: &Path, join: PageJoin) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    extract_text(DocumentKind::Pdf, &bytes, join)
}

/// Joins per-page text in the order given.
pub fn join_pages<I, S>(pages: I, join: PageJoin) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for page in pages {
        text.push_str(page.as_ref());
        if join == PageJoin::NewlinePerPage {
            text.push('\n');
        }
    }
    text
}

/// Builds small text-only PDFs, one Helvetica line per page.
#[cfg(test)]
pub(crate) mod test_pdf {
    pub fn build(pages: &[&str]) -> Vec<u8> {
        let font_id = 3 + 2 * pages.len();
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                (0..pages.len())
                    .map(|i| format!("{} 0 R", 3 + 2 * i))
                    .collect::<Vec<_>>()
                    .join(" "),
                pages.len()
            ),
        ];
        for (i, text) in pages.iter().enumerate() {
            let content = format!("BT /F1 18 Tf 72 720 Td ({text}) Tj ET");
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {} 0 R >>",
                4 + 2 * i
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ));
        }
        objects.push(
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        );

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_offset = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        pdf
    }
}
