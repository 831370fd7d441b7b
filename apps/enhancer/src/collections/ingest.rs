//! Bulk-loading a folder of PDFs into a collection.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{StoreError, VectorStore};
use crate::documents::{read_pdf, PageJoin};

#[derive(Debug, Default, PartialEq)]
pub struct IngestReport {
    /// File names stored, in processing order.
    pub added: Vec<String>,
    /// Files skipped, in processing order.
    pub failed: Vec<IngestFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Extract,
    Insert,
}

#[derive(Debug, PartialEq)]
pub struct IngestFailure {
    pub file_name: String,
    pub stage: IngestStage,
    pub reason: String,
}

impl IngestReport {
    fn fail(&mut self, file_name: String, stage: IngestStage, reason: impl std::fmt::Display) {
        warn!("Skipping {file_name} ({stage:?}): {reason}");
        self.failed.push(IngestFailure {
            file_name,
            stage,
            reason: reason.to_string(),
        });
    }
}

/// PDF files directly inside `folder`, sorted by name. Extension match is case-insensitive.
pub fn find_pdfs(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Extracts each PDF in `folder` and stores it in `collection` under its file name.
///
/// A file that cannot be read, yields no text, or is rejected by the store or
/// the embedder is reported and skipped. Only a folder that cannot be listed
/// fails the run.
pub async fn ingest_folder(
    store: &dyn VectorStore,
    collection: &str,
    folder: &Path,
) -> Result<IngestReport, StoreError> {
    let mut report = IngestReport::default();

    for path in find_pdfs(folder)? {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // pdf-extract panics on some malformed files; the join error catches that.
        let extracted = tokio::task::spawn_blocking(move || read_pdf(&path, PageJoin::NewlinePerPage)).await;

        let text = match extracted {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                report.fail(file_name, IngestStage::Extract, "no extractable text");
                continue;
            }
            Ok(Err(e)) => {
                report.fail(file_name, IngestStage::Extract, e);
                continue;
            }
            Err(e) => {
                report.fail(file_name, IngestStage::Extract, format!("extraction task failed: {e}"));
                continue;
            }
        };

        match store.add_document(collection, &file_name, &text).await {
            Ok(()) => {
                info!("Added {file_name} to '{collection}'");
                report.added.push(file_name);
            }
            Err(e) => report.fail(file_name, IngestStage::Insert, e),
        }
    }

    Ok(report)
}
