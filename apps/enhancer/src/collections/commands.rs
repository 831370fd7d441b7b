//! Collection operations shared by the interactive menu and the subcommands.
//!
//! Each writes its user-facing output to `out` and returns store failures to
//! the caller, which decides whether to print them or exit.

use std::io::Write;
use std::path::Path;

use super::format::write_hits;
use super::ingest::{find_pdfs, ingest_folder, IngestStage};
use super::{StoreError, VectorStore};

pub async fn list(store: &dyn VectorStore, out: &mut impl Write) -> Result<Vec<String>, StoreError> {
    let names = store.list_collections().await?;
    if names.is_empty() {
        writeln!(out, "No collections found.")?;
    } else {
        writeln!(out, "\n\nExisting Collections:")?;
        write_numbered(out, &names)?;
    }
    Ok(names)
}

pub async fn create(store: &dyn VectorStore, out: &mut impl Write, name: &str) -> Result<(), StoreError> {
    store.create_collection(name).await?;
    writeln!(out, "Collection '{}' created successfully.", name.trim())?;
    Ok(())
}

pub async fn delete(store: &dyn VectorStore, out: &mut impl Write, name: &str) -> Result<(), StoreError> {
    store.delete_collection(name).await?;
    writeln!(out, "Collection '{}' deleted successfully.", name.trim())?;
    Ok(())
}

/// Adds every PDF in `folder` to `collection`, reporting each file as it goes.
pub async fn ingest(
    store: &dyn VectorStore,
    out: &mut impl Write,
    collection: &str,
    folder: &Path,
) -> Result<(), StoreError> {
    if !folder.is_dir() {
        writeln!(out, "Folder path does not exist.")?;
        return Ok(());
    }

    let pdfs = find_pdfs(folder)?;
    if pdfs.is_empty() {
        writeln!(out, "No PDF files found in the specified folder.")?;
        return Ok(());
    }
    writeln!(out, "Found {} PDF files. Processing...", pdfs.len())?;

    let report = ingest_folder(store, collection, folder).await?;
    for file_name in &report.added {
        writeln!(out, "Successfully added {file_name} to collection '{collection}'")?;
    }
    for failure in &report.failed {
        let file_name = &failure.file_name;
        match failure.stage {
            IngestStage::Extract => {
                writeln!(out, "Error extracting text from {file_name}: {}", failure.reason)?
            }
            IngestStage::Insert => {
                writeln!(out, "Error adding {file_name} to collection: {}", failure.reason)?
            }
        }
    }
    writeln!(out, "File insertion completed.")?;
    Ok(())
}

pub async fn query(
    store: &dyn VectorStore,
    out: &mut impl Write,
    collection: &str,
    text: &str,
    n_results: usize,
) -> Result<(), StoreError> {
    if text.trim().is_empty() {
        writeln!(out, "Query cannot be empty.")?;
        return Ok(());
    }
    let hits = store.query(collection, text, n_results).await?;
    write_hits(out, text, collection, n_results, &hits)?;
    Ok(())
}

pub fn write_numbered(out: &mut impl Write, names: &[String]) -> std::io::Result<()> {
    for (i, name) in names.iter().enumerate() {
        writeln!(out, "{}. {name}", i + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::collections::testing::LetterEmbedder;
    use crate::collections::LocalStore;
    use crate::documents::test_pdf;

    async fn store(dir: &Path) -> LocalStore {
        LocalStore::open(dir.join("db"), Arc::new(LetterEmbedder)).await.unwrap()
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_list_empty_and_populated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).await;

        let mut out = Vec::new();
        assert!(list(&store, &mut out).await.unwrap().is_empty());
        assert_eq!(text(out), "No collections found.\n");

        store.create_collection("papers").await.unwrap();
        store.create_collection("resumes").await.unwrap();
        let mut out = Vec::new();
        list(&store, &mut out).await.unwrap();
        assert_eq!(text(out), "\n\nExisting Collections:\n1. papers\n2. resumes\n");
    }

    #[tokio::test]
    async fn test_create_duplicate_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).await;

        let mut out = Vec::new();
        create(&store, &mut out, "papers").await.unwrap();
        assert_eq!(text(out), "Collection 'papers' created successfully.\n");

        let mut out = Vec::new();
        let err = create(&store, &mut out, "papers").await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_missing_folder_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).await;
        store.create_collection("papers").await.unwrap();

        let mut out = Vec::new();
        ingest(&store, &mut out, "papers", &dir.path().join("missing")).await.unwrap();
        assert_eq!(text(out), "Folder path does not exist.\n");
    }

    #[tokio::test]
    async fn test_ingest_folder_without_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).await;
        store.create_collection("papers").await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        let mut out = Vec::new();
        ingest(&store, &mut out, "papers", dir.path()).await.unwrap();
        assert_eq!(text(out), "No PDF files found in the specified folder.\n");
    }

    #[tokio::test]
    async fn test_query_rejects_blank_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).await;
        store.create_collection("papers").await.unwrap();

        let mut out = Vec::new();
        query(&store, &mut out, "papers", "   ", 3).await.unwrap();
        assert_eq!(text(out), "Query cannot be empty.\n");
    }

    #[tokio::test]
    async fn test_query_prints_hits() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).await;
        store.create_collection("papers").await.unwrap();
        store
            .add_document("papers", "speech.pdf", "Speech therapy outcomes in adults")
            .await
            .unwrap();

        let mut out = Vec::new();
        query(&store, &mut out, "papers", "speech therapy", 3).await.unwrap();
        let out = text(out);
        assert!(out.contains("Document: speech.pdf"));
        assert!(out.contains("Speech therapy outcomes in adults"));
    }

    #[tokio::test]
    async fn test_ingest_prints_added_and_skipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).await;
        store.create_collection("papers").await.unwrap();
        let pdfs = dir.path().join("pdfs");
        std::fs::create_dir(&pdfs).unwrap();
        std::fs::write(pdfs.join("good.pdf"), test_pdf::build(&["Voice therapy study"])).unwrap();
        std::fs::write(pdfs.join("junk.pdf"), b"not a pdf").unwrap();

        let mut out = Vec::new();
        ingest(&store, &mut out, "papers", &pdfs).await.unwrap();
        let out = text(out);
        assert!(out.starts_with("Found 2 PDF files. Processing...\n"));
        assert!(out.contains("Successfully added good.pdf to collection 'papers'"));
        assert!(out.contains("Error extracting text from junk.pdf"));
        assert!(out.ends_with("File insertion completed.\n"));
    }
}
