//! Directory-backed vector store.
//!
//! Layout: `<root>/index.json` lists collections in creation order, and each
//! collection's documents and embeddings live in `<root>/collections/<name>.json`.
//! Collection files never share a directory with the index.
//! Queries rank by cosine distance.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{validate_collection_name, QueryHit, StoreError, VectorStore};
use crate::llm_client::{EmbedPurpose, Embedder};

pub const DEFAULT_PERSIST_DIR: &str = "chroma_db";
const INDEX_FILE: &str = "index.json";
const COLLECTIONS_DIR: &str = "collections";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Index {
    collections: Vec<CollectionMeta>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionMeta {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionData {
    documents: Vec<StoredDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    id: String,
    text: String,
    embedding: Vec<f32>,
}

pub struct LocalStore {
    root: PathBuf,
    embedder: Arc<dyn Embedder>,
    /// Serializes read-modify-write cycles on the JSON files.
    lock: Mutex<()>,
}

impl LocalStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(COLLECTIONS_DIR)).await?;
        info!("Opened local vector store at {}", root.display());
        Ok(Self {
            root,
            embedder,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(COLLECTIONS_DIR).join(format!("{name}.json"))
    }

    async fn load_index(&self) -> Result<Index, StoreError> {
        read_json_or_default(&self.index_path()).await
    }

    async fn require_collection(&self, name: &str) -> Result<String, StoreError> {
        let name = validate_collection_name(name)?;
        let index = self.load_index().await?;
        if index.collections.iter().any(|c| c.name == name) {
            Ok(name.to_string())
        } else {
            Err(StoreError::NotFound(name.to_string()))
        }
    }
}

#[async_trait]
impl VectorStore for LocalStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let index = self.load_index().await?;
        Ok(index.collections.into_iter().map(|c| c.name).collect())
    }

    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        let name = validate_collection_name(name)?;
        let _guard = self.lock.lock().await;

        let mut index = self.load_index().await?;
        if index.collections.iter().any(|c| c.name == name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        write_json(&self.collection_path(name), &CollectionData::default()).await?;
        index.collections.push(CollectionMeta {
            name: name.to_string(),
            created_at: Utc::now(),
        });
        write_json(&self.index_path(), &index).await?;
        info!("Created collection '{name}'");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let name = validate_collection_name(name)?;
        let _guard = self.lock.lock().await;

        let mut index = self.load_index().await?;
        let before = index.collections.len();
        index.collections.retain(|c| c.name != name);
        if index.collections.len() == before {
            return Err(StoreError::NotFound(name.to_string()));
        }

        write_json(&self.index_path(), &index).await?;
        match tokio::fs::remove_file(self.collection_path(name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!("Deleted collection '{name}'");
        Ok(())
    }

    async fn add_document(&self, collection: &str, id: &str, document: &str) -> Result<(), StoreError> {
        let name = self.require_collection(collection).await?;
        // Embed before taking the lock; the hosted call is the slow part.
        let embedding = self.embedder.embed(document, EmbedPurpose::Document).await?;

        let _guard = self.lock.lock().await;
        let path = self.collection_path(&name);
        let mut data: CollectionData = read_json_or_default(&path).await?;

        if let Some(expected) = data
            .documents
            .iter()
            .find(|d| d.id != id)
            .map(|d| d.embedding.len())
        {
            if expected != embedding.len() {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    found: embedding.len(),
                });
            }
        }

        let stored = StoredDocument {
            id: id.to_string(),
            text: document.to_string(),
            embedding,
        };
        match data.documents.iter_mut().find(|d| d.id == id) {
            Some(existing) => *existing = stored,
            None => data.documents.push(stored),
        }

        write_json(&path, &data).await?;
        debug!("Stored document '{id}' in collection '{name}'");
        Ok(())
    }

    async fn query(&self, collection: &str, query: &str, n_results: usize) -> Result<Vec<QueryHit>, StoreError> {
        let name = self.require_collection(collection).await?;
        let data: CollectionData = read_json_or_default(&self.collection_path(&name)).await?;
        if data.documents.is_empty() || n_results == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query, EmbedPurpose::Query).await?;

        let mut hits = Vec::with_capacity(data.documents.len());
        for doc in data.documents {
            let distance = cosine_distance(&query_embedding, &doc.embedding).ok_or(
                StoreError::DimensionMismatch {
                    expected: doc.embedding.len(),
                    found: query_embedding.len(),
                },
            )?;
            hits.push(QueryHit {
                id: doc.id,
                document: doc.text,
                distance,
            });
        }

        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        hits.truncate(n_results);
        Ok(hits)
    }
}

/// `1 - cosine similarity`. A zero vector is maximally distant from everything.
/// `None` when the dimensions differ.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(1.0);
    }
    Some(1.0 - dot / (norm_a * norm_b))
}

async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Writes through a temporary file and renames it into place, so a crash never
/// leaves a half-written JSON file behind.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::testing::LetterEmbedder;

    async fn open_store(dir: &Path) -> LocalStore {
        LocalStore::open(dir.join("chroma_db"), Arc::new(LetterEmbedder))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        assert!(store.root().is_dir());
        assert!(store.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_collections_listed_in_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store.create_collection("zeta").await.unwrap();
        store.create_collection("alpha").await.unwrap();
        assert_eq!(store.list_collections().await.unwrap(), vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn test_duplicate_collection_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store.create_collection("resumes").await.unwrap();
        let err = store.create_collection("resumes").await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(name) if name == "resumes"));
        assert_eq!(store.list_collections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_collection_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store.create_collection("resumes").await.unwrap();
        store.delete_collection("resumes").await.unwrap();
        assert!(store.list_collections().await.unwrap().is_empty());
        assert!(!store.collection_path("resumes").exists());

        let err = store.delete_collection("resumes").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_empty_collection_returns_no_hits() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store.create_collection("empty").await.unwrap();
        let hits = store.query("empty", "rust engineer", 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_query_ranks_closest_first_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store.create_collection("docs").await.unwrap();
        store.add_document("docs", "a.pdf", "aaaa aaaa").await.unwrap();
        store.add_document("docs", "b.pdf", "bbbb bbbb").await.unwrap();
        store.add_document("docs", "ab.pdf", "aaaa bbbb").await.unwrap();

        let hits = store.query("docs", "aaa", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a.pdf");
        assert!(hits[0].distance.abs() < 1e-6);
        assert_eq!(hits[1].id, "ab.pdf");

        let all = store.query("docs", "aaa", 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].id, "b.pdf");
    }

    #[tokio::test]
    async fn test_add_same_id_replaces_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store.create_collection("docs").await.unwrap();
        store.add_document("docs", "cv.pdf", "old text").await.unwrap();
        store.add_document("docs", "cv.pdf", "new text").await.unwrap();

        let hits = store.query("docs", "text", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document, "new text");
    }

    #[tokio::test]
    async fn test_add_to_missing_collection_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let err = store.add_document("nope", "a.pdf", "text").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(dir.path()).await;
            store.create_collection("docs").await.unwrap();
            store.add_document("docs", "a.pdf", "persisted").await.unwrap();
        }
        let store = open_store(dir.path()).await;
        assert_eq!(store.list_collections().await.unwrap(), vec!["docs"]);
        let hits = store.query("docs", "persisted", 1).await.unwrap();
        assert_eq!(hits[0].document, "persisted");
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).unwrap().abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]).unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), Some(1.0));
        assert_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), None);
    }

    #[tokio::test]
    async fn test_collection_named_index_does_not_clobber_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store.create_collection("papers").await.unwrap();
        store.create_collection("resumes").await.unwrap();
        store.create_collection("index").await.unwrap();

        store.add_document("index", "a.pdf", "aaaa").await.unwrap();
        let hits = store.query("index", "aaa", 3).await.unwrap();
        assert_eq!(hits[0].id, "a.pdf");
        assert_eq!(
            store.list_collections().await.unwrap(),
            vec!["papers", "resumes", "index"]
        );

        store.delete_collection("index").await.unwrap();
        assert_eq!(store.list_collections().await.unwrap(), vec!["papers", "resumes"]);
        assert!(store.root().join(INDEX_FILE).is_file());
    }
}
