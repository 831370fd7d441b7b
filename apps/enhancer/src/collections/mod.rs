//! Vector-document collection management.
//!
//! A [`VectorStore`] holds named collections of text documents keyed by id
//! (the source file name) and answers top-k similarity queries. Embeddings
//! come from a hosted [`Embedder`](crate::llm_client::Embedder); the store
//! only persists and ranks them.
//!
//! Backends: [`LocalStore`] (JSON files in a directory) and [`ChromaStore`]
//! (a Chroma server over HTTP).

pub mod chroma;
pub mod commands;
pub mod format;
pub mod ingest;
pub mod local;
pub mod menu;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::LlmError;

pub use chroma::ChromaStore;
pub use local::LocalStore;

/// Default number of hits returned by a query.
pub const DEFAULT_RESULTS: usize = 3;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{0}' already exists")]
    AlreadyExists(String),

    #[error("collection '{0}' does not exist")]
    NotFound(String),

    #[error("invalid collection name '{0}': use 3-63 characters [a-zA-Z0-9._-], starting and ending with a letter or digit")]
    InvalidName(String),

    #[error("embedding dimension mismatch: collection uses {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vector store error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// One query result. `distance` is the store's distance metric (lower is closer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub distance: f32,
}

impl QueryHit {
    /// Relevance as shown to the user: `1 - distance`.
    pub fn relevance(&self) -> f32 {
        1.0 - self.distance
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Collection names in creation order.
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    /// Fails with [`StoreError::AlreadyExists`] if the name is taken.
    async fn create_collection(&self, name: &str) -> Result<(), StoreError>;

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Embeds and stores a document. An existing document with the same id is replaced.
    async fn add_document(&self, collection: &str, id: &str, document: &str) -> Result<(), StoreError>;

    /// The `n_results` closest documents to `query`, closest first.
    /// An empty collection yields no hits.
    async fn query(&self, collection: &str, query: &str, n_results: usize) -> Result<Vec<QueryHit>, StoreError>;
}

/// Applies Chroma's naming rules so both backends accept the same names.
pub fn validate_collection_name(name: &str) -> Result<&str, StoreError> {
    let name = name.trim();
    let len = name.chars().count();
    let allowed = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    let edges_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());

    if (3..=63).contains(&len) && allowed && edges_ok && !name.contains("..") {
        Ok(name)
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_collection_names() {
        assert_eq!(validate_collection_name(" resumes ").unwrap(), "resumes");
        assert!(validate_collection_name("job-posts_2024.v1").is_ok());
    }

    #[test]
    fn test_invalid_collection_names() {
        for name in ["", "ab", "-resumes", "resumes-", "my resumes", "../etc", "a..b", "résumés"] {
            assert!(
                matches!(validate_collection_name(name), Err(StoreError::InvalidName(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_relevance_is_one_minus_distance() {
        let hit = QueryHit {
            id: "a.pdf".to_string(),
            document: String::new(),
            distance: 0.25,
        };
        assert!((hit.relevance() - 0.75).abs() < f32::EPSILON);
    }
}
