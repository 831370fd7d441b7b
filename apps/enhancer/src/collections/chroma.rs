//! Chroma server backend (HTTP API v2).
//!
//! Embeddings are computed client-side and sent with every upsert and query,
//! so the server never needs its own embedding function.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use super::{validate_collection_name, QueryHit, StoreError, VectorStore};
use crate::llm_client::{EmbedPurpose, Embedder};

pub const DEFAULT_URL: &str = "http://localhost:8000";
const TENANT: &str = "default_tenant";
const DATABASE: &str = "default_database";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: [&'a str; 1],
    documents: [&'a str; 1],
    embeddings: [Vec<f32>; 1],
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: [Vec<f32>; 1],
    n_results: usize,
    include: [&'static str; 2],
}

/// Results are nested one level per query embedding; we always send one.
#[derive(Debug, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f32>>>>,
}

#[derive(Debug, Deserialize)]
struct ChromaError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

pub struct ChromaStore {
    client: Client,
    base_url: String,
    embedder: Arc<dyn Embedder>,
}

impl ChromaStore {
    pub fn new(base_url: impl Into<String>, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Using Chroma server at {base_url}");
        Ok(Self {
            client,
            base_url,
            embedder,
        })
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{TENANT}/databases/{DATABASE}/collections",
            self.base_url
        )
    }

    async fn collection_id(&self, name: &str) -> Result<String, StoreError> {
        let url = format!("{}/{name}", self.collections_url());
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let info: CollectionInfo = parse(name, response).await?;
        Ok(info.id)
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let response = self.client.get(self.collections_url()).send().await?;
        let collections: Vec<CollectionInfo> = parse("", response).await?;
        Ok(collections.into_iter().map(|c| c.name).collect())
    }

    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        let name = validate_collection_name(name)?;
        let response = self
            .client
            .post(self.collections_url())
            .json(&CreateCollectionRequest {
                name,
                get_or_create: false,
            })
            .send()
            .await?;
        let _: CollectionInfo = parse(name, response).await?;
        info!("Created collection '{name}'");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let name = validate_collection_name(name)?;
        let url = format!("{}/{name}", self.collections_url());
        let response = self.client.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(name.to_string()));
        }
        check(name, response).await?;
        info!("Deleted collection '{name}'");
        Ok(())
    }

    async fn add_document(&self, collection: &str, id: &str, document: &str) -> Result<(), StoreError> {
        let name = validate_collection_name(collection)?;
        let collection_id = self.collection_id(name).await?;
        let embedding = self.embedder.embed(document, EmbedPurpose::Document).await?;

        let url = format!("{}/{collection_id}/upsert", self.collections_url());
        let response = self
            .client
            .post(url)
            .json(&UpsertRequest {
                ids: [id],
                documents: [document],
                embeddings: [embedding],
            })
            .send()
            .await?;
        check(name, response).await?;
        debug!("Stored document '{id}' in collection '{name}'");
        Ok(())
    }

    async fn query(&self, collection: &str, query: &str, n_results: usize) -> Result<Vec<QueryHit>, StoreError> {
        let name = validate_collection_name(collection)?;
        let collection_id = self.collection_id(name).await?;

        // Chroma rejects queries against an empty collection.
        let count_url = format!("{}/{collection_id}/count", self.collections_url());
        let count: usize = parse(name, self.client.get(count_url).send().await?).await?;
        if count == 0 || n_results == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query, EmbedPurpose::Query).await?;
        let url = format!("{}/{collection_id}/query", self.collections_url());
        let response = self
            .client
            .post(url)
            .json(&QueryRequest {
                query_embeddings: [embedding],
                n_results: n_results.min(count),
                include: ["documents", "distances"],
            })
            .send()
            .await?;
        let body: QueryResponse = parse(name, response).await?;
        Ok(hits_from_response(body))
    }
}

/// Flattens the first query's results into hits, in the order the server ranked them.
pub fn hits_from_response(response: QueryResponse) -> Vec<QueryHit> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let documents = response
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();
    let distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();

    ids.into_iter()
        .enumerate()
        .map(|(i, id)| QueryHit {
            id,
            document: documents.get(i).cloned().flatten().unwrap_or_default(),
            distance: distances.get(i).copied().flatten().unwrap_or(1.0),
        })
        .collect()
}

async fn parse<T: DeserializeOwned>(name: &str, response: Response) -> Result<T, StoreError> {
    let response = check(name, response).await?;
    Ok(response.json().await?)
}

async fn check(name: &str, response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(body);
    if status == StatusCode::CONFLICT || message.to_lowercase().contains("already exists") {
        return Err(StoreError::AlreadyExists(name.to_string()));
    }
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

fn error_message(body: String) -> String {
    match serde_json::from_str::<ChromaError>(&body) {
        Ok(e) if !e.message.is_empty() => e.message,
        Ok(e) if !e.error.is_empty() => e.error,
        _ => body,
    }
}
