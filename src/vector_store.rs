//! # VectorStore
//!
//! The remote vector database that holds every graph point.
//!
//! The rest of the crate only sees the [`VectorStore`] trait: a handful of
//! collection and point operations. [`QdrantStore`] implements it on top of the
//! Qdrant REST API with `reqwest`.
//!
//! ## Endpoints used
//! | operation            | request                                         |
//! |----------------------|-------------------------------------------------|
//! | `list_collections`   | `GET /collections`                              |
//! | `create_collection`  | `PUT /collections/{name}`                       |
//! | `delete_collection`  | `DELETE /collections/{name}`                    |
//! | `collection_info`    | `GET /collections/{name}`                       |
//! | `upsert`             | `PUT /collections/{name}/points?wait=true`      |
//! | `search`             | `POST /collections/{name}/points/search`        |
//! | `delete_points`      | `POST /collections/{name}/points/delete?wait=true` |
//! | `scroll`             | `POST /collections/{name}/points/scroll`        |
//!
//! Every response is wrapped in Qdrant's `{"result": ..., "status": ...}`
//! envelope; only `result` is read.
//!
//! ## Quick Example
//! ```no_run
//! use graph_vault::config::GraphVaultConfig;
//! use graph_vault::vector_store::{QdrantStore, VectorStore};
//!
//! # async fn run() -> graph_vault::error::Result<()> {
//! let config = GraphVaultConfig::new("http://localhost:6333", "sk-...");
//! let store = QdrantStore::new(&config)?;
//! let names = store.list_collections().await.unwrap_or_default();
//! println!("collections: {names:?}");
//! # Ok(()) }
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::config::{GraphVaultConfig, validate_url};
use crate::error::{Error, Result, StoreError};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Similarity metric of a collection. Graph collections are always cosine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
}

/// What the store reports about a collection. `vector_size` is `None` when the
/// configuration could not be read as a single unnamed vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionInfo {
    pub vector_size: Option<u64>,
}

/// One stored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub id: u32,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// A search hit. Hits arrive best first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredPoint {
    pub id: Value,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// A point returned by scrolling, payload only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    pub id: Value,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// One page of a scroll; `next_offset` is `None` on the last page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrollPage {
    pub points: Vec<Record>,
    pub next_offset: Option<Value>,
}

/// Operations the graph layer needs from a vector database.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn list_collections(&self) -> StoreResult<Vec<String>>;

    async fn create_collection(&self, name: &str, dim: u64, distance: Distance) -> StoreResult<()>;

    async fn delete_collection(&self, name: &str) -> StoreResult<()>;

    async fn collection_info(&self, name: &str) -> StoreResult<CollectionInfo>;

    /// Insert or fully replace points by id.
    async fn upsert(&self, collection: &str, points: Vec<Point>) -> StoreResult<()>;

    /// Nearest neighbours of `vector`, payload attached.
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> StoreResult<Vec<ScoredPoint>>;

    /// Remove points by id. Unknown ids are not an error.
    async fn delete_points(&self, collection: &str, ids: Vec<u32>) -> StoreResult<()>;

    /// Page through every point of a collection.
    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<Value>,
    ) -> StoreResult<ScrollPage>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionsResult {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    points: Vec<Record>,
    #[serde(default)]
    next_page_offset: Option<Value>,
}

/// [`VectorStore`] over the Qdrant REST API.
pub struct QdrantStore {
    client: Client,
    base_url: String,
}

impl QdrantStore {
    /// Create a client for `config.qdrant_url`.
    ///
    /// No request is made here; reachability is checked later by the
    /// [`ConnectionManager`](crate::connection::ConnectionManager).
    ///
    /// # Errors
    /// [`Error::Config`] if the URL is not `http(s)://`, the API key is not a
    /// valid header value, or the HTTP client can't be built.
    pub fn new(config: &GraphVaultConfig) -> Result<Self> {
        validate_url(&config.qdrant_url)?;

        let mut headers = header::HeaderMap::new();
        if let Some(key) = &config.qdrant_api_key {
            let mut value = header::HeaderValue::from_str(key)
                .map_err(|e| Error::Config(format!("invalid qdrant_api_key: {e}")))?;
            value.set_sensitive(true);
            headers.insert("api-key", value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.qdrant_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(envelope.result)
    }
}

/// Pull `config.params.vectors.size` out of a collection description.
///
/// Named-vector collections (`vectors: {"name": {"size": ..}}`) have no single
/// size and yield `None`.
fn vector_size(result: &Value) -> Option<u64> {
    result
        .pointer("/config/params/vectors/size")
        .and_then(Value::as_u64)
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        let result: CollectionsResult = self.send(self.client.get(self.url("/collections"))).await?;
        Ok(result.collections.into_iter().map(|c| c.name).collect())
    }

    async fn create_collection(&self, name: &str, dim: u64, distance: Distance) -> StoreResult<()> {
        debug!("Creating collection {} (size {}, {:?})", name, dim, distance);
        let body = json!({"vectors": {"size": dim, "distance": distance}});
        let _: Value = self
            .send(self.client.put(self.url(&format!("/collections/{name}"))).json(&body))
            .await?;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> StoreResult<()> {
        debug!("Deleting collection {}", name);
        let _: Value = self
            .send(self.client.delete(self.url(&format!("/collections/{name}"))))
            .await?;
        Ok(())
    }

    async fn collection_info(&self, name: &str) -> StoreResult<CollectionInfo> {
        let result: Value = self
            .send(self.client.get(self.url(&format!("/collections/{name}"))))
            .await?;
        Ok(CollectionInfo {
            vector_size: vector_size(&result),
        })
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> StoreResult<()> {
        let body = json!({ "points": points });
        let _: Value = self
            .send(
                self.client
                    .put(self.url(&format!("/collections/{collection}/points?wait=true")))
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> StoreResult<Vec<ScoredPoint>> {
        let body = json!({"vector": vector, "limit": limit, "with_payload": true});
        self.send(
            self.client
                .post(self.url(&format!("/collections/{collection}/points/search")))
                .json(&body),
        )
        .await
    }

    async fn delete_points(&self, collection: &str, ids: Vec<u32>) -> StoreResult<()> {
        let body = json!({ "points": ids });
        let _: Value = self
            .send(
                self.client
                    .post(self.url(&format!("/collections/{collection}/points/delete?wait=true")))
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<Value>,
    ) -> StoreResult<ScrollPage> {
        let mut body = json!({"limit": limit, "with_payload": true, "with_vector": false});
        if let Some(offset) = offset {
            body["offset"] = offset;
        }
        let result: ScrollResult = self
            .send(
                self.client
                    .post(self.url(&format!("/collections/{collection}/points/scroll")))
                    .json(&body),
            )
            .await?;
        Ok(ScrollPage {
            points: result.points,
            next_offset: result.next_page_offset.filter(|v| !v.is_null()),
        })
    }
}
