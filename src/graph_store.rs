//! # Graph store
//!
//! The public face of the crate: persist, search and delete graph elements in a
//! vector collection.
//!
//! Every operation runs the same lifecycle:
//! 1. make sure the store is reachable ([`ConnectionManager::ensure_connected`]),
//! 2. require a configured collection name,
//! 3. derive a point id and/or an embedding,
//! 4. issue exactly one request to the store.
//!
//! Collection readiness is *not* checked per request. Call
//! [`GraphStore::initialize`] once at startup; it creates the collection, or
//! recreates it (dropping all points) when its vector size doesn't match the
//! embedder. See [`crate::collection`].
//!
//! Writes are whole-object replaces keyed by identity: persisting an entity with
//! a name that is already stored overwrites that point. Two concurrent writes to
//! the same identity race and whichever response lands last wins.
//!
//! ## Example
//! ```no_run
//! use graph_vault::config::GraphVaultConfig;
//! use graph_vault::graph_store::GraphStore;
//! use graph_vault::models::{Entity, Relation};
//!
//! # async fn run() -> graph_vault::error::Result<()> {
//! let config = GraphVaultConfig::from_env()?;
//! let graph = GraphStore::from_config(&config)?;
//! graph.initialize().await?;
//!
//! graph.persist_entity(&Entity::new("Ferris", "crab", ["likes Rust"])).await?;
//! graph.persist_relation(&Relation::new("Ferris", "maintains", "cargo")).await?;
//!
//! for item in graph.search_similar("who likes Rust?", None).await? {
//!     println!("{item:?}");
//! }
//! # Ok(()) }
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::collection::ensure_collection;
use crate::config::{GraphVaultConfig, validate_collection_name};
use crate::connection::ConnectionManager;
use crate::embedding::{Embedder, OpenAiEmbedder, entity_text, relation_text};
use crate::error::{Error, Result, StoreError};
use crate::identity::{RelationKeyScheme, entity_id};
use crate::models::{Entity, GraphItem, KnowledgeGraph, Relation};
use crate::payload;
use crate::vector_store::{Point, QdrantStore, VectorStore};

/// Number of hits [`GraphStore::search_similar`] asks for when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Points fetched per request by [`GraphStore::load_graph`].
const SCROLL_PAGE_SIZE: usize = 256;

/// Persistence façade over a vector store and an embedder.
pub struct GraphStore {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    connection: ConnectionManager,
    collection: Option<String>,
    relation_keys: RelationKeyScheme,
}

impl GraphStore {
    /// Assemble a store from already-built collaborators.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: Option<String>,
    ) -> Self {
        let connection = ConnectionManager::new(store.clone());
        Self::with_connection(store, embedder, connection, collection)
    }

    /// Like [`new`](Self::new) but with a caller-provided connection manager
    /// (e.g. one with a custom retry policy).
    pub fn with_connection(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        connection: ConnectionManager,
        collection: Option<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            connection,
            collection,
            relation_keys: RelationKeyScheme::default(),
        }
    }

    pub fn with_relation_keys(mut self, scheme: RelationKeyScheme) -> Self {
        self.relation_keys = scheme;
        self
    }

    /// Wire a [`QdrantStore`] and an [`OpenAiEmbedder`] from configuration.
    ///
    /// # Errors
    /// [`Error::Config`] when either client rejects the configuration.
    pub fn from_config(config: &GraphVaultConfig) -> Result<Self> {
        let store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(config)?);
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(config)?);
        Ok(Self::new(store, embedder, config.collection_name.clone())
            .with_relation_keys(config.relation_key_scheme))
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Connect, then make the collection match the embedder's vector size.
    ///
    /// Must run before the other operations. Recreating a mismatched collection
    /// discards every point in it.
    pub async fn initialize(&self) -> Result<()> {
        let collection = self.ready().await?;
        ensure_collection(
            self.store.as_ref(),
            collection,
            self.embedder.dimensions() as u64,
        )
        .await?;
        info!("Graph store ready on collection {}", collection);
        Ok(())
    }

    /// Store `entity`, replacing any stored entity with the same name.
    ///
    /// # Errors
    /// - [`Error::InvalidInput`] if `entity.name` is empty.
    /// - [`Error::Embedding`] / [`Error::StoreOperation`] from the two round trips.
    pub async fn persist_entity(&self, entity: &Entity) -> Result<()> {
        let collection = self.ready().await?;
        if entity.name.is_empty() {
            return Err(Error::InvalidInput("entity name must not be empty".to_string()));
        }
        let vector = self.embedder.embed(&entity_text(entity)).await?;
        let point = Point {
            id: entity_id(&entity.name),
            vector,
            payload: payload::encode(&GraphItem::Entity(entity.clone())),
        };
        debug!("Upserting entity {} as point {}", entity.name, point.id);
        self.store
            .upsert(collection, vec![point])
            .await
            .map_err(Error::store("upsert entity"))
    }

    /// Store `relation`, keyed by its `(from, relation_type, to)` triple.
    pub async fn persist_relation(&self, relation: &Relation) -> Result<()> {
        let collection = self.ready().await?;
        let vector = self.embedder.embed(&relation_text(relation)).await?;
        let point = Point {
            id: self.relation_keys.id(relation),
            vector,
            payload: payload::encode(&GraphItem::Relation(relation.clone())),
        };
        debug!("Upserting relation {:?} as point {}", relation, point.id);
        self.store
            .upsert(collection, vec![point])
            .await
            .map_err(Error::store("upsert relation"))
    }

    /// Graph elements closest to `query`, most similar first.
    ///
    /// Hits whose payload isn't an entity or relation are dropped, so fewer than
    /// `limit` items may come back.
    ///
    /// # Parameters
    /// - `query`: embedded as-is.
    /// - `limit`: neighbours to request; [`DEFAULT_SEARCH_LIMIT`] when `None`.
    pub async fn search_similar(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<GraphItem>> {
        let collection = self.ready().await?;
        let vector = self.embedder.embed(query).await?;
        let hits = self
            .store
            .search(collection, vector, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await
            .map_err(Error::store("search"))?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| hit.payload)
            .filter_map(payload::decode)
            .collect())
    }

    /// Remove the entity named `name`. Absent names are not an error.
    pub async fn delete_entity(&self, name: &str) -> Result<()> {
        let collection = self.ready().await?;
        self.store
            .delete_points(collection, vec![entity_id(name)])
            .await
            .map_err(Error::store("delete entity"))
    }

    /// Remove `relation`. Absent relations are not an error.
    pub async fn delete_relation(&self, relation: &Relation) -> Result<()> {
        let collection = self.ready().await?;
        self.store
            .delete_points(collection, vec![self.relation_keys.id(relation)])
            .await
            .map_err(Error::store("delete relation"))
    }

    /// Read every graph element in the collection.
    pub async fn load_graph(&self) -> Result<KnowledgeGraph> {
        let collection = self.ready().await?;
        let mut graph = KnowledgeGraph::default();
        let mut offset = None;

        loop {
            let page = self
                .store
                .scroll(collection, SCROLL_PAGE_SIZE, offset.clone())
                .await
                .map_err(Error::store("scroll"))?;
            page.points
                .into_iter()
                .filter_map(|record| record.payload)
                .filter_map(payload::decode)
                .for_each(|item| graph.push(item));

            match page.next_offset {
                Some(next) if offset.as_ref() == Some(&next) => {
                    return Err(Error::store("scroll")(StoreError::InvalidResponse(format!(
                        "next page offset {next} did not advance"
                    ))));
                }
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(
            "Loaded {} entities and {} relations from {}",
            graph.entities.len(),
            graph.relations.len(),
            collection
        );
        Ok(graph)
    }

    async fn ready(&self) -> Result<&str> {
        self.connection.ensure_connected().await?;
        let collection = self
            .collection
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Config("collection name is not configured".to_string()))?;
        validate_collection_name(collection)?;
        Ok(collection)
    }
}
