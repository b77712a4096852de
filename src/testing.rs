//! In-process stand-ins for the vector store and the embedding provider, used by
//! the unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::embedding::Embedder;
use crate::error::{Error, Result, StoreError};
use crate::identity::hash;
use crate::vector_store::{
    CollectionInfo, Distance, Point, Record, ScoredPoint, ScrollPage, StoreResult, VectorStore,
};

/// A call that changed the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateCollection(String, u64),
    DeleteCollection(String),
    Upsert(String, Vec<u32>),
    DeletePoints(String, Vec<u32>),
}

#[derive(Default)]
struct Collection {
    vector_size: Option<u64>,
    points: BTreeMap<u32, Point>,
}

#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
    calls: Mutex<Vec<StoreCall>>,
    failing_ops: Mutex<HashSet<&'static str>>,
    liveness_failures: AtomicU32,
    liveness_checks: AtomicU32,
    stalled_scroll: AtomicBool,
}

fn not_found(name: &str) -> StoreError {
    StoreError::Status {
        status: 404,
        body: format!("Collection `{name}` doesn't exist!"),
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` `list_collections` calls fail.
    pub fn fail_next_liveness_checks(&self, n: u32) {
        self.liveness_failures.store(n, Ordering::SeqCst);
    }

    pub fn liveness_checks(&self) -> u32 {
        self.liveness_checks.load(Ordering::SeqCst)
    }

    /// Make `scroll` hand back its own start as the next offset, forever.
    pub fn stall_scroll(&self) {
        self.stalled_scroll.store(true, Ordering::SeqCst);
    }

    /// Make every later call of `op` (`"upsert"`, `"search"`, `"delete_points"`, `"scroll"`) fail.
    pub fn fail_operation(&self, op: &'static str) {
        self.failing_ops.lock().unwrap().insert(op);
    }

    /// Add a collection without recording a call. `None` models an unreadable config.
    pub fn seed_collection(&self, name: &str, vector_size: Option<u64>) {
        self.collections.lock().unwrap().insert(
            name.to_string(),
            Collection {
                vector_size,
                points: BTreeMap::new(),
            },
        );
    }

    /// Store a point with an arbitrary payload, bypassing the graph codec.
    pub fn insert_raw(&self, name: &str, id: u32, vector: Vec<f32>, payload: Value) {
        if let Some(c) = self.collections.lock().unwrap().get_mut(name) {
            c.points.insert(id, Point { id, vector, payload });
        }
    }

    pub fn vector_size(&self, name: &str) -> Option<u64> {
        self.collections
            .lock()
            .unwrap()
            .get(name)
            .and_then(|c| c.vector_size)
    }

    pub fn point_count(&self, name: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(name)
            .map_or(0, |c| c.points.len())
    }

    pub fn point(&self, name: &str, id: u32) -> Option<Point> {
        self.collections
            .lock()
            .unwrap()
            .get(name)
            .and_then(|c| c.points.get(&id).cloned())
    }

    pub fn mutating_calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_op(&self, op: &'static str) -> StoreResult<()> {
        if self.failing_ops.lock().unwrap().contains(op) {
            return Err(StoreError::Status {
                status: 503,
                body: format!("{op} unavailable"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.liveness_checks.fetch_add(1, Ordering::SeqCst);
        let pending = self.liveness_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.liveness_failures.store(pending - 1, Ordering::SeqCst);
            return Err(StoreError::InvalidResponse("connection refused".to_string()));
        }
        Ok(self.collections.lock().unwrap().keys().cloned().collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        dim: u64,
        _distance: Distance,
    ) -> StoreResult<()> {
        self.record(StoreCall::CreateCollection(name.to_string(), dim));
        self.seed_collection(name, Some(dim));
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> StoreResult<()> {
        self.record(StoreCall::DeleteCollection(name.to_string()));
        self.collections.lock().unwrap().remove(name);
        Ok(())
    }

    async fn collection_info(&self, name: &str) -> StoreResult<CollectionInfo> {
        self.collections
            .lock()
            .unwrap()
            .get(name)
            .map(|c| CollectionInfo {
                vector_size: c.vector_size,
            })
            .ok_or_else(|| not_found(name))
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> StoreResult<()> {
        self.check_op("upsert")?;
        self.record(StoreCall::Upsert(
            collection.to_string(),
            points.iter().map(|p| p.id).collect(),
        ));
        let mut collections = self.collections.lock().unwrap();
        let c = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;
        for p in points {
            if c.vector_size != Some(p.vector.len() as u64) {
                return Err(StoreError::Status {
                    status: 400,
                    body: "wrong vector dimension".to_string(),
                });
            }
            c.points.insert(p.id, p);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> StoreResult<Vec<ScoredPoint>> {
        self.check_op("search")?;
        let collections = self.collections.lock().unwrap();
        let c = collections.get(collection).ok_or_else(|| not_found(collection))?;
        let mut hits: Vec<ScoredPoint> = c
            .points
            .values()
            .map(|p| ScoredPoint {
                id: json!(p.id),
                score: cosine(&vector, &p.vector),
                payload: Some(p.payload.clone()),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete_points(&self, collection: &str, ids: Vec<u32>) -> StoreResult<()> {
        self.check_op("delete_points")?;
        self.record(StoreCall::DeletePoints(collection.to_string(), ids.clone()));
        let mut collections = self.collections.lock().unwrap();
        let c = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;
        for id in ids {
            c.points.remove(&id);
        }
        Ok(())
    }

    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<Value>,
    ) -> StoreResult<ScrollPage> {
        self.check_op("scroll")?;
        let collections = self.collections.lock().unwrap();
        let c = collections.get(collection).ok_or_else(|| not_found(collection))?;
        let start = offset.and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        let mut iter = c.points.range(start..);
        let points: Vec<Record> = iter
            .by_ref()
            .take(limit)
            .map(|(id, p)| Record {
                id: json!(id),
                payload: Some(p.payload.clone()),
            })
            .collect();
        let next_offset = if self.stalled_scroll.load(Ordering::SeqCst) {
            Some(json!(start))
        } else {
            iter.next().map(|(id, _)| json!(id))
        };
        Ok(ScrollPage {
            points,
            next_offset,
        })
    }
}

/// Deterministic embedder: each word bumps one bucket, then the vector is
/// normalized. Texts sharing words end up close under cosine similarity.
pub struct BagOfWordsEmbedder {
    dimensions: usize,
    failure: Mutex<Option<String>>,
    calls: AtomicU32,
}

impl BagOfWordsEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            failure: Mutex::new(None),
            calls: AtomicU32::new(0),
        }
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::Embedding(message));
        }
        let mut v = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = hash(&word.to_lowercase()) as usize % self.dimensions;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
