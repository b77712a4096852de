//! # Embedding client
//!
//! Turns graph elements and search queries into vectors.
//!
//! The provider is reached through the [`Embedder`] trait. [`OpenAiEmbedder`] is
//! the shipped implementation and talks to any OpenAI-compatible
//! `POST {api_base}/embeddings` endpoint.
//!
//! ## Text forms
//! - Entity: `"{name} ({entity_type}): {observations joined by ". "}"`
//! - Relation: `"{from} {relation_type} {to}"`
//! - Search: the query, untouched.
//!
//! Each call is made exactly once. A failed embedding is reported as
//! [`Error::Embedding`] with the provider's message; retrying is up to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::GraphVaultConfig;
use crate::error::{Error, Result};
use crate::models::{Entity, Relation};

/// Text → fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text`. The result has exactly [`dimensions`](Self::dimensions) components.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Vector size this embedder produces. Drives the collection's vector size.
    fn dimensions(&self) -> usize;
}

/// Text embedded for an entity.
pub fn entity_text(entity: &Entity) -> String {
    format!(
        "{} ({}): {}",
        entity.name,
        entity.entity_type,
        entity.observations.join(". ")
    )
}

/// Text embedded for a relation.
pub fn relation_text(relation: &Relation) -> String {
    format!(
        "{} {} {}",
        relation.from, relation.relation_type, relation.to
    )
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Embedder backed by an OpenAI-compatible HTTP API.
pub struct OpenAiEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Creates a new embedder from configuration.
    ///
    /// # Parameters
    /// - `config`: uses `embedding_api_key`, `embedding_api_base`,
    ///   `embedding_model`, `embedding_dimensions` and `request_timeout_secs`.
    ///
    /// # Errors
    /// [`Error::Config`] if the API key is empty or the HTTP client can't be built.
    pub fn new(config: &GraphVaultConfig) -> Result<Self> {
        if config.embedding_api_key.is_empty() {
            return Err(Error::Config("an embedding API key is required".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.embedding_api_base.trim_end_matches('/').to_string(),
            api_key: config.embedding_api_key.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };
        debug!("Embedding {} chars with {}", text.len(), self.model);

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);
            return Err(Error::Embedding(format!("HTTP {}: {}", status.as_u16(), message)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("malformed response: {e}")))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Embedding("response contained no embedding".to_string()))?;

        if vector.len() != self.dimensions {
            return Err(Error::Embedding(format!(
                "expected {} dimensions, provider returned {}",
                self.dimensions,
                vector.len()
            )));
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
