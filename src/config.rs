//! This module provides loading and validation of the graph vault configuration.
//!
//! It defines the [`GraphVaultConfig`] struct, which can be read from a YAML file
//! with [`load_config`] or assembled from environment variables with
//! [`GraphVaultConfig::from_env`].
//!
//! # Examples
//!
//! ```no_run
//! use graph_vault::config::load_config;
//!
//! let config = load_config("/path/to/config.yaml").unwrap();
//! println!("{:?}", config.collection_name);
//! ```
//!
//! A minimal YAML file:
//!
//! ```yaml
//! qdrant_url: "http://localhost:6333"
//! collection_name: "memory"
//! embedding_api_key: "sk-..."
//! ```

use serde::{Deserialize, Serialize};
use std::{env, fs};

use tracing::*;

use crate::error::{Error, Result};
use crate::identity::RelationKeyScheme;

pub const DEFAULT_EMBEDDING_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Settings for the vector store, the embedding provider and identity derivation.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct GraphVaultConfig {
    /// Base URL of the Qdrant REST API. Must start with `http://` or `https://`.
    pub qdrant_url: String,

    /// Optional Qdrant API key, sent as the `api-key` header.
    #[serde(default)]
    pub qdrant_api_key: Option<String>,

    /// Target collection. Only checked when an operation needs it.
    #[serde(default)]
    pub collection_name: Option<String>,

    /// Bearer token for the embedding endpoint.
    pub embedding_api_key: String,

    #[serde(default = "default_embedding_api_base")]
    pub embedding_api_base: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    // Vector size produced by `embedding_model`
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    // Per-request timeout for the store client
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub relation_key_scheme: RelationKeyScheme,
}

fn default_embedding_api_base() -> String {
    DEFAULT_EMBEDDING_API_BASE.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_dimensions() -> usize {
    DEFAULT_EMBEDDING_DIMENSIONS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl GraphVaultConfig {
    /// Configuration with defaults for everything but the two required values.
    pub fn new(qdrant_url: impl Into<String>, embedding_api_key: impl Into<String>) -> Self {
        Self {
            qdrant_url: qdrant_url.into(),
            qdrant_api_key: None,
            collection_name: None,
            embedding_api_key: embedding_api_key.into(),
            embedding_api_base: default_embedding_api_base(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            relation_key_scheme: RelationKeyScheme::default(),
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// # Variables
    /// - `QDRANT_URL` (required), `QDRANT_API_KEY`, `COLLECTION_NAME`
    /// - `OPENAI_API_KEY` (required), `OPENAI_API_BASE`, `EMBEDDING_MODEL`,
    ///   `EMBEDDING_DIMENSIONS`
    /// - `QDRANT_TIMEOUT_SECS`, `RELATION_KEY_SCHEME`
    ///
    /// # Errors
    /// [`Error::Config`] if a required variable is missing, a numeric one does not
    /// parse, or the result fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{key} must be set")))
        };

        let mut config = Self::new(required("QDRANT_URL")?, required("OPENAI_API_KEY")?);
        config.qdrant_api_key = lookup("QDRANT_API_KEY").filter(|v| !v.is_empty());
        config.collection_name = lookup("COLLECTION_NAME").filter(|v| !v.is_empty());
        if let Some(base) = lookup("OPENAI_API_BASE") {
            config.embedding_api_base = base;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Some(dims) = lookup("EMBEDDING_DIMENSIONS") {
            config.embedding_dimensions = dims
                .parse()
                .map_err(|e| Error::Config(format!("EMBEDDING_DIMENSIONS: {e}")))?;
        }
        if let Some(secs) = lookup("QDRANT_TIMEOUT_SECS") {
            config.request_timeout_secs = secs
                .parse()
                .map_err(|e| Error::Config(format!("QDRANT_TIMEOUT_SECS: {e}")))?;
        }
        if let Some(scheme) = lookup("RELATION_KEY_SCHEME") {
            config.relation_key_scheme = scheme.parse().map_err(Error::Config)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the settings that can be checked without talking to anything.
    ///
    /// The collection name is not required here; each operation that needs it
    /// checks for it. A name that is set must still be usable in a URL path.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.qdrant_url)?;
        if let Some(name) = self.collection_name.as_deref().filter(|n| !n.is_empty()) {
            validate_collection_name(name)?;
        }
        if self.embedding_dimensions == 0 {
            return Err(Error::Config(
                "embedding_dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reject anything that is not an `http://` or `https://` URL.
pub(crate) fn validate_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "qdrant_url must start with http:// or https://, got `{url}`"
        )))
    }
}

/// Reject collection names that would change the meaning of a request path.
pub(crate) fn validate_collection_name(name: &str) -> Result<()> {
    const RESERVED: &[char] = &['/', '\\', '?', '#', '%', ':', '*', '"', '<', '>', '|'];
    if name.len() > 255 || name.chars().any(|c| c.is_control() || RESERVED.contains(&c)) {
        return Err(Error::Config(format!(
            "collection_name `{name}` contains characters not allowed in a collection name"
        )));
    }
    Ok(())
}

/// Loads the configuration from a YAML file and validates it.
///
/// # Parameters
///
/// - `file`: The path to the YAML configuration file.
///
/// # Returns
///
/// - `Ok(GraphVaultConfig)`: The loaded configuration.
/// - `Err(Error::Config)`: The file could not be read, parsed, or validated.
pub fn load_config(file: &str) -> Result<GraphVaultConfig> {
    debug!("Loading config from {:?}", file);
    let content =
        fs::read_to_string(file).map_err(|e| Error::Config(format!("reading {file}: {e}")))?;
    let config: GraphVaultConfig =
        serde_yaml::from_str(&content).map_err(|e| Error::Config(format!("parsing {file}: {e}")))?;
    config.validate()?;
    Ok(config)
}
