//! # Graph Vault (library root)
//!
//! Persists a small knowledge graph (named entities and typed relations between
//! them) into a Qdrant collection so it can be searched by meaning as well as by
//! identity.
//!
//! - Graph types (`models`) and their point payloads (`payload`).
//! - Deterministic point ids from identity keys (`identity`).
//! - Embeddings through an OpenAI-compatible endpoint (`embedding`).
//! - The Qdrant REST client (`vector_store`), connection retry (`connection`) and
//!   collection lifecycle (`collection`).
//! - The public façade tying it together (`graph_store`).
//! - Configuration (`config`), errors (`error`) and the `gv` CLI (`commands`).
//!
//! ## Quick start
//! ```no_run
//! use graph_vault::{GraphStore, config::GraphVaultConfig, models::Entity};
//!
//! # #[tokio::main] async fn main() -> graph_vault::error::Result<()> {
//! let mut config = GraphVaultConfig::new("http://localhost:6333", "sk-...");
//! config.collection_name = Some("memory".to_string());
//!
//! let graph = GraphStore::from_config(&config)?;
//! graph.initialize().await?;
//! graph.persist_entity(&Entity::new("Ferris", "crab", ["likes Rust"])).await?;
//! let hits = graph.search_similar("crab", Some(5)).await?;
//! # Ok(()) }
//! ```
//!
//! ## Modules
//! - [`collection`], [`commands`], [`config`], [`connection`], [`embedding`],
//!   [`error`], [`graph_store`], [`identity`], [`models`], [`payload`],
//!   [`vector_store`]

use directories::ProjectDirs;

pub mod collection;
pub mod commands;
pub mod config;
pub mod connection;
pub mod embedding;
pub mod error;
pub mod graph_store;
pub mod identity;
pub mod models;
pub mod payload;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
pub use graph_store::GraphStore;

/// Return the per-platform configuration directory used by Graph Vault.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "graph-vault", "gv")` (e.g. `~/.config/gv` on Linux).
///
/// The directory is **not** created by this function.
///
/// # Errors
/// Returns [`Error::Config`] if the platform configuration directory cannot be
/// determined (rare, but possible in heavily sandboxed environments).
pub fn config_dir() -> Result<std::path::PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "graph-vault", "gv")
        .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;
    Ok(proj_dirs.config_dir().to_path_buf())
}
