//! # Collection lifecycle
//!
//! [`ensure_collection`] makes the target collection exist with the vector size
//! the current embedding model produces.
//!
//! **Dimension migration is destructive.** When the existing collection has a
//! different vector size, or its size can't be read, the collection is deleted
//! and created again. Every point stored in it is lost. The vector size is fixed
//! by the embedding model, and vectors of the old size can't be searched with
//! the new model, so a wipe is the only repair offered. Re-persist the graph
//! afterwards.

use tracing::{debug, info, warn};

use crate::error::{Error, Result, StoreError};
use crate::vector_store::{Distance, VectorStore};

/// Make sure `name` exists with `required_dim`-sized cosine vectors.
///
/// Idempotent: when the collection already matches, only read calls are made.
///
/// # Errors
/// [`Error::CollectionInit`] wrapping the first store error. Nothing is retried.
pub async fn ensure_collection(
    store: &dyn VectorStore,
    name: &str,
    required_dim: u64,
) -> Result<()> {
    reconcile(store, name, required_dim)
        .await
        .map_err(|source| Error::CollectionInit {
            collection: name.to_string(),
            source,
        })
}

async fn reconcile(
    store: &dyn VectorStore,
    name: &str,
    required_dim: u64,
) -> std::result::Result<(), StoreError> {
    let collections = store.list_collections().await?;
    if !collections.iter().any(|c| c == name) {
        info!("Creating collection {} with vector size {}", name, required_dim);
        return store.create_collection(name, required_dim, Distance::Cosine).await;
    }

    let info = store.collection_info(name).await?;
    match info.vector_size {
        Some(size) if size == required_dim => {
            debug!("Collection {} already has vector size {}", name, size);
            Ok(())
        }
        found => {
            warn!(
                "Recreating collection {}: vector size {:?} does not match required {}; all stored points are discarded",
                name, found, required_dim
            );
            store.delete_collection(name).await?;
            store.create_collection(name, required_dim, Distance::Cosine).await
        }
    }
}
