//! # Error types
//!
//! Every public operation on [`GraphStore`](crate::graph_store::GraphStore) either
//! completes or returns one [`Error`] kind. Errors coming from the vector store
//! collaborator are first expressed as a [`StoreError`] and then wrapped with the
//! operation that produced them, so nothing is swallowed on the way up.
//!
//! The only failure that is *not* surfaced is a search hit whose payload is not a
//! graph element; see [`crate::payload::decode`].

use std::sync::Arc;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`VectorStore`](crate::vector_store::VectorStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response (DNS, TLS, timeout, connection refused).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status code.
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The store answered 2xx but the body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Top-level error for graph persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// A required setting is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The store stayed unreachable through every connection attempt.
    ///
    /// Callers that waited on the same round share its last error.
    #[error("could not reach vector store after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: Arc<StoreError>,
    },

    /// The collection could not be verified, created or recreated.
    #[error("failed to initialize collection `{collection}`: {source}")]
    CollectionInit {
        collection: String,
        #[source]
        source: StoreError,
    },

    /// The embedding provider failed; carries the provider's message.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// An upsert, search, delete or scroll request failed.
    #[error("{operation} failed: {source}")]
    StoreOperation {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// The caller handed in a graph element that can't be stored.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub(crate) fn store(operation: &'static str) -> impl FnOnce(StoreError) -> Error {
        move |source| Error::StoreOperation { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_operation_message_names_the_operation() {
        let err = Error::store("upsert")(StoreError::Status {
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.to_string(), "upsert failed: store returned HTTP 500: boom");
    }

    #[test]
    fn connection_error_keeps_last_cause() {
        let err = Error::Connection {
            attempts: 3,
            source: Arc::new(StoreError::InvalidResponse("nope".into())),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("invalid response: nope"));
    }
}
