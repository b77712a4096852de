//! Point payload codec.
//!
//! A payload is the graph element's own fields plus a `type` discriminator:
//!
//! ```text
//! {"type": "entity",   "name": ..., "entityType": ..., "observations": [...]}
//! {"type": "relation", "from": ..., "to": ...,         "relationType": ...}
//! ```
//!
//! Decoding is strict about shape and lenient about extras: unknown fields are
//! ignored, but a wrong discriminator, a missing field or a field of the wrong
//! type rejects the payload. Rejection is not an error. Collections may hold
//! points written by other tools and those must not break a search.

use serde_json::Value;
use tracing::debug;

use crate::models::GraphItem;

/// Payload for `item`, discriminator included.
pub fn encode(item: &GraphItem) -> Value {
    // GraphItem only holds strings; serializing it to a Value can't fail.
    serde_json::to_value(item).unwrap_or(Value::Null)
}

/// Classify a raw payload. `None` means "not a graph element".
pub fn decode(payload: Value) -> Option<GraphItem> {
    match serde_json::from_value::<GraphItem>(payload) {
        Ok(item) => Some(item),
        Err(e) => {
            debug!("Skipping non-graph payload: {}", e);
            None
        }
    }
}
