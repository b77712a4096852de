//! # Point identity
//!
//! Graph elements are addressed in the store by a numeric point id derived from an
//! *identity key*. The id is the first four bytes (big-endian) of the SHA-256
//! digest of the key, so the same key always lands on the same point and a
//! re-persist overwrites instead of duplicating.
//!
//! Truncating to 32 bits means collisions become likely around 2^16 distinct keys.
//!
//! ```rust
//! use graph_vault::identity::hash;
//!
//! assert_eq!(hash("hello"), 0x2cf2_4dba);
//! ```

use serde::{Deserialize, Serialize};

use crate::models::Relation;

/// Map `text` to a stable 32-bit id.
pub fn hash(text: &str) -> u32 {
    let digest = sha256::digest(text);
    // 8 hex chars = 4 bytes, most significant first.
    u32::from_str_radix(&digest[..8], 16).unwrap_or_default()
}

/// How a relation's `(from, relation_type, to)` triple becomes its identity key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKeyScheme {
    /// `"{n}:{from}|{n}:{relation_type}|{n}:{to}"` with byte lengths. Unambiguous.
    #[default]
    LengthPrefixed,
    /// `"{from}-{relation_type}-{to}"`. Distinct triples can collide when a field
    /// contains `-`; kept for collections written with this layout.
    Joined,
}

impl RelationKeyScheme {
    pub fn key(self, relation: &Relation) -> String {
        let Relation {
            from,
            to,
            relation_type,
        } = relation;
        match self {
            RelationKeyScheme::LengthPrefixed => format!(
                "{}:{from}|{}:{relation_type}|{}:{to}",
                from.len(),
                relation_type.len(),
                to.len()
            ),
            RelationKeyScheme::Joined => format!("{from}-{relation_type}-{to}"),
        }
    }

    pub fn id(self, relation: &Relation) -> u32 {
        hash(&self.key(relation))
    }
}

impl std::str::FromStr for RelationKeyScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length_prefixed" => Ok(RelationKeyScheme::LengthPrefixed),
            "joined" => Ok(RelationKeyScheme::Joined),
            other => Err(format!(
                "unknown relation key scheme `{other}` (expected `length_prefixed` or `joined`)"
            )),
        }
    }
}

/// Point id for an entity name.
pub fn entity_id(name: &str) -> u32 {
    hash(name)
}
