//! Graph domain types.
//!
//! These are the values callers hand to [`GraphStore`](crate::graph_store::GraphStore)
//! and get back from search. Field names serialize in camelCase (`entityType`,
//! `relationType`) because that is the shape stored in point payloads.

use serde::{Deserialize, Serialize};

/// A named node in the knowledge graph.
///
/// `name` is the sole identity source: two entities with the same name map to the
/// same stored point.
///
/// # Examples
/// ```rust
/// use graph_vault::models::Entity;
///
/// let e = Entity::new("Ferris", "crab", ["likes Rust", "lives in the sea"]);
/// assert_eq!(e.observations.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    pub entity_type: String,
    pub observations: Vec<String>,
}

impl Entity {
    pub fn new<I, S>(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        observations: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            observations: observations.into_iter().map(Into::into).collect(),
        }
    }
}

/// A directed, typed edge between two entities (by name).
///
/// Identity is the ordered triple `(from, relation_type, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub from: String,
    pub to: String,
    pub relation_type: String,
}

impl Relation {
    pub fn new(
        from: impl Into<String>,
        relation_type: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation_type: relation_type.into(),
        }
    }
}

/// Either kind of graph element.
///
/// Serialized with an internal `type` tag (`"entity"` / `"relation"`), which is
/// exactly the point payload layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphItem {
    Entity(Entity),
    Relation(Relation),
}

impl From<Entity> for GraphItem {
    fn from(e: Entity) -> Self {
        GraphItem::Entity(e)
    }
}

impl From<Relation> for GraphItem {
    fn from(r: Relation) -> Self {
        GraphItem::Relation(r)
    }
}

/// Every graph element found in a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

impl KnowledgeGraph {
    pub fn push(&mut self, item: GraphItem) {
        match item {
            GraphItem::Entity(e) => self.entities.push(e),
            GraphItem::Relation(r) => self.relations.push(r),
        }
    }
}
