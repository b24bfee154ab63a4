//! The tagged node variants of a resource tree.
//!
//! The Rust enum/struct shape is the source of truth for "what kind of node
//! is this"; the resource type embedded in a node's identifier is a derived
//! projection that the validator checks for consistency. Every optional
//! child collection, when present, is non-empty; emptiness is expressed by
//! field absence (`None`), and mutation code upholds that rule.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::model::id::{ResourceId, ResourceType};
use crate::model::rdf::{RdfData, DEFAULT_VOCAB};

/// Type tag of the root node kind.
pub const TAG_ENTITY: &str = "Entity";
/// Type tag of context nodes.
pub const TAG_ENTITY_CONTEXT: &str = "EntityContext";
/// Type tag of metadata groups.
pub const TAG_META_DATA_GROUP: &str = "MetaDataGroup";
/// Type tag of entity-context data groups.
pub const TAG_CONTEXT_DATA_GROUP: &str = "EntityContextDataGroup";
/// Type tag of entity-context link data groups.
pub const TAG_CONTEXT_LINK_DATA_GROUP: &str = "EntityContextLinkDataGroup";

/// A namespace-prefix table, serialized as the document's `@context`.
pub type PrefixMap = BTreeMap<String, String>;

/// The default prefix table carried by new entities and contexts.
pub fn default_context() -> PrefixMap {
    let mut map = PrefixMap::new();
    map.insert("@vocab".to_string(), DEFAULT_VOCAB.to_string());
    map
}

fn context_json(map: &PrefixMap) -> Value {
    let mut object = Map::new();
    for (prefix, iri) in map {
        object.insert(prefix.clone(), Value::String(iri.clone()));
    }
    Value::Object(object)
}

fn collection_json<T>(items: &Option<Vec<T>>, to_doc: impl Fn(&T) -> Value) -> Option<Value> {
    items
        .as_ref()
        .map(|items| Value::Array(items.iter().map(to_doc).collect()))
}

/// The three data-group kinds sharing the `DataGroup` resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataGroupKind {
    /// Metadata about the parent node (including metadata-about-metadata).
    Metadata,
    /// Data statements belonging to an entity context.
    ContextData,
    /// Link statements belonging to an entity context.
    ContextLink,
}

impl DataGroupKind {
    /// The document type tag for this kind.
    pub fn type_tag(&self) -> &'static str {
        match self {
            DataGroupKind::Metadata => TAG_META_DATA_GROUP,
            DataGroupKind::ContextData => TAG_CONTEXT_DATA_GROUP,
            DataGroupKind::ContextLink => TAG_CONTEXT_LINK_DATA_GROUP,
        }
    }
}

/// The root node of a resource tree. Never nested inside another node.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: ResourceId,
    pub context: PrefixMap,
    pub entity_contexts: Option<Vec<EntityContext>>,
    pub metadata: Option<Vec<DataGroup>>,
}

impl Entity {
    pub fn to_document(&self) -> Value {
        let mut object = Map::new();
        object.insert("@context".to_string(), context_json(&self.context));
        object.insert("@id".to_string(), json!(self.id.to_string()));
        object.insert("@type".to_string(), json!(TAG_ENTITY));
        if let Some(contexts) = collection_json(&self.entity_contexts, EntityContext::to_document)
        {
            object.insert("entityContexts".to_string(), contexts);
        }
        if let Some(groups) = collection_json(&self.metadata, DataGroup::to_document) {
            object.insert("metaDataGroups".to_string(), groups);
        }
        Value::Object(object)
    }
}

/// A context node: nests arbitrarily deep under an entity or another context.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityContext {
    pub id: ResourceId,
    pub context: PrefixMap,
    pub entity_contexts: Option<Vec<EntityContext>>,
    pub context_data: Option<Vec<DataGroup>>,
    pub link_data: Option<Vec<DataGroup>>,
    pub metadata: Option<Vec<DataGroup>>,
}

impl EntityContext {
    pub fn to_document(&self) -> Value {
        let mut object = Map::new();
        object.insert("@context".to_string(), context_json(&self.context));
        object.insert("@id".to_string(), json!(self.id.to_string()));
        object.insert("@type".to_string(), json!(TAG_ENTITY_CONTEXT));
        if let Some(contexts) = collection_json(&self.entity_contexts, EntityContext::to_document)
        {
            object.insert("entityContexts".to_string(), contexts);
        }
        if let Some(groups) = collection_json(&self.context_data, DataGroup::to_document) {
            object.insert("entityContextData".to_string(), groups);
        }
        if let Some(groups) = collection_json(&self.link_data, DataGroup::to_document) {
            object.insert("entityContextLinkData".to_string(), groups);
        }
        if let Some(groups) = collection_json(&self.metadata, DataGroup::to_document) {
            object.insert("metaDataGroups".to_string(), groups);
        }
        Value::Object(object)
    }
}

/// A data group: an ordered list of statements plus nested metadata.
///
/// All three kinds share the `DataGroup` resource type; `kind` is the
/// discriminant and drives the document's type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct DataGroup {
    pub id: ResourceId,
    pub kind: DataGroupKind,
    pub data: Option<Vec<RdfData>>,
    pub metadata: Option<Vec<DataGroup>>,
}

impl DataGroup {
    pub fn to_document(&self) -> Value {
        let mut object = Map::new();
        object.insert("@id".to_string(), json!(self.id.to_string()));
        object.insert("@type".to_string(), json!(self.kind.type_tag()));
        if let Some(data) = collection_json(&self.data, RdfData::to_document) {
            object.insert("data".to_string(), data);
        }
        if let Some(groups) = collection_json(&self.metadata, DataGroup::to_document) {
            object.insert("metaDataGroups".to_string(), groups);
        }
        Value::Object(object)
    }
}

/// An owned node of any kind, for APIs that accept or return whole nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Entity(Entity),
    Context(EntityContext),
    DataGroup(DataGroup),
    Rdf(RdfData),
}

impl Node {
    pub fn id(&self) -> &ResourceId {
        match self {
            Node::Entity(e) => &e.id,
            Node::Context(c) => &c.id,
            Node::DataGroup(g) => &g.id,
            Node::Rdf(r) => &r.id,
        }
    }

    pub fn as_ref(&self) -> NodeRef<'_> {
        match self {
            Node::Entity(e) => NodeRef::Entity(e),
            Node::Context(c) => NodeRef::Context(c),
            Node::DataGroup(g) => NodeRef::DataGroup(g),
            Node::Rdf(r) => NodeRef::Rdf(r),
        }
    }
}

impl From<Entity> for Node {
    fn from(entity: Entity) -> Self {
        Node::Entity(entity)
    }
}

impl From<EntityContext> for Node {
    fn from(context: EntityContext) -> Self {
        Node::Context(context)
    }
}

impl From<DataGroup> for Node {
    fn from(group: DataGroup) -> Self {
        Node::DataGroup(group)
    }
}

impl From<RdfData> for Node {
    fn from(statement: RdfData) -> Self {
        Node::Rdf(statement)
    }
}

/// A borrowed node of any kind, returned by lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Entity(&'a Entity),
    Context(&'a EntityContext),
    DataGroup(&'a DataGroup),
    Rdf(&'a RdfData),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> &'a ResourceId {
        match self {
            NodeRef::Entity(e) => &e.id,
            NodeRef::Context(c) => &c.id,
            NodeRef::DataGroup(g) => &g.id,
            NodeRef::Rdf(r) => &r.id,
        }
    }

    /// The resource type this node's identifier must carry.
    pub fn expected_resource_type(&self) -> ResourceType {
        match self {
            NodeRef::Entity(_) => ResourceType::Entity,
            NodeRef::Context(_) => ResourceType::EntityContext,
            NodeRef::DataGroup(_) => ResourceType::DataGroup,
            NodeRef::Rdf(_) => ResourceType::RdfData,
        }
    }

    /// The primary document type tag.
    pub fn type_tag(&self) -> &'static str {
        match self {
            NodeRef::Entity(_) => TAG_ENTITY,
            NodeRef::Context(_) => TAG_ENTITY_CONTEXT,
            NodeRef::DataGroup(g) => g.kind.type_tag(),
            NodeRef::Rdf(_) => crate::model::rdf::TAG_RDF_DATA,
        }
    }

    pub fn to_document(&self) -> Value {
        match self {
            NodeRef::Entity(e) => e.to_document(),
            NodeRef::Context(c) => c.to_document(),
            NodeRef::DataGroup(g) => g.to_document(),
            NodeRef::Rdf(r) => r.to_document(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_entity() -> Entity {
        Entity {
            id: ResourceId::generate(ResourceType::Entity),
            context: default_context(),
            entity_contexts: None,
            metadata: None,
        }
    }

    #[test]
    fn test_absent_collections_stay_absent_in_document() {
        let doc = bare_entity().to_document();
        let object = doc.as_object().unwrap();
        assert!(!object.contains_key("entityContexts"));
        assert!(!object.contains_key("metaDataGroups"));
        assert_eq!(doc["@type"], TAG_ENTITY);
    }

    #[test]
    fn test_nested_context_document() {
        let inner = EntityContext {
            id: ResourceId::generate(ResourceType::EntityContext),
            context: default_context(),
            entity_contexts: None,
            context_data: None,
            link_data: None,
            metadata: None,
        };
        let mut entity = bare_entity();
        entity.entity_contexts = Some(vec![inner.clone()]);

        let doc = entity.to_document();
        assert_eq!(doc["entityContexts"][0]["@id"], inner.id.to_string());
        assert_eq!(doc["entityContexts"][0]["@type"], TAG_ENTITY_CONTEXT);
    }

    #[test]
    fn test_data_group_kind_drives_type_tag() {
        let group = DataGroup {
            id: ResourceId::generate(ResourceType::DataGroup),
            kind: DataGroupKind::ContextLink,
            data: None,
            metadata: None,
        };
        assert_eq!(group.to_document()["@type"], TAG_CONTEXT_LINK_DATA_GROUP);
    }
}
