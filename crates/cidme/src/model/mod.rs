//! Data model types for CIDME resource trees:
//! - Identifiers (typed resource URIs)
//! - Node variants (Entity, EntityContext, DataGroup kinds)
//! - RDF statements and the fixed vocabulary

pub mod id;
pub mod node;
pub mod rdf;

pub use id::{ResourceId, ResourceType, SCHEME};
pub use node::{
    default_context, DataGroup, DataGroupKind, Entity, EntityContext, Node, NodeRef, PrefixMap,
    TAG_CONTEXT_DATA_GROUP, TAG_CONTEXT_LINK_DATA_GROUP, TAG_ENTITY, TAG_ENTITY_CONTEXT,
    TAG_META_DATA_GROUP,
};
pub use rdf::{
    RdfData, RdfLiteral, RdfObject, DCTERMS_CREATED, DCTERMS_CREATOR, DCTERMS_MODIFIED,
    DEFAULT_VOCAB, TAG_CONTEXT_DATA, TAG_CONTEXT_LINK_DATA, TAG_METADATA, TAG_RDF_DATA,
    TAG_RDF_STATEMENT,
};
