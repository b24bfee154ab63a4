//! RDF statement leaves and the fixed CIDME vocabulary.
//!
//! Data groups carry ordered lists of [`RdfData`] statements. A statement is
//! a predicate plus exactly one object, which is either a reference to
//! another resource (an IRI or prefixed name) or a scalar literal. The enum
//! shape makes "both" and "neither" unrepresentable.

use serde_json::{json, Value};

use crate::model::id::ResourceId;

/// Default vocabulary IRI placed in every namespace-prefix table.
pub const DEFAULT_VOCAB: &str = "http://cidme.net/vocab/core/0.6.0/";

/// Generic statement marker; present on every RdfData type-tag list.
pub const TAG_RDF_STATEMENT: &str = "RdfStatement";
/// Node-kind marker; present on every RdfData type-tag list.
pub const TAG_RDF_DATA: &str = "RdfData";

/// Context marker for statements describing metadata.
pub const TAG_METADATA: &str = "MetaData";
/// Context marker for statements carrying entity-context data.
pub const TAG_CONTEXT_DATA: &str = "EntityContextData";
/// Context marker for statements linking entity contexts.
pub const TAG_CONTEXT_LINK_DATA: &str = "EntityContextLinkData";

/// Provenance predicate: creation timestamp.
pub const DCTERMS_CREATED: &str = "http://purl.org/dc/terms/created";
/// Provenance predicate: last-modification timestamp.
pub const DCTERMS_MODIFIED: &str = "http://purl.org/dc/terms/modified";
/// Provenance predicate: creator reference.
pub const DCTERMS_CREATOR: &str = "http://purl.org/dc/terms/creator";

/// A scalar literal object.
#[derive(Debug, Clone, PartialEq)]
pub enum RdfLiteral {
    String(String),
    Bool(bool),
    Number(serde_json::Number),
    Null,
}

impl RdfLiteral {
    fn to_json(&self) -> Value {
        match self {
            RdfLiteral::String(s) => Value::String(s.clone()),
            RdfLiteral::Bool(b) => Value::Bool(*b),
            RdfLiteral::Number(n) => Value::Number(n.clone()),
            RdfLiteral::Null => Value::Null,
        }
    }
}

/// The object of a statement: a resource reference or a scalar literal.
#[derive(Debug, Clone, PartialEq)]
pub enum RdfObject {
    /// An IRI or prefixed name naming another resource.
    Reference(String),
    /// A literal value.
    Literal(RdfLiteral),
}

impl RdfObject {
    /// Convenience constructor for string literals.
    pub fn literal_str(value: impl Into<String>) -> Self {
        RdfObject::Literal(RdfLiteral::String(value.into()))
    }

    /// Convenience constructor for references.
    pub fn reference(iri: impl Into<String>) -> Self {
        RdfObject::Reference(iri.into())
    }

    fn to_json(&self) -> Value {
        match self {
            RdfObject::Reference(iri) => json!({ "@id": iri }),
            RdfObject::Literal(lit) => lit.to_json(),
        }
    }
}

/// A leaf statement node.
///
/// The type-tag list always contains [`TAG_RDF_STATEMENT`] and
/// [`TAG_RDF_DATA`] plus at least one context marker; the factory appends
/// the two fixed tags, callers supply the marker.
#[derive(Debug, Clone, PartialEq)]
pub struct RdfData {
    pub id: ResourceId,
    pub types: Vec<String>,
    pub predicate: String,
    pub object: RdfObject,
}

impl RdfData {
    /// Serializes the statement to its document form.
    pub fn to_document(&self) -> Value {
        json!({
            "@id": self.id.to_string(),
            "@type": self.types,
            "predicate": self.predicate,
            "object": self.object.to_json(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::ResourceType;

    #[test]
    fn test_reference_document_form() {
        let statement = RdfData {
            id: ResourceId::generate(ResourceType::RdfData),
            types: vec![
                TAG_METADATA.to_string(),
                TAG_RDF_STATEMENT.to_string(),
                TAG_RDF_DATA.to_string(),
            ],
            predicate: DCTERMS_CREATOR.to_string(),
            object: RdfObject::reference("cidme://Entity/550e8400-e29b-41d4-a716-446655440000"),
        };
        let doc = statement.to_document();
        assert_eq!(doc["predicate"], DCTERMS_CREATOR);
        assert!(doc["object"]["@id"].is_string());
    }

    #[test]
    fn test_literal_document_form() {
        let statement = RdfData {
            id: ResourceId::generate(ResourceType::RdfData),
            types: vec![
                TAG_CONTEXT_DATA.to_string(),
                TAG_RDF_STATEMENT.to_string(),
                TAG_RDF_DATA.to_string(),
            ],
            predicate: "label".to_string(),
            object: RdfObject::literal_str("a plain label"),
        };
        let doc = statement.to_document();
        assert_eq!(doc["object"], "a plain label");
    }
}
