//! The two fixed JSON schemas the validator runs against every node.
//!
//! Both are compiled exactly once, at first use. The schema set is a
//! versioned constant of the engine, not a user-extensible surface:
//! - the *graph document* schema checks the generic labeled-graph shape
//!   (`@id`, `@type`) of any node document;
//! - the *node shape* schema is a discriminated union keyed by the declared
//!   type tag, selecting the legal property set per node kind and requiring
//!   every present child collection to be non-empty.

use lazy_static::lazy_static;
use serde_json::{json, Value};

fn graph_document_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "CIDME graph document",
        "type": "object",
        "required": ["@id", "@type"],
        "properties": {
            "@id": {
                "type": "string",
                "pattern": "^cidme://(Entity|EntityContext|DataGroup|RdfData)/[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
            },
            "@type": {
                "anyOf": [
                    { "type": "string", "minLength": 1 },
                    { "type": "array", "minItems": 1, "items": { "type": "string" } }
                ]
            },
            "@context": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            }
        }
    })
}

fn node_shape_schema() -> Value {
    let prefix_table = json!({
        "type": "object",
        "minProperties": 1,
        "additionalProperties": { "type": "string" }
    });
    let nested = json!({ "type": "array", "minItems": 1, "items": { "type": "object" } });

    let entity = json!({
        "type": "object",
        "required": ["@context", "@id", "@type"],
        "additionalProperties": false,
        "properties": {
            "@context": prefix_table.clone(),
            "@id": { "type": "string", "pattern": "^cidme://Entity/" },
            "@type": { "const": "Entity" },
            "entityContexts": nested.clone(),
            "metaDataGroups": nested.clone()
        }
    });

    let entity_context = json!({
        "type": "object",
        "required": ["@context", "@id", "@type"],
        "additionalProperties": false,
        "properties": {
            "@context": prefix_table.clone(),
            "@id": { "type": "string", "pattern": "^cidme://EntityContext/" },
            "@type": { "const": "EntityContext" },
            "entityContexts": nested.clone(),
            "entityContextData": nested.clone(),
            "entityContextLinkData": nested.clone(),
            "metaDataGroups": nested.clone()
        }
    });

    let data_group = |tag: &str| {
        json!({
            "type": "object",
            "required": ["@id", "@type"],
            "additionalProperties": false,
            "properties": {
                "@id": { "type": "string", "pattern": "^cidme://DataGroup/" },
                "@type": { "const": tag },
                "data": nested.clone(),
                "metaDataGroups": nested.clone()
            }
        })
    };

    let rdf_data = json!({
        "type": "object",
        "required": ["@id", "@type", "predicate", "object"],
        "additionalProperties": false,
        "properties": {
            "@id": { "type": "string", "pattern": "^cidme://RdfData/" },
            "@type": {
                "type": "array",
                "minItems": 3,
                "items": { "type": "string" },
                "allOf": [
                    { "contains": { "const": "RdfStatement" } },
                    { "contains": { "const": "RdfData" } }
                ]
            },
            "predicate": { "type": "string", "minLength": 1 },
            "object": {
                "oneOf": [
                    {
                        "type": "object",
                        "required": ["@id"],
                        "additionalProperties": false,
                        "properties": { "@id": { "type": "string", "minLength": 1 } }
                    },
                    { "type": ["string", "number", "boolean", "null"] }
                ]
            }
        }
    });

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "CIDME node shape",
        "oneOf": [
            entity,
            entity_context,
            data_group("MetaDataGroup"),
            data_group("EntityContextDataGroup"),
            data_group("EntityContextLinkDataGroup"),
            rdf_data
        ]
    })
}

lazy_static! {
    static ref GRAPH_DOCUMENT: jsonschema::Validator =
        jsonschema::validator_for(&graph_document_schema())
            .expect("embedded graph document schema must compile");
    static ref NODE_SHAPE: jsonschema::Validator = jsonschema::validator_for(&node_shape_schema())
        .expect("embedded node shape schema must compile");
}

/// The compiled generic graph-document validator.
pub fn graph_document() -> &'static jsonschema::Validator {
    &GRAPH_DOCUMENT
}

/// The compiled node-shape validator.
pub fn node_shape() -> &'static jsonschema::Validator {
    &NODE_SHAPE
}
