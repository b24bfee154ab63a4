//! Flattening a resource tree into row-insert descriptions.
//!
//! The projection is an interface to an external relational store, not a
//! storage engine: it emits one row descriptor per Entity, EntityContext,
//! and DataGroup node, and leaves delivery to a caller-supplied
//! [`RowSink`]. Statement leaves are not rows of their own; a data group's
//! statement list is serialized into the group row's `data` column.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::model::{DataGroup, Entity, EntityContext, NodeRef, PrefixMap, ResourceId};

/// Column order shared by every emitted row.
pub const COLUMNS: [&str; 5] = ["id", "parent_id", "context", "type", "data"];

/// One row-insert description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Column name to value, keyed by the names in [`COLUMNS`].
    pub values: Map<String, Value>,
    /// The column order the external store expects.
    pub columns: Vec<&'static str>,
}

/// Destination for projected rows. Implementations bridge to an external
/// relational store; delivery order is parent before children.
pub trait RowSink {
    type Error;

    fn insert(&mut self, row: &Row) -> Result<(), Self::Error>;
}

/// Projects a node and its subtree into row descriptors, parent rows first.
///
/// `parent_id` is the immediate parent of `node` (`None` when projecting a
/// tree root). Statement leaves produce no rows.
pub fn project_to_rows(parent_id: Option<&ResourceId>, node: NodeRef<'_>) -> Vec<Row> {
    let mut rows = Vec::new();
    match node {
        NodeRef::Entity(entity) => project_entity(parent_id, entity, &mut rows),
        NodeRef::Context(context) => project_context(parent_id, context, &mut rows),
        NodeRef::DataGroup(group) => project_group(parent_id, group, &mut rows),
        NodeRef::Rdf(_) => {}
    }
    rows
}

/// Drives every projected row into `sink`, stopping at the first sink error.
pub fn project_into<S: RowSink>(
    sink: &mut S,
    parent_id: Option<&ResourceId>,
    node: NodeRef<'_>,
) -> Result<(), S::Error> {
    for row in project_to_rows(parent_id, node) {
        sink.insert(&row)?;
    }
    Ok(())
}

fn row(
    id: &ResourceId,
    parent_id: Option<&ResourceId>,
    context: Option<&PrefixMap>,
    type_tag: &str,
    data: Option<String>,
) -> Row {
    let mut values = Map::new();
    values.insert("id".to_string(), json!(id.to_string()));
    values.insert(
        "parent_id".to_string(),
        parent_id.map_or(Value::Null, |parent| json!(parent.to_string())),
    );
    values.insert(
        "context".to_string(),
        context.map_or(Value::Null, |map| json!(map)),
    );
    values.insert("type".to_string(), json!(type_tag));
    values.insert("data".to_string(), data.map_or(Value::Null, Value::String));
    Row {
        values,
        columns: COLUMNS.to_vec(),
    }
}

fn project_entity(parent_id: Option<&ResourceId>, entity: &Entity, rows: &mut Vec<Row>) {
    rows.push(row(
        &entity.id,
        parent_id,
        Some(&entity.context),
        NodeRef::Entity(entity).type_tag(),
        None,
    ));
    for context in entity.entity_contexts.iter().flatten() {
        project_context(Some(&entity.id), context, rows);
    }
    for group in entity.metadata.iter().flatten() {
        project_group(Some(&entity.id), group, rows);
    }
}

fn project_context(parent_id: Option<&ResourceId>, context: &EntityContext, rows: &mut Vec<Row>) {
    rows.push(row(
        &context.id,
        parent_id,
        Some(&context.context),
        NodeRef::Context(context).type_tag(),
        None,
    ));
    for nested in context.entity_contexts.iter().flatten() {
        project_context(Some(&context.id), nested, rows);
    }
    for groups in [&context.context_data, &context.link_data, &context.metadata] {
        for group in groups.iter().flatten() {
            project_group(Some(&context.id), group, rows);
        }
    }
}

fn project_group(parent_id: Option<&ResourceId>, group: &DataGroup, rows: &mut Vec<Row>) {
    let data = group.data.as_ref().map(|statements| {
        let documents: Vec<Value> = statements
            .iter()
            .map(|statement| statement.to_document())
            .collect();
        Value::Array(documents).to_string()
    });
    rows.push(row(
        &group.id,
        parent_id,
        None,
        NodeRef::DataGroup(group).type_tag(),
        data,
    ));
    for nested in group.metadata.iter().flatten() {
        project_group(Some(&group.id), nested, rows);
    }
}
