//! Recursive structural validation for resource trees.
//!
//! Validation is re-derived from scratch on every call: there is no
//! incremental or diff-based path. A node passes only if
//! 1. its document form satisfies the generic graph-document schema,
//! 2. its document form satisfies the node-shape schema for its kind,
//! 3. every element of every present child collection carries an identifier
//!    whose resource type matches the collection, and itself validates
//!    recursively (short-circuit on first failure), and
//! 4. no identifier appears twice anywhere in the reachable subtree.
//!
//! The boolean contract is `validate`; diagnostics ride a side channel and
//! are retrievable via `last_report` after a `false` result.

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashSet;
use serde_json::Value;
use tracing::debug;

use crate::model::{DataGroup, EntityContext, NodeRef, RdfData, ResourceId, ResourceType};
use crate::schema;

/// One validation failure, located by JSON-pointer-style path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// The diagnostic detail accompanying a failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue {
                path: path.into(),
                message: message.into(),
            }],
        }
    }

    fn from_schema_errors(validator: &jsonschema::Validator, document: &Value) -> Self {
        Self {
            issues: validator
                .iter_errors(document)
                .map(|error| ValidationIssue {
                    path: error.instance_path.to_string(),
                    message: error.to_string(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("no issues recorded");
        }
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Whole-subtree validator with a retained last-failure report.
///
/// Single-threaded by design, like the rest of the engine; the report cell
/// is plain interior mutability, not a synchronization point.
#[derive(Debug, Default)]
pub struct Validator {
    debug: bool,
    last: RefCell<ValidationReport>,
}

impl Validator {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            last: RefCell::new(ValidationReport::default()),
        }
    }

    /// Validates a node and its entire reachable subtree.
    ///
    /// Returns `false` on the first failure and records the diagnostic
    /// report for [`Self::last_report`].
    pub fn validate(&self, node: NodeRef<'_>) -> bool {
        match self.check(node) {
            Ok(()) => {
                self.last.replace(ValidationReport::default());
                true
            }
            Err(report) => {
                if self.debug {
                    debug!(node = %node.id(), "validation failed: {report}");
                }
                self.last.replace(report);
                false
            }
        }
    }

    /// The report recorded by the most recent failed [`Self::validate`] call.
    pub fn last_report(&self) -> ValidationReport {
        self.last.borrow().clone()
    }

    /// Result-shaped validation; used by the factory and mutators.
    pub fn check(&self, node: NodeRef<'_>) -> Result<(), ValidationReport> {
        let mut seen = FxHashSet::default();
        collect_duplicate(node, &mut seen)?;
        check_node(node)
    }
}

/// Walks the subtree rejecting any identifier that occurs twice.
fn collect_duplicate(
    node: NodeRef<'_>,
    seen: &mut FxHashSet<ResourceId>,
) -> Result<(), ValidationReport> {
    if !seen.insert(*node.id()) {
        return Err(ValidationReport::single(
            String::new(),
            format!("identifier {} appears more than once in the tree", node.id()),
        ));
    }
    let visit_contexts = |contexts: &Option<Vec<EntityContext>>,
                          seen: &mut FxHashSet<ResourceId>|
     -> Result<(), ValidationReport> {
        for context in contexts.iter().flatten() {
            collect_duplicate(NodeRef::Context(context), seen)?;
        }
        Ok(())
    };
    let visit_groups = |groups: &Option<Vec<DataGroup>>,
                        seen: &mut FxHashSet<ResourceId>|
     -> Result<(), ValidationReport> {
        for group in groups.iter().flatten() {
            collect_duplicate(NodeRef::DataGroup(group), seen)?;
        }
        Ok(())
    };
    match node {
        NodeRef::Entity(entity) => {
            visit_contexts(&entity.entity_contexts, seen)?;
            visit_groups(&entity.metadata, seen)?;
        }
        NodeRef::Context(context) => {
            visit_contexts(&context.entity_contexts, seen)?;
            visit_groups(&context.context_data, seen)?;
            visit_groups(&context.link_data, seen)?;
            visit_groups(&context.metadata, seen)?;
        }
        NodeRef::DataGroup(group) => {
            for statement in group.data.iter().flatten() {
                collect_duplicate(NodeRef::Rdf(statement), seen)?;
            }
            visit_groups(&group.metadata, seen)?;
        }
        NodeRef::Rdf(_) => {}
    }
    Ok(())
}

/// Schema checks plus recursive descent, failing fast.
fn check_node(node: NodeRef<'_>) -> Result<(), ValidationReport> {
    let expected = node.expected_resource_type();
    if node.id().resource_type() != expected {
        return Err(ValidationReport::single(
            "/@id".to_string(),
            format!(
                "identifier resource type {} does not match node kind {}",
                node.id().resource_type(),
                node.type_tag(),
            ),
        ));
    }

    let document = node.to_document();
    let report = ValidationReport::from_schema_errors(schema::graph_document(), &document);
    if !report.is_empty() {
        return Err(report);
    }
    let report = ValidationReport::from_schema_errors(schema::node_shape(), &document);
    if !report.is_empty() {
        return Err(report);
    }

    match node {
        NodeRef::Entity(entity) => {
            check_contexts(&entity.entity_contexts)?;
            check_groups(&entity.metadata)?;
        }
        NodeRef::Context(context) => {
            check_groups(&context.metadata)?;
            check_groups(&context.link_data)?;
            check_groups(&context.context_data)?;
            check_contexts(&context.entity_contexts)?;
        }
        NodeRef::DataGroup(group) => {
            check_statements(&group.data)?;
            check_groups(&group.metadata)?;
        }
        NodeRef::Rdf(_) => {}
    }
    Ok(())
}

fn check_contexts(contexts: &Option<Vec<EntityContext>>) -> Result<(), ValidationReport> {
    for context in contexts.iter().flatten() {
        require_type(&context.id, ResourceType::EntityContext)?;
        check_node(NodeRef::Context(context))?;
    }
    Ok(())
}

fn check_groups(groups: &Option<Vec<DataGroup>>) -> Result<(), ValidationReport> {
    for group in groups.iter().flatten() {
        require_type(&group.id, ResourceType::DataGroup)?;
        check_node(NodeRef::DataGroup(group))?;
    }
    Ok(())
}

fn check_statements(statements: &Option<Vec<RdfData>>) -> Result<(), ValidationReport> {
    for statement in statements.iter().flatten() {
        require_type(&statement.id, ResourceType::RdfData)?;
        check_node(NodeRef::Rdf(statement))?;
    }
    Ok(())
}

fn require_type(id: &ResourceId, expected: ResourceType) -> Result<(), ValidationReport> {
    if id.resource_type() != expected {
        return Err(ValidationReport::single(
            String::new(),
            format!("child {} must carry resource type {expected}", id),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_context, DataGroupKind, Entity, ResourceId};

    fn entity() -> Entity {
        Entity {
            id: ResourceId::generate(ResourceType::Entity),
            context: default_context(),
            entity_contexts: None,
            metadata: None,
        }
    }

    fn context() -> EntityContext {
        EntityContext {
            id: ResourceId::generate(ResourceType::EntityContext),
            context: default_context(),
            entity_contexts: None,
            context_data: None,
            link_data: None,
            metadata: None,
        }
    }

    #[test]
    fn test_bare_entity_validates() {
        let validator = Validator::new(false);
        assert!(validator.validate(NodeRef::Entity(&entity())));
        assert!(validator.last_report().is_empty());
    }

    #[test]
    fn test_nested_tree_validates() {
        let mut inner = context();
        inner.context_data = Some(vec![DataGroup {
            id: ResourceId::generate(ResourceType::DataGroup),
            kind: DataGroupKind::ContextData,
            data: None,
            metadata: None,
        }]);
        let mut root = entity();
        root.entity_contexts = Some(vec![inner]);

        let validator = Validator::new(false);
        assert!(validator.validate(NodeRef::Entity(&root)));
    }

    #[test]
    fn test_ill_typed_child_identifier_fails() {
        let mut bad = context();
        // A context node whose identifier claims to be a DataGroup.
        bad.id = ResourceId::generate(ResourceType::DataGroup);
        let mut root = entity();
        root.entity_contexts = Some(vec![bad]);

        let validator = Validator::new(false);
        assert!(!validator.validate(NodeRef::Entity(&root)));
        assert!(!validator.last_report().is_empty());
    }

    #[test]
    fn test_duplicate_identifier_fails() {
        let shared = context();
        let mut root = entity();
        root.entity_contexts = Some(vec![shared.clone(), shared]);

        let validator = Validator::new(false);
        assert!(!validator.validate(NodeRef::Entity(&root)));
        let report = validator.last_report();
        assert!(report.issues[0].message.contains("more than once"));
    }

    #[test]
    fn test_report_cleared_after_success() {
        let validator = Validator::new(false);
        let mut bad = entity();
        bad.id = ResourceId::generate(ResourceType::RdfData);
        assert!(!validator.validate(NodeRef::Entity(&bad)));
        assert!(!validator.last_report().is_empty());

        assert!(validator.validate(NodeRef::Entity(&entity())));
        assert!(validator.last_report().is_empty());
    }
}
