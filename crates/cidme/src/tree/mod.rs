//! Tree mutation (attach/detach) and read-only lookup.
//!
//! Mutation borrows the tree exclusively; that exclusive borrow is the
//! concurrency model, and every failure leaves the caller's tree
//! untouched. Attach re-validates the whole tree and commits only a tree
//! that passed; detach cannot invalidate a valid tree (it only removes
//! subtrees and drops emptied collections) and so does not re-validate.

use tracing::trace;

use crate::engine::Engine;
use crate::error::Error;
use crate::model::{
    DataGroup, DataGroupKind, Entity, EntityContext, Node, NodeRef, RdfData, ResourceId,
};

/// Selects the destination collection when attaching a data group.
///
/// All three data-group kinds share the `DataGroup` resource type, so an
/// attach of a data group must name its slot; the selector has to agree
/// with the group's own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataGroupSlot {
    Metadata,
    ContextData,
    ContextLink,
}

impl DataGroupSlot {
    fn kind(&self) -> DataGroupKind {
        match self {
            DataGroupSlot::Metadata => DataGroupKind::Metadata,
            DataGroupSlot::ContextData => DataGroupKind::ContextData,
            DataGroupSlot::ContextLink => DataGroupKind::ContextLink,
        }
    }
}

/// One step of a root-first path: the node's type tag and identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Breadcrumb {
    pub type_tag: &'static str,
    pub id: ResourceId,
}

/// A located node together with its root-first ancestor path.
///
/// The path has one entry per tree level, the matched node's own entry
/// last; a node at depth *k* yields *k + 1* entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Found<'a> {
    pub node: NodeRef<'a>,
    pub path: Vec<Breadcrumb>,
}

enum Payload {
    Context(EntityContext),
    Group(DataGroup),
    Rdf(RdfData),
}

impl Engine {
    /// Attaches `node` under every tree node whose identifier equals
    /// `parent_id`, then re-validates the full tree.
    ///
    /// The payload must validate standalone and must not be an `Entity`
    /// (entities are only ever tree roots). Data-group payloads require a
    /// [`DataGroupSlot`] matching the group's kind; for other payloads the
    /// selector is ignored. The walk always completes, visiting every
    /// level regardless of how many nodes match. On any failure the tree
    /// is left untouched.
    pub fn attach(
        &self,
        tree: &mut Entity,
        parent_id: &ResourceId,
        node: Node,
        slot: Option<DataGroupSlot>,
    ) -> Result<(), Error> {
        if let Err(report) = self.validator().check(node.as_ref()) {
            return Err(Error::invalid_argument(format!(
                "resource to attach is not valid: {report}"
            )));
        }
        let payload = match node {
            Node::Entity(_) => {
                return Err(Error::invalid_argument(
                    "an entity is only ever the tree root and cannot be attached",
                ));
            }
            Node::Context(context) => Payload::Context(context),
            Node::DataGroup(group) => {
                match slot {
                    Some(slot) if slot.kind() == group.kind => {}
                    _ => return Err(Error::InvalidDataGroupSelector),
                }
                Payload::Group(group)
            }
            Node::Rdf(statement) => Payload::Rdf(statement),
        };

        // Mutate a working copy so a failed placement or a failed
        // postcondition check never reaches the caller's tree.
        let mut candidate = tree.clone();
        let matches = attach_entity(&mut candidate, parent_id, &payload)?;
        trace!(parent = %parent_id, matches, "attach walk completed");

        self.validator()
            .check(NodeRef::Entity(&candidate))
            .map_err(|report| Error::Postcondition { report })?;
        *tree = candidate;
        Ok(())
    }

    /// Removes every node whose identifier equals `node_id`, together with
    /// its entire subtree. Collections emptied by a removal are dropped.
    ///
    /// Idempotent: an absent identifier is a no-op. The root itself cannot
    /// be detached; that failure leaves the tree untouched.
    pub fn detach(&self, tree: &mut Entity, node_id: &ResourceId) -> Result<(), Error> {
        if tree.id == *node_id {
            return Err(Error::invalid_argument(
                "cannot delete the top-level resource",
            ));
        }
        detach_entity(tree, node_id);
        trace!(node = %node_id, "detach walk completed");
        Ok(())
    }
}

// =============================================================================
// Attach walk
// =============================================================================

// Each walk places after its descent: the walk must terminate for any
// input, so a payload appended at a matching node is never itself
// visited, even when the payload's own id is the attach target.

fn attach_entity(
    entity: &mut Entity,
    target: &ResourceId,
    payload: &Payload,
) -> Result<usize, Error> {
    let mut matches = 0;
    for context in entity.entity_contexts.iter_mut().flatten() {
        matches += attach_context(context, target, payload)?;
    }
    for group in entity.metadata.iter_mut().flatten() {
        matches += attach_group(group, target, payload)?;
    }
    if entity.id == *target {
        place_in_entity(entity, payload)?;
        matches += 1;
    }
    Ok(matches)
}

fn attach_context(
    context: &mut EntityContext,
    target: &ResourceId,
    payload: &Payload,
) -> Result<usize, Error> {
    let mut matches = 0;
    for nested in context.entity_contexts.iter_mut().flatten() {
        matches += attach_context(nested, target, payload)?;
    }
    for group in context.context_data.iter_mut().flatten() {
        matches += attach_group(group, target, payload)?;
    }
    for group in context.link_data.iter_mut().flatten() {
        matches += attach_group(group, target, payload)?;
    }
    for group in context.metadata.iter_mut().flatten() {
        matches += attach_group(group, target, payload)?;
    }
    if context.id == *target {
        place_in_context(context, payload)?;
        matches += 1;
    }
    Ok(matches)
}

fn attach_group(
    group: &mut DataGroup,
    target: &ResourceId,
    payload: &Payload,
) -> Result<usize, Error> {
    let mut matches = 0;
    for nested in group.metadata.iter_mut().flatten() {
        matches += attach_group(nested, target, payload)?;
    }
    if group.id == *target {
        place_in_group(group, payload)?;
        matches += 1;
    }
    Ok(matches)
}

fn place_in_entity(entity: &mut Entity, payload: &Payload) -> Result<(), Error> {
    match payload {
        Payload::Context(context) => {
            entity
                .entity_contexts
                .get_or_insert_with(Vec::new)
                .push(context.clone());
            Ok(())
        }
        Payload::Group(group) if group.kind == DataGroupKind::Metadata => {
            entity.metadata.get_or_insert_with(Vec::new).push(group.clone());
            Ok(())
        }
        Payload::Group(_) => Err(Error::invalid_argument(
            "an entity holds only metadata groups",
        )),
        Payload::Rdf(_) => Err(Error::invalid_argument(
            "statements attach to data groups, not entities",
        )),
    }
}

fn place_in_context(context: &mut EntityContext, payload: &Payload) -> Result<(), Error> {
    match payload {
        Payload::Context(nested) => {
            context
                .entity_contexts
                .get_or_insert_with(Vec::new)
                .push(nested.clone());
            Ok(())
        }
        Payload::Group(group) => {
            let slot = match group.kind {
                DataGroupKind::Metadata => &mut context.metadata,
                DataGroupKind::ContextData => &mut context.context_data,
                DataGroupKind::ContextLink => &mut context.link_data,
            };
            slot.get_or_insert_with(Vec::new).push(group.clone());
            Ok(())
        }
        Payload::Rdf(_) => Err(Error::invalid_argument(
            "statements attach to data groups, not contexts",
        )),
    }
}

fn place_in_group(group: &mut DataGroup, payload: &Payload) -> Result<(), Error> {
    match payload {
        Payload::Group(nested) if nested.kind == DataGroupKind::Metadata => {
            group.metadata.get_or_insert_with(Vec::new).push(nested.clone());
            Ok(())
        }
        Payload::Group(_) => Err(Error::invalid_argument(
            "a data group holds only metadata groups",
        )),
        Payload::Rdf(statement) => {
            group.data.get_or_insert_with(Vec::new).push(statement.clone());
            Ok(())
        }
        Payload::Context(_) => Err(Error::invalid_argument(
            "a data group cannot hold entity contexts",
        )),
    }
}

// =============================================================================
// Detach walk
// =============================================================================

/// Removes matching elements from a collection, recurses into survivors,
/// and drops the collection entirely when it empties.
fn prune<T>(
    collection: &mut Option<Vec<T>>,
    target: &ResourceId,
    id_of: impl Fn(&T) -> &ResourceId,
    mut recurse: impl FnMut(&mut T),
) {
    if let Some(items) = collection {
        items.retain(|item| id_of(item) != target);
        for item in items.iter_mut() {
            recurse(item);
        }
        if items.is_empty() {
            *collection = None;
        }
    }
}

fn detach_entity(entity: &mut Entity, target: &ResourceId) {
    prune(&mut entity.entity_contexts, target, |c| &c.id, |c| {
        detach_context(c, target)
    });
    prune(&mut entity.metadata, target, |g| &g.id, |g| {
        detach_group(g, target)
    });
}

fn detach_context(context: &mut EntityContext, target: &ResourceId) {
    prune(&mut context.entity_contexts, target, |c| &c.id, |c| {
        detach_context(c, target)
    });
    prune(&mut context.context_data, target, |g| &g.id, |g| {
        detach_group(g, target)
    });
    prune(&mut context.link_data, target, |g| &g.id, |g| {
        detach_group(g, target)
    });
    prune(&mut context.metadata, target, |g| &g.id, |g| {
        detach_group(g, target)
    });
}

fn detach_group(group: &mut DataGroup, target: &ResourceId) {
    prune(&mut group.data, target, |s| &s.id, |_| {});
    prune(&mut group.metadata, target, |g| &g.id, |g| {
        detach_group(g, target)
    });
}

// =============================================================================
// Lookup
// =============================================================================

/// Depth-first search for a node by identifier; first structural match
/// wins and the search short-circuits.
pub fn find_by_id<'a>(tree: &'a Entity, id: &ResourceId) -> Option<NodeRef<'a>> {
    if tree.id == *id {
        return Some(NodeRef::Entity(tree));
    }
    for context in tree.entity_contexts.iter().flatten() {
        if let Some(found) = find_in_context(context, id) {
            return Some(found);
        }
    }
    for group in tree.metadata.iter().flatten() {
        if let Some(found) = find_in_group(group, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_context<'a>(context: &'a EntityContext, id: &ResourceId) -> Option<NodeRef<'a>> {
    if context.id == *id {
        return Some(NodeRef::Context(context));
    }
    for nested in context.entity_contexts.iter().flatten() {
        if let Some(found) = find_in_context(nested, id) {
            return Some(found);
        }
    }
    for groups in [&context.context_data, &context.link_data, &context.metadata] {
        for group in groups.iter().flatten() {
            if let Some(found) = find_in_group(group, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_in_group<'a>(group: &'a DataGroup, id: &ResourceId) -> Option<NodeRef<'a>> {
    if group.id == *id {
        return Some(NodeRef::DataGroup(group));
    }
    for nested in group.metadata.iter().flatten() {
        if let Some(found) = find_in_group(nested, id) {
            return Some(found);
        }
    }
    None
}

/// Like [`find_by_id`], additionally returning the root-first breadcrumb
/// path; each frame prepends its own descriptor on the way back up.
pub fn find_by_id_with_path<'a>(tree: &'a Entity, id: &ResourceId) -> Option<Found<'a>> {
    let crumb = Breadcrumb {
        type_tag: NodeRef::Entity(tree).type_tag(),
        id: tree.id,
    };
    if tree.id == *id {
        return Some(Found {
            node: NodeRef::Entity(tree),
            path: vec![crumb],
        });
    }
    for context in tree.entity_contexts.iter().flatten() {
        if let Some(mut found) = find_in_context_with_path(context, id) {
            found.path.insert(0, crumb.clone());
            return Some(found);
        }
    }
    for group in tree.metadata.iter().flatten() {
        if let Some(mut found) = find_in_group_with_path(group, id) {
            found.path.insert(0, crumb.clone());
            return Some(found);
        }
    }
    None
}

fn find_in_context_with_path<'a>(
    context: &'a EntityContext,
    id: &ResourceId,
) -> Option<Found<'a>> {
    let crumb = Breadcrumb {
        type_tag: NodeRef::Context(context).type_tag(),
        id: context.id,
    };
    if context.id == *id {
        return Some(Found {
            node: NodeRef::Context(context),
            path: vec![crumb],
        });
    }
    for nested in context.entity_contexts.iter().flatten() {
        if let Some(mut found) = find_in_context_with_path(nested, id) {
            found.path.insert(0, crumb.clone());
            return Some(found);
        }
    }
    for groups in [&context.context_data, &context.link_data, &context.metadata] {
        for group in groups.iter().flatten() {
            if let Some(mut found) = find_in_group_with_path(group, id) {
                found.path.insert(0, crumb.clone());
                return Some(found);
            }
        }
    }
    None
}

fn find_in_group_with_path<'a>(group: &'a DataGroup, id: &ResourceId) -> Option<Found<'a>> {
    let crumb = Breadcrumb {
        type_tag: NodeRef::DataGroup(group).type_tag(),
        id: group.id,
    };
    if group.id == *id {
        return Some(Found {
            node: NodeRef::DataGroup(group),
            path: vec![crumb],
        });
    }
    for nested in group.metadata.iter().flatten() {
        if let Some(mut found) = find_in_group_with_path(nested, id) {
            found.path.insert(0, crumb.clone());
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::engine::CreateOptions;
    use crate::model::{
        RdfObject, ResourceType, TAG_CONTEXT_DATA, TAG_CONTEXT_DATA_GROUP, TAG_ENTITY,
        TAG_ENTITY_CONTEXT, TAG_METADATA,
    };

    fn engine() -> Engine {
        Engine::new()
    }

    #[test]
    fn test_three_level_scenario() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;

        let context = engine.create_entity_context(CreateOptions::bare()).unwrap();
        let context_id = context.id;
        engine
            .attach(&mut tree, &root_id, Node::Context(context), None)
            .unwrap();

        let group = engine
            .create_context_data_group(None, CreateOptions::bare())
            .unwrap();
        let group_id = group.id;
        engine
            .attach(
                &mut tree,
                &context_id,
                Node::DataGroup(group),
                Some(DataGroupSlot::ContextData),
            )
            .unwrap();

        assert!(engine.validate(NodeRef::Entity(&tree)));

        let found = find_by_id(&tree, &group_id).unwrap();
        assert_eq!(*found.id(), group_id);

        let found = find_by_id_with_path(&tree, &group_id).unwrap();
        let tags: Vec<&str> = found.path.iter().map(|crumb| crumb.type_tag).collect();
        assert_eq!(
            tags,
            vec![TAG_ENTITY, TAG_ENTITY_CONTEXT, TAG_CONTEXT_DATA_GROUP]
        );
        assert_eq!(found.path[0].id, root_id);
        assert_eq!(found.path[1].id, context_id);
        assert_eq!(found.path[2].id, group_id);
    }

    #[test]
    fn test_attach_data_group_without_slot_fails() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;
        let before = tree.clone();
        let group = engine
            .create_metadata_group(None, CreateOptions::bare())
            .unwrap();

        let err = engine
            .attach(&mut tree, &root_id, Node::DataGroup(group), None)
            .unwrap_err();
        assert_eq!(err, Error::InvalidDataGroupSelector);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_attach_data_group_with_contradicting_slot_fails() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;
        let group = engine
            .create_metadata_group(None, CreateOptions::bare())
            .unwrap();

        let err = engine
            .attach(
                &mut tree,
                &root_id,
                Node::DataGroup(group),
                Some(DataGroupSlot::ContextData),
            )
            .unwrap_err();
        assert_eq!(err, Error::InvalidDataGroupSelector);
    }

    #[test]
    fn test_attach_entity_payload_fails_tree_unchanged() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;
        let before = tree.clone();
        let other = engine.create_entity(CreateOptions::bare()).unwrap();

        let err = engine
            .attach(&mut tree, &root_id, Node::Entity(other), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_attach_statement_to_data_group() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;
        let group = engine
            .create_metadata_group(None, CreateOptions::bare())
            .unwrap();
        let group_id = group.id;
        engine
            .attach(
                &mut tree,
                &root_id,
                Node::DataGroup(group),
                Some(DataGroupSlot::Metadata),
            )
            .unwrap();

        let statement = engine
            .create_rdf_data(
                vec![TAG_METADATA.to_string()],
                "label",
                RdfObject::literal_str("note"),
                CreateOptions::bare(),
            )
            .unwrap();
        let statement_id = statement.id;
        engine
            .attach(&mut tree, &group_id, Node::Rdf(statement), None)
            .unwrap();

        let metadata = tree.metadata.as_ref().unwrap();
        let data = metadata[0].data.as_ref().unwrap();
        assert_eq!(data[0].id, statement_id);
    }

    #[test]
    fn test_attach_then_detach_restores_shape() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::default()).unwrap();
        let root_id = tree.id;
        let before = tree.clone();

        let group = engine
            .create_metadata_group(None, CreateOptions::default())
            .unwrap();
        let group_id = group.id;
        engine
            .attach(
                &mut tree,
                &root_id,
                Node::DataGroup(group),
                Some(DataGroupSlot::Metadata),
            )
            .unwrap();
        assert_ne!(tree, before);

        engine.detach(&mut tree, &group_id).unwrap();
        assert_eq!(tree, before);
    }

    #[test]
    fn test_attach_duplicate_identifier_fails_postcondition() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;
        let context = engine.create_entity_context(CreateOptions::bare()).unwrap();
        engine
            .attach(&mut tree, &root_id, Node::Context(context.clone()), None)
            .unwrap();

        // Same node attached twice would alias one identifier across two
        // positions; the whole-tree re-check rejects the mutated tree and
        // the caller's tree stays as it was.
        let before = tree.clone();
        let err = engine
            .attach(&mut tree, &root_id, Node::Context(context), None)
            .unwrap_err();
        assert!(matches!(err, Error::Postcondition { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_attach_targeting_payload_own_identifier_terminates() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;
        let context = engine.create_entity_context(CreateOptions::bare()).unwrap();
        let context_id = context.id;
        engine
            .attach(&mut tree, &root_id, Node::Context(context.clone()), None)
            .unwrap();

        // The payload's own id is the attach target and already exists in
        // the tree. The walk must still complete (the placed copy is never
        // itself visited) and the duplicate id fails the re-check.
        let before = tree.clone();
        let err = engine
            .attach(&mut tree, &context_id, Node::Context(context), None)
            .unwrap_err();
        assert!(matches!(err, Error::Postcondition { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_detach_root_fails_and_tree_unchanged() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;
        let before = tree.clone();

        let err = engine.detach(&mut tree, &root_id).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let engine = engine();
        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;
        let context = engine.create_entity_context(CreateOptions::bare()).unwrap();
        let context_id = context.id;
        engine
            .attach(&mut tree, &root_id, Node::Context(context), None)
            .unwrap();

        engine.detach(&mut tree, &context_id).unwrap();
        let once = tree.clone();
        engine.detach(&mut tree, &context_id).unwrap();
        assert_eq!(tree, once);
        assert!(tree.entity_contexts.is_none());
    }

    #[test]
    fn test_detach_prunes_statement_lists() {
        let engine = engine();
        let statement = engine
            .create_rdf_data(
                vec![TAG_CONTEXT_DATA.to_string()],
                "label",
                RdfObject::literal_str("data"),
                CreateOptions::bare(),
            )
            .unwrap();
        let statement_id = statement.id;

        let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let root_id = tree.id;
        let context = engine.create_entity_context(CreateOptions::bare()).unwrap();
        let context_id = context.id;
        let group = engine
            .create_context_data_group(Some(vec![statement]), CreateOptions::bare())
            .unwrap();
        let group_id = group.id;

        engine
            .attach(&mut tree, &root_id, Node::Context(context), None)
            .unwrap();
        engine
            .attach(
                &mut tree,
                &context_id,
                Node::DataGroup(group),
                Some(DataGroupSlot::ContextData),
            )
            .unwrap();

        engine.detach(&mut tree, &statement_id).unwrap();
        let contexts = tree.entity_contexts.as_ref().unwrap();
        let groups = contexts[0].context_data.as_ref().unwrap();
        assert_eq!(groups[0].id, group_id);
        // The emptied statement list is dropped, not left as [].
        assert!(groups[0].data.is_none());
    }

    #[test]
    fn test_find_miss_returns_none() {
        let engine = engine();
        let tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let absent = ResourceId::generate(ResourceType::EntityContext);
        assert!(find_by_id(&tree, &absent).is_none());
        assert!(find_by_id_with_path(&tree, &absent).is_none());
    }

    #[test]
    fn test_find_root_path_is_single_entry() {
        let engine = engine();
        let tree = engine.create_entity(CreateOptions::bare()).unwrap();
        let found = find_by_id_with_path(&tree, &tree.id).unwrap();
        assert_eq!(found.path.len(), 1);
        assert_eq!(found.path[0].type_tag, TAG_ENTITY);
    }

    proptest! {
        /// Detaching the same identifier twice equals detaching it once,
        /// wherever the node sits in a chain of nested contexts.
        #[test]
        fn prop_detach_idempotent(depth in 1usize..5) {
            let engine = Engine::new();
            let mut tree = engine.create_entity(CreateOptions::bare()).unwrap();
            let mut parent_id = tree.id;
            let mut last_context_id = parent_id;
            for _ in 0..depth {
                let context = engine.create_entity_context(CreateOptions::bare()).unwrap();
                last_context_id = context.id;
                engine
                    .attach(&mut tree, &parent_id, Node::Context(context), None)
                    .unwrap();
                parent_id = last_context_id;
            }

            engine.detach(&mut tree, &last_context_id).unwrap();
            let once = tree.clone();
            engine.detach(&mut tree, &last_context_id).unwrap();
            prop_assert_eq!(tree, once);
        }
    }
}
