//! CIDME: a typed, recursively-nested resource-tree engine.
//!
//! This crate maintains the structural integrity of trees of typed nodes
//! (entities, their contexts, and attached metadata and data statements)
//! under insertion, deletion, and lookup. Every node is addressed by a typed URI
//! of the form `cidme://ResourceType/UUIDv4`, and every mutation re-derives
//! the tree's validity from scratch against a closed, schema-defined set of
//! parent/child relationships.
//!
//! # Overview
//!
//! - **Factory-born nodes**: the [`Engine`] constructs nodes of each kind,
//!   validated before they are returned, with optional auto-attached
//!   creation/modification provenance.
//! - **Whole-tree validation**: after every attach, the full tree is
//!   re-checked against two fixed JSON schemas plus the URI-type and
//!   id-uniqueness invariants; there is no incremental path.
//! - **Exclusive-borrow mutation**: mutators take `&mut` on the tree;
//!   the exclusive borrow is the concurrency model, and any failure
//!   leaves the tree untouched.
//!
//! # Quick Start
//!
//! ```rust
//! use cidme::{CreateOptions, DataGroupSlot, Engine, Node, NodeRef};
//! use cidme::tree::{find_by_id, find_by_id_with_path};
//!
//! let engine = Engine::new();
//!
//! // A root entity with provenance metadata.
//! let mut tree = engine.create_entity(CreateOptions::default()).unwrap();
//! let root_id = tree.id;
//!
//! // Attach a context under the root, then a data group under the context.
//! let context = engine.create_entity_context(CreateOptions::default()).unwrap();
//! let context_id = context.id;
//! engine
//!     .attach(&mut tree, &root_id, Node::Context(context), None)
//!     .unwrap();
//!
//! let group = engine
//!     .create_context_data_group(None, CreateOptions::default())
//!     .unwrap();
//! let group_id = group.id;
//! engine
//!     .attach(&mut tree, &context_id, Node::DataGroup(group), Some(DataGroupSlot::ContextData))
//!     .unwrap();
//!
//! assert!(engine.validate(NodeRef::Entity(&tree)));
//! let found = find_by_id_with_path(&tree, &group_id).unwrap();
//! assert_eq!(found.path.len(), 3);
//! assert!(find_by_id(&tree, &group_id).is_some());
//! ```
//!
//! # Modules
//!
//! - [`model`]: identifiers, node variants, RDF statements, vocabulary
//! - [`engine`]: engine configuration and the resource factory
//! - [`validate`]: recursive structural validation
//! - [`tree`]: attach/detach mutation and id lookup
//! - [`project`]: flattening trees into relational row descriptors
//! - [`schema`]: the two fixed JSON schemas
//! - [`error`]: error types

pub mod engine;
pub mod error;
pub mod model;
pub mod project;
pub mod schema;
pub mod tree;
pub mod validate;

// Re-export commonly used types at crate root
pub use engine::{CreateOptions, Engine, EngineOptions};
pub use error::{Error, IdError};
pub use model::{
    default_context, DataGroup, DataGroupKind, Entity, EntityContext, Node, NodeRef, PrefixMap,
    RdfData, RdfLiteral, RdfObject, ResourceId, ResourceType, SCHEME,
};
pub use project::{project_into, project_to_rows, Row, RowSink, COLUMNS};
pub use tree::{find_by_id, find_by_id_with_path, Breadcrumb, DataGroupSlot, Found};
pub use validate::{ValidationIssue, ValidationReport, Validator};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
