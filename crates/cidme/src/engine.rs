//! Engine configuration and the resource factory.
//!
//! The factory is the only way nodes are born: every constructor validates
//! its output before returning, so "successfully constructed" and "valid"
//! are the same thing. Nodes are created standalone; they gain ancestors
//! only through [`Engine::attach`](crate::tree).

use chrono::Utc;

use crate::error::Error;
use crate::model::{
    default_context, DataGroup, DataGroupKind, Entity, EntityContext, NodeRef, RdfData, RdfObject,
    ResourceId, ResourceType, DCTERMS_CREATED, DCTERMS_CREATOR, DCTERMS_MODIFIED, TAG_METADATA,
    TAG_RDF_DATA, TAG_RDF_STATEMENT,
};
use crate::validate::{ValidationReport, Validator};

/// Construction-time engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Identifier recorded as `dcterms:creator` in provenance statements.
    pub creator: Option<ResourceId>,
    /// Gates diagnostic logging of validator failures.
    pub debug: bool,
}

/// Per-call construction options.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Reuse a pre-existing identifier (reconstruction from storage)
    /// instead of minting a fresh one.
    pub id: Option<ResourceId>,
    /// Attach creation/last-modification provenance metadata. Default true.
    pub provenance: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            id: None,
            provenance: true,
        }
    }
}

impl CreateOptions {
    /// Options for nodes that should carry no provenance metadata.
    pub fn bare() -> Self {
        Self {
            id: None,
            provenance: false,
        }
    }

    /// Options reusing an existing identifier.
    pub fn with_id(id: ResourceId) -> Self {
        Self {
            id: Some(id),
            provenance: true,
        }
    }
}

/// The resource-tree engine: factory, validator, mutators.
#[derive(Debug, Default)]
pub struct Engine {
    validator: Validator,
    creator: Option<ResourceId>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            validator: Validator::new(options.debug),
            creator: options.creator,
        }
    }

    pub(crate) fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Validates any node and its reachable subtree. Diagnostics for the
    /// most recent failure are available from [`Self::last_report`].
    pub fn validate(&self, node: NodeRef<'_>) -> bool {
        self.validator.validate(node)
    }

    /// The diagnostic report of the most recent failed validation.
    pub fn last_report(&self) -> ValidationReport {
        self.validator.last_report()
    }

    // =========================================================================
    // Factory
    // =========================================================================

    /// Constructs a root entity.
    pub fn create_entity(&self, options: CreateOptions) -> Result<Entity, Error> {
        let entity = Entity {
            id: self.resolve_id(options.id, ResourceType::Entity)?,
            context: default_context(),
            entity_contexts: None,
            metadata: self.maybe_provenance(options.provenance)?,
        };
        self.ensure_valid(NodeRef::Entity(&entity))?;
        Ok(entity)
    }

    /// Constructs a standalone entity context.
    pub fn create_entity_context(&self, options: CreateOptions) -> Result<EntityContext, Error> {
        let context = EntityContext {
            id: self.resolve_id(options.id, ResourceType::EntityContext)?,
            context: default_context(),
            entity_contexts: None,
            context_data: None,
            link_data: None,
            metadata: self.maybe_provenance(options.provenance)?,
        };
        self.ensure_valid(NodeRef::Context(&context))?;
        Ok(context)
    }

    /// Constructs a metadata group, optionally seeded with statements.
    pub fn create_metadata_group(
        &self,
        data: Option<Vec<RdfData>>,
        options: CreateOptions,
    ) -> Result<DataGroup, Error> {
        self.create_data_group(DataGroupKind::Metadata, data, options)
    }

    /// Constructs an entity-context data group.
    pub fn create_context_data_group(
        &self,
        data: Option<Vec<RdfData>>,
        options: CreateOptions,
    ) -> Result<DataGroup, Error> {
        self.create_data_group(DataGroupKind::ContextData, data, options)
    }

    /// Constructs an entity-context link data group.
    pub fn create_context_link_data_group(
        &self,
        data: Option<Vec<RdfData>>,
        options: CreateOptions,
    ) -> Result<DataGroup, Error> {
        self.create_data_group(DataGroupKind::ContextLink, data, options)
    }

    fn create_data_group(
        &self,
        kind: DataGroupKind,
        data: Option<Vec<RdfData>>,
        options: CreateOptions,
    ) -> Result<DataGroup, Error> {
        let group = DataGroup {
            id: self.resolve_id(options.id, ResourceType::DataGroup)?,
            kind,
            // An empty list means absence.
            data: data.filter(|statements| !statements.is_empty()),
            metadata: self.maybe_provenance(options.provenance)?,
        };
        self.ensure_valid(NodeRef::DataGroup(&group))?;
        Ok(group)
    }

    /// Constructs a statement leaf.
    ///
    /// The fixed tags `RdfStatement` and `RdfData` are appended to the
    /// caller-supplied tag list; callers supply the context-specific marker
    /// (e.g. [`TAG_METADATA`]). Statement leaves never carry provenance.
    pub fn create_rdf_data(
        &self,
        mut types: Vec<String>,
        predicate: impl Into<String>,
        object: RdfObject,
        options: CreateOptions,
    ) -> Result<RdfData, Error> {
        types.push(TAG_RDF_STATEMENT.to_string());
        types.push(TAG_RDF_DATA.to_string());
        let statement = RdfData {
            id: self.resolve_id(options.id, ResourceType::RdfData)?,
            types,
            predicate: predicate.into(),
            object,
        };
        self.ensure_valid(NodeRef::Rdf(&statement))?;
        Ok(statement)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn resolve_id(
        &self,
        supplied: Option<ResourceId>,
        expected: ResourceType,
    ) -> Result<ResourceId, Error> {
        match supplied {
            None => Ok(ResourceId::generate(expected)),
            Some(id) if id.resource_type() == expected => Ok(id),
            Some(id) => Err(Error::invalid_argument(format!(
                "supplied identifier {id} does not carry resource type {expected}"
            ))),
        }
    }

    fn ensure_valid(&self, node: NodeRef<'_>) -> Result<(), Error> {
        self.validator
            .check(node)
            .map_err(|report| Error::Construction { report })
    }

    fn maybe_provenance(&self, provenance: bool) -> Result<Option<Vec<DataGroup>>, Error> {
        if !provenance {
            return Ok(None);
        }
        let stamp = Utc::now().to_rfc3339();
        Ok(Some(vec![
            self.provenance_group(DCTERMS_CREATED, &stamp)?,
            self.provenance_group(DCTERMS_MODIFIED, &stamp)?,
        ]))
    }

    /// One provenance metadata group: a timestamp statement plus, when a
    /// creator is configured, a creator reference. Provenance groups are
    /// built without provenance of their own.
    fn provenance_group(&self, predicate: &str, stamp: &str) -> Result<DataGroup, Error> {
        let mut data = vec![self.create_rdf_data(
            vec![TAG_METADATA.to_string()],
            predicate,
            RdfObject::literal_str(stamp),
            CreateOptions::bare(),
        )?];
        if let Some(creator) = &self.creator {
            data.push(self.create_rdf_data(
                vec![TAG_METADATA.to_string()],
                DCTERMS_CREATOR,
                RdfObject::reference(creator.to_string()),
                CreateOptions::bare(),
            )?);
        }
        self.create_data_group(DataGroupKind::Metadata, Some(data), CreateOptions::bare())
    }
}
