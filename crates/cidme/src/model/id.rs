//! Typed resource URIs for CIDME.
//!
//! Every node in a resource tree is addressed by a URI of the fixed form
//! `cidme://ResourceType/UUIDv4`. The resource type names the structural
//! family of the node and the UUID makes the identifier globally unique.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use uuid::{Uuid, Variant};

use crate::error::IdError;

/// The URI scheme prefix, including the authority separator.
pub const SCHEME: &str = "cidme://";

/// The closed set of resource-type tokens an identifier may carry.
///
/// `DataGroup` is shared by all three data-group node kinds; the node's
/// type tag disambiguates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Entity,
    EntityContext,
    DataGroup,
    RdfData,
}

impl ResourceType {
    /// All valid resource types, in declaration order.
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Entity,
        ResourceType::EntityContext,
        ResourceType::DataGroup,
        ResourceType::RdfData,
    ];

    /// Returns the token used in the URI form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Entity => "Entity",
            ResourceType::EntityContext => "EntityContext",
            ResourceType::DataGroup => "DataGroup",
            ResourceType::RdfData => "RdfData",
        }
    }

    /// Parses a URI token, rejecting anything outside the fixed set.
    pub fn from_token(token: &str) -> Result<Self, IdError> {
        match token {
            "Entity" => Ok(ResourceType::Entity),
            "EntityContext" => Ok(ResourceType::EntityContext),
            "DataGroup" => Ok(ResourceType::DataGroup),
            "RdfData" => Ok(ResourceType::RdfData),
            _ => Err(IdError::InvalidResourceType {
                token: token.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed resource identifier: `cidme://ResourceType/UUIDv4`.
///
/// Immutable once assigned. The UUID must be a version-4 UUID with the
/// RFC 4122 variant; anything else is rejected at construction, so a held
/// `ResourceId` is always well formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    resource_type: ResourceType,
    uuid: Uuid,
}

impl ResourceId {
    /// Mints a fresh identifier with a random version-4 UUID.
    pub fn generate(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            uuid: Uuid::new_v4(),
        }
    }

    /// Builds an identifier from an already-parsed UUID.
    ///
    /// Rejects UUIDs that are not version 4 / RFC 4122 variant.
    pub fn new(resource_type: ResourceType, uuid: Uuid) -> Result<Self, IdError> {
        if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
            return Err(IdError::InvalidUuid {
                segment: uuid.to_string(),
            });
        }
        Ok(Self {
            resource_type,
            uuid,
        })
    }

    /// Encodes an identifier from its two URI segments.
    ///
    /// Fails with [`IdError::InvalidResourceType`] for tokens outside the
    /// fixed set and [`IdError::InvalidUuid`] for segments that do not parse
    /// as a version-4 UUID.
    pub fn from_parts(type_token: &str, uuid_segment: &str) -> Result<Self, IdError> {
        let resource_type = ResourceType::from_token(type_token)?;
        let uuid = Uuid::parse_str(uuid_segment).map_err(|_| IdError::InvalidUuid {
            segment: uuid_segment.to_string(),
        })?;
        Self::new(resource_type, uuid)
    }

    /// Decodes an identifier from its URI form.
    ///
    /// The 8-character scheme prefix must match exactly; the remainder is
    /// split positionally on `/` (the third and fourth segments are the
    /// resource type and UUID) and re-validated through [`Self::from_parts`].
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if !s.starts_with(SCHEME) {
            let found = s.chars().take(SCHEME.len()).collect();
            return Err(IdError::InvalidScheme { found });
        }
        let mut segments = s.split('/');
        // "cidme:" / "" / type / uuid
        let type_token = segments.nth(2).unwrap_or("");
        let uuid_segment = segments.next().unwrap_or("");
        Self::from_parts(type_token, uuid_segment)
    }

    /// The resource type embedded in the identifier.
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// The UUID component.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", SCHEME, self.resource_type, self.uuid)
    }
}

impl FromStr for ResourceId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn v4(bytes: [u8; 16]) -> Uuid {
        let mut bytes = bytes;
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        Uuid::from_bytes(bytes)
    }

    #[test]
    fn test_display_form() {
        let uuid = v4([0xAB; 16]);
        let id = ResourceId::new(ResourceType::EntityContext, uuid).unwrap();
        assert_eq!(id.to_string(), format!("cidme://EntityContext/{uuid}"));
    }

    #[test]
    fn test_parse_roundtrip_all_types() {
        for resource_type in ResourceType::ALL {
            let id = ResourceId::generate(resource_type);
            let parsed = ResourceId::parse(&id.to_string()).unwrap();
            assert_eq!(parsed, id);
            assert_eq!(parsed.resource_type(), resource_type);
        }
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        let err = ResourceId::parse("https://Entity/550e8400-e29b-41d4-a716-446655440000")
            .unwrap_err();
        assert!(matches!(err, IdError::InvalidScheme { .. }));
    }

    #[test]
    fn test_rejects_unknown_resource_type() {
        let err =
            ResourceId::parse("cidme://Widget/550e8400-e29b-41d4-a716-446655440000").unwrap_err();
        assert_eq!(
            err,
            IdError::InvalidResourceType {
                token: "Widget".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_malformed_uuid() {
        let err = ResourceId::parse("cidme://Entity/not-a-uuid").unwrap_err();
        assert!(matches!(err, IdError::InvalidUuid { .. }));
    }

    #[test]
    fn test_rejects_non_v4_uuid() {
        // Version nibble forced to 1.
        let err =
            ResourceId::parse("cidme://Entity/550e8400-e29b-11d4-a716-446655440000").unwrap_err();
        assert!(matches!(err, IdError::InvalidUuid { .. }));
    }

    #[test]
    fn test_rejects_missing_segments() {
        let err = ResourceId::parse("cidme://Entity").unwrap_err();
        assert!(matches!(err, IdError::InvalidUuid { .. }));

        let err = ResourceId::parse("cidme://").unwrap_err();
        assert!(matches!(err, IdError::InvalidResourceType { .. }));
    }

    #[test]
    fn test_serde_string_form() {
        let id = ResourceId::generate(ResourceType::DataGroup);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: ResourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    proptest! {
        #[test]
        fn prop_encode_decode_roundtrip(bytes in any::<[u8; 16]>(), type_index in 0usize..4) {
            let uuid = v4(bytes);
            let resource_type = ResourceType::ALL[type_index];
            let id = ResourceId::from_parts(resource_type.as_str(), &uuid.to_string()).unwrap();
            let decoded = ResourceId::parse(&id.to_string()).unwrap();
            prop_assert_eq!(decoded.resource_type(), resource_type);
            prop_assert_eq!(decoded.uuid(), uuid);
        }
    }
}
