//! Error types for identifier handling, construction, and tree mutation.
//!
//! Lookup misses are not errors: locators return `Option` so callers can
//! tell "doesn't exist" apart from "malformed request".

use thiserror::Error;

use crate::validate::ValidationReport;

/// Error decoding or encoding a typed resource URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("invalid scheme: expected `cidme://`, found {found:?}")]
    InvalidScheme { found: String },

    #[error("unknown resource type token: {token:?}")]
    InvalidResourceType { token: String },

    #[error("invalid UUID segment {segment:?}: a version-4 RFC 4122 UUID is required")]
    InvalidUuid { segment: String },
}

/// Error from engine operations: construction, attach, detach.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Missing or malformed caller input.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Malformed identifier input, surfaced unchanged from the codec.
    #[error(transparent)]
    Identifier(#[from] IdError),

    /// A factory output failed validation; construction is aborted.
    #[error("constructed resource failed validation: {report}")]
    Construction { report: ValidationReport },

    /// A data-group attach was requested without a usable slot selector.
    #[error("data group attach requires a slot selector matching the group's kind")]
    InvalidDataGroupSelector,

    /// The tree failed whole-tree validation after a mutation.
    #[error("tree failed validation after mutation: {report}")]
    Postcondition { report: ValidationReport },
}

impl Error {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            reason: reason.into(),
        }
    }
}
