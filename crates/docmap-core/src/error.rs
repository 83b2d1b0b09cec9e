//! Core error types.

use crate::mapping::{TypeKey, ValidationReport};
use thiserror::Error;

/// Result type for registry and bootstrap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fail-fast errors.
///
/// These indicate a programming or configuration mistake. Problems with the
/// shape of data flowing through the mapper are reported as
/// [`MappingError`](crate::transform::MappingError)s instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A mapping for the type was already registered.
    #[error("mapping '{name}' has already been registered")]
    DuplicateMapping {
        /// Name of the rejected mapping.
        name: String,
    },

    /// No mapping is registered for the type key.
    #[error("no mapping registered for type {0}")]
    UnknownMapping(TypeKey),

    /// The mapping names an inheritance root that is not flagged as one.
    #[error("mapping '{name}' has invalid inheritance root '{root}'")]
    InvalidInheritanceRoot {
        /// Name of the mapping being registered.
        name: String,
        /// Name of the claimed root.
        root: String,
    },

    /// An entity inheritance root is missing its root policy.
    #[error("entity mapping '{name}' is an inheritance root without a root policy")]
    MissingRootPolicy {
        /// Name of the entity mapping.
        name: String,
    },

    /// A discriminator value is used twice in one hierarchy.
    #[error("discriminator value '{value}' is already used in the hierarchy of '{root}'")]
    DuplicateDiscriminator {
        /// Name of the hierarchy root.
        root: String,
        /// The duplicated value.
        value: String,
    },

    /// The operation requires an entity mapping.
    #[error("mapping '{name}' is not an entity mapping")]
    NotAnEntity {
        /// Name of the mapping.
        name: String,
    },

    /// An entity root has no collection name.
    #[error("missing collection name on mapping for type '{name}'")]
    MissingCollectionName {
        /// Name of the mapping.
        name: String,
    },

    /// Two entity roots map to the same collection.
    #[error("duplicate collection name '{key}' on type '{name}'")]
    DuplicateCollection {
        /// The `database/collection` key.
        key: String,
        /// Name of the second mapping.
        name: String,
    },

    /// Bootstrap was attempted without any mapping providers.
    #[error("no mappings were added to the configuration")]
    NoMappings,

    /// Mapping declarations failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationReport),
}

impl Error {
    /// Creates a duplicate mapping error.
    pub fn duplicate_mapping(name: impl Into<String>) -> Self {
        Self::DuplicateMapping { name: name.into() }
    }

    /// Creates a not-an-entity error.
    pub fn not_an_entity(name: impl Into<String>) -> Self {
        Self::NotAnEntity { name: name.into() }
    }
}
