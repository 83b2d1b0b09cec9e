//! Mapping configuration and bootstrap.
//!
//! A [`Configuration`] carries the defaults applied while building mappings
//! and merges the registries of its [`MappingProvider`]s into one validated
//! [`MappingRegistry`].

mod naming;

pub use naming::NamingStrategy;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::identity::{IdentityGenerator, ObjectIdGenerator};
use crate::mapping::{ChangeTracking, MappingRegistry};

/// Default discriminator field.
pub const DEFAULT_DISCRIMINATOR_FIELD: &str = "__t";

/// Default optimistic versioning field.
pub const DEFAULT_VERSION_FIELD: &str = "__v";

/// Default pessimistic locking field.
pub const DEFAULT_LOCK_FIELD: &str = "__l";

/// Default database name.
pub const DEFAULT_DATABASE: &str = "default";

/// Produces a mapping registry for a configuration.
pub trait MappingProvider {
    /// Build the provider's mappings using the configuration's defaults.
    fn get_mapping(&self, config: &Configuration) -> Result<MappingRegistry>;
}

/// Mapping defaults.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Identity generator for entity roots without an explicit one.
    pub identity_generator: Arc<dyn IdentityGenerator>,

    /// Entities are lockable by default.
    pub lockable: bool,

    /// Default lock field.
    pub lock_field: String,

    /// Entities are versioned by default.
    pub versioned: bool,

    /// Default version field.
    pub version_field: String,

    /// Default discriminator field.
    pub discriminator_field: String,

    /// Default change tracking policy.
    pub change_tracking: ChangeTracking,

    /// Naming strategy for collection names.
    pub collection_naming: NamingStrategy,

    /// Naming strategy for document field names.
    pub field_naming: NamingStrategy,

    /// Naming strategy for discriminator values.
    pub discriminator_naming: NamingStrategy,

    /// Database used by entities without an override.
    pub database_name: String,
}

impl Configuration {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            identity_generator: Arc::new(ObjectIdGenerator::new()),
            lockable: false,
            lock_field: DEFAULT_LOCK_FIELD.to_string(),
            versioned: true,
            version_field: DEFAULT_VERSION_FIELD.to_string(),
            discriminator_field: DEFAULT_DISCRIMINATOR_FIELD.to_string(),
            change_tracking: ChangeTracking::Observe,
            collection_naming: NamingStrategy::CamelCase,
            field_naming: NamingStrategy::CamelCase,
            discriminator_naming: NamingStrategy::None,
            database_name: DEFAULT_DATABASE.to_string(),
        }
    }

    /// Set the default identity generator.
    pub fn with_identity_generator(mut self, generator: Arc<dyn IdentityGenerator>) -> Self {
        self.identity_generator = generator;
        self
    }

    /// Set whether entities are lockable by default.
    pub fn with_lockable(mut self, lockable: bool) -> Self {
        self.lockable = lockable;
        self
    }

    /// Set the default lock field.
    pub fn with_lock_field(mut self, field: impl Into<String>) -> Self {
        self.lock_field = field.into();
        self
    }

    /// Set whether entities are versioned by default.
    pub fn with_versioned(mut self, versioned: bool) -> Self {
        self.versioned = versioned;
        self
    }

    /// Set the default version field.
    pub fn with_version_field(mut self, field: impl Into<String>) -> Self {
        self.version_field = field.into();
        self
    }

    /// Set the default discriminator field.
    pub fn with_discriminator_field(mut self, field: impl Into<String>) -> Self {
        self.discriminator_field = field.into();
        self
    }

    /// Set the default change tracking policy.
    pub fn with_change_tracking(mut self, tracking: ChangeTracking) -> Self {
        self.change_tracking = tracking;
        self
    }

    /// Set the collection naming strategy.
    pub fn with_collection_naming(mut self, strategy: NamingStrategy) -> Self {
        self.collection_naming = strategy;
        self
    }

    /// Set the field naming strategy.
    pub fn with_field_naming(mut self, strategy: NamingStrategy) -> Self {
        self.field_naming = strategy;
        self
    }

    /// Set the discriminator naming strategy.
    pub fn with_discriminator_naming(mut self, strategy: NamingStrategy) -> Self {
        self.discriminator_naming = strategy;
        self
    }

    /// Set the default database.
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Merge the registries of all providers and validate collection names.
    pub fn build_registry(&self, providers: &[&dyn MappingProvider]) -> Result<MappingRegistry> {
        if providers.is_empty() {
            return Err(Error::NoMappings);
        }

        let mut registry = MappingRegistry::new();
        for provider in providers {
            let mappings = provider.get_mapping(self)?;
            registry.merge(&mappings)?;
        }

        self.check_collections(&registry)?;
        debug!(mappings = registry.len(), "Built mapping registry");
        Ok(registry)
    }

    /// Check that every entity root names a collection, and that no two
    /// roots share a `database/collection` pair.
    pub fn check_collections(&self, registry: &MappingRegistry) -> Result<()> {
        let mut seen = HashSet::new();

        for mapping in registry.entity_mappings() {
            if !mapping.is_inheritance_root() {
                continue;
            }
            let Some(entity) = mapping.entity_mapping() else {
                continue;
            };

            let collection = entity
                .collection_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| Error::MissingCollectionName {
                    name: mapping.name.clone(),
                })?;
            let database = entity.database_name.as_deref().unwrap_or(&self.database_name);

            let key = format!("{database}/{collection}");
            if !seen.insert(key.clone()) {
                return Err(Error::DuplicateCollection {
                    key,
                    name: mapping.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
