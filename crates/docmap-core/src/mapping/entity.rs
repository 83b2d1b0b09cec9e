//! Entity-specific mapping data.

use crate::config::{DEFAULT_LOCK_FIELD, DEFAULT_VERSION_FIELD};
use crate::identity::IdentityGenerator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How changes to a loaded entity are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChangeTracking {
    /// Every loaded entity is compared against its original document on flush.
    DeferredImplicit,
    /// Only entities explicitly marked dirty are compared.
    DeferredExplicit,
    /// Entities are watched; only those with an observed mutation are compared.
    #[default]
    Observe,
}

/// Sort order of an index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexOrder {
    /// Ascending order.
    Ascending,
    /// Descending order.
    Descending,
}

/// An index descriptor. Indexes live on the inheritance root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Optional index name.
    pub name: Option<String>,
    /// Indexed document fields.
    pub keys: Vec<(String, IndexOrder)>,
    /// Enforce uniqueness.
    pub unique: bool,
    /// Skip documents lacking the indexed fields.
    pub sparse: bool,
}

impl Index {
    /// Create an ascending single-field index.
    pub fn on(field: impl Into<String>) -> Self {
        Self {
            name: None,
            keys: vec![(field.into(), IndexOrder::Ascending)],
            unique: false,
            sparse: false,
        }
    }

    /// Add another key.
    pub fn and(mut self, field: impl Into<String>, order: IndexOrder) -> Self {
        self.keys.push((field.into(), order));
        self
    }

    /// Set the index name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as sparse.
    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }
}

/// State that is authoritative only on the root of an entity hierarchy.
#[derive(Debug, Clone)]
pub struct RootPolicy {
    /// Identity generator shared by the whole hierarchy.
    pub identity: Arc<dyn IdentityGenerator>,
    /// Indexes of the hierarchy's collection.
    pub indexes: Vec<Index>,
    /// Optimistic versioning enabled.
    pub versioned: bool,
    /// Document field holding the version.
    pub version_field: String,
    /// Pessimistic locking enabled.
    pub lockable: bool,
    /// Document field holding the lock.
    pub lock_field: String,
}

impl RootPolicy {
    /// Create a policy with the given identity generator and default fields.
    pub fn new(identity: Arc<dyn IdentityGenerator>) -> Self {
        Self {
            identity,
            indexes: Vec::new(),
            versioned: true,
            version_field: DEFAULT_VERSION_FIELD.to_string(),
            lockable: false,
            lock_field: DEFAULT_LOCK_FIELD.to_string(),
        }
    }

    /// The version field, if versioning is enabled.
    pub fn version_field(&self) -> Option<&str> {
        self.versioned.then_some(self.version_field.as_str())
    }

    /// The lock field, if locking is enabled.
    pub fn lock_field(&self) -> Option<&str> {
        self.lockable.then_some(self.lock_field.as_str())
    }
}

/// Entity-only mapping data.
#[derive(Debug, Clone)]
pub struct EntityMapping {
    /// Collection holding the hierarchy's documents.
    pub collection_name: Option<String>,
    /// Database override.
    pub database_name: Option<String>,
    /// Change tracking policy.
    pub change_tracking: ChangeTracking,
    /// Root-only state. `None` on derived entity mappings.
    pub root: Option<RootPolicy>,
}

impl EntityMapping {
    /// Create the entity data for an inheritance root.
    pub fn root(identity: Arc<dyn IdentityGenerator>) -> Self {
        Self {
            collection_name: None,
            database_name: None,
            change_tracking: ChangeTracking::default(),
            root: Some(RootPolicy::new(identity)),
        }
    }

    /// Create the entity data for a derived mapping.
    pub fn derived() -> Self {
        Self {
            collection_name: None,
            database_name: None,
            change_tracking: ChangeTracking::default(),
            root: None,
        }
    }

    /// Set the collection name.
    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Set the database override.
    pub fn with_database(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    /// Set the change tracking policy.
    pub fn with_change_tracking(mut self, tracking: ChangeTracking) -> Self {
        self.change_tracking = tracking;
        self
    }

    /// Apply `f` to the root policy. No effect on derived mappings.
    pub fn with_root_policy(mut self, f: impl FnOnce(&mut RootPolicy)) -> Self {
        if let Some(root) = self.root.as_mut() {
            f(root);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UuidGenerator;

    #[test]
    fn test_index_builder() {
        let index = Index::on("email")
            .and("createdAt", IndexOrder::Descending)
            .named("by_email")
            .unique();

        assert_eq!(index.keys.len(), 2);
        assert_eq!(index.keys[1].1, IndexOrder::Descending);
        assert!(index.unique);
        assert!(!index.sparse);
    }

    #[test]
    fn test_root_policy_defaults() {
        let entity = EntityMapping::root(Arc::new(UuidGenerator::new()))
            .with_collection("people")
            .with_root_policy(|root| root.lockable = true);

        let root = entity.root.as_ref().unwrap();
        assert_eq!(root.version_field(), Some("__v"));
        assert_eq!(root.lock_field(), Some("__l"));
        assert_eq!(entity.change_tracking, ChangeTracking::Observe);
    }

    #[test]
    fn test_derived_has_no_root_policy() {
        let entity = EntityMapping::derived().with_root_policy(|root| root.versioned = false);
        assert!(entity.root.is_none());
    }
}
