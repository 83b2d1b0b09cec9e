//! Mapping registry.
//!
//! The registry maps each [`TypeKey`] to exactly one [`ClassMapping`] and
//! answers hierarchy questions. It is built once, then shared read-only.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use super::{ClassMapping, Index, Property, RootPolicy, TypeKey};
use crate::error::{Error, Result};
use crate::identity::IdentityGenerator;
use crate::object::Value;

/// Table of class mappings keyed by type.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: BTreeMap<TypeKey, ClassMapping>,
    /// Discriminator value to concrete type, per hierarchy root.
    discriminators: HashMap<TypeKey, HashMap<String, TypeKey>>,
}

impl MappingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping.
    ///
    /// Fails if the type is already registered, if a derived mapping's
    /// inheritance root is not registered as a root, if an entity root has
    /// no root policy, or if the discriminator value is already used in the
    /// hierarchy. On failure the registry is unchanged.
    pub fn add_mapping(&mut self, mapping: ClassMapping) -> Result<()> {
        if self.mappings.contains_key(&mapping.key) {
            return Err(Error::duplicate_mapping(&mapping.name));
        }

        let root_name = if mapping.inheritance_root == mapping.key {
            mapping.name.clone()
        } else {
            let root = self
                .mappings
                .get(&mapping.inheritance_root)
                .ok_or(Error::UnknownMapping(mapping.inheritance_root))?;
            if !root.is_inheritance_root() {
                return Err(Error::InvalidInheritanceRoot {
                    name: mapping.name.clone(),
                    root: root.name.clone(),
                });
            }
            root.name.clone()
        };

        if mapping.is_entity()
            && mapping.is_inheritance_root()
            && mapping.entity.as_ref().and_then(|e| e.root.as_ref()).is_none()
        {
            return Err(Error::MissingRootPolicy {
                name: mapping.name.clone(),
            });
        }

        if let Some(value) = &mapping.discriminator_value {
            let taken = self
                .discriminators
                .get(&mapping.inheritance_root)
                .is_some_and(|values| values.contains_key(value));
            if taken {
                return Err(Error::DuplicateDiscriminator {
                    root: root_name,
                    value: value.clone(),
                });
            }
            self.discriminators
                .entry(mapping.inheritance_root)
                .or_default()
                .insert(value.clone(), mapping.key);
        }

        debug!(
            key = %mapping.key,
            name = %mapping.name,
            root = %mapping.inheritance_root,
            entity = mapping.is_entity(),
            "Registered mapping"
        );
        self.mappings.insert(mapping.key, mapping);
        Ok(())
    }

    /// Merge every mapping of `other` into this registry.
    ///
    /// The merge is atomic: it is staged on a copy and only installed when
    /// every mapping was accepted. Roots are added before derived mappings.
    pub fn merge(&mut self, other: &MappingRegistry) -> Result<()> {
        let mut staged = self.clone();

        let (roots, derived): (Vec<_>, Vec<_>) = other
            .mappings
            .values()
            .partition(|m| m.inheritance_root == m.key);

        // Derived mappings are added in depth order so bases precede subclasses.
        let mut derived = derived;
        derived.sort_by_key(|m| other.depth(m.key));

        for mapping in roots.into_iter().chain(derived) {
            staged.add_mapping(mapping.clone())?;
        }

        debug!(
            added = other.len(),
            total = staged.len(),
            "Merged mapping registry"
        );
        *self = staged;
        Ok(())
    }

    /// Get the mapping for a type.
    pub fn get_mapping(&self, key: TypeKey) -> Option<&ClassMapping> {
        self.mappings.get(&key)
    }

    /// Get the mapping for an optional type. Absent types yield `None`.
    pub fn get_mapping_for_constructor(&self, key: Option<TypeKey>) -> Option<&ClassMapping> {
        key.and_then(|key| self.get_mapping(key))
    }

    /// Get the mapping for the type of an object value.
    ///
    /// Non-objects and untyped objects yield `None`.
    pub fn get_mapping_for_object(&self, value: &Value) -> Option<&ClassMapping> {
        self.get_mapping_for_constructor(value.as_object().and_then(|o| o.type_key()))
    }

    /// All mappings in key order.
    pub fn mappings(&self) -> impl Iterator<Item = &ClassMapping> {
        self.mappings.values()
    }

    /// All entity mappings.
    pub fn entity_mappings(&self) -> impl Iterator<Item = &ClassMapping> {
        self.mappings.values().filter(|m| m.is_entity())
    }

    /// All inheritance roots.
    pub fn inheritance_roots(&self) -> impl Iterator<Item = &ClassMapping> {
        self.mappings.values().filter(|m| m.is_inheritance_root())
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Check if a type is registered.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.mappings.contains_key(&key)
    }

    /// The root mapping of a type's hierarchy.
    pub fn root_of(&self, key: TypeKey) -> Option<&ClassMapping> {
        let mapping = self.get_mapping(key)?;
        self.get_mapping(mapping.inheritance_root)
    }

    /// The root policy of an entity type's hierarchy.
    pub fn root_policy(&self, key: TypeKey) -> Option<&RootPolicy> {
        self.root_of(key)?.entity.as_ref()?.root.as_ref()
    }

    /// The identity generator of an entity type's hierarchy.
    pub fn identity_for(&self, key: TypeKey) -> Option<&Arc<dyn IdentityGenerator>> {
        self.root_policy(key).map(|policy| &policy.identity)
    }

    /// Add an index to an entity type. The index is stored on the root.
    pub fn add_index(&mut self, key: TypeKey, index: Index) -> Result<()> {
        let mapping = self.get_mapping(key).ok_or(Error::UnknownMapping(key))?;
        if !mapping.is_entity() {
            return Err(Error::not_an_entity(&mapping.name));
        }
        let root_key = mapping.inheritance_root;

        let root = self
            .mappings
            .get_mut(&root_key)
            .ok_or(Error::UnknownMapping(root_key))?;
        let name = root.name.clone();
        let policy = root
            .entity
            .as_mut()
            .and_then(|entity| entity.root.as_mut())
            .ok_or(Error::MissingRootPolicy { name })?;
        policy.indexes.push(index);
        Ok(())
    }

    /// Check whether `key` is `target` or derives from it.
    pub fn is_assignable(&self, key: TypeKey, target: TypeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == target {
                return true;
            }
            current = self.get_mapping(k).and_then(|m| m.base);
        }
        false
    }

    /// Resolve a discriminator value within a hierarchy.
    pub fn resolve_discriminator(&self, root: TypeKey, value: &str) -> Option<&ClassMapping> {
        let key = self.discriminators.get(&root)?.get(value)?;
        self.get_mapping(*key)
    }

    /// All properties of a mapping, base class properties first.
    pub fn properties<'a>(&'a self, mapping: &'a ClassMapping) -> Vec<&'a Property> {
        let mut chain = vec![mapping];
        let mut current = mapping.base;
        while let Some(key) = current {
            match self.get_mapping(key) {
                Some(base) if !chain.iter().any(|m| m.key == base.key) => {
                    chain.push(base);
                    current = base.base;
                }
                _ => break,
            }
        }

        chain
            .into_iter()
            .rev()
            .flat_map(|m| m.properties.iter())
            .collect()
    }

    fn depth(&self, key: TypeKey) -> usize {
        let mut depth = 0;
        let mut current = self.get_mapping(key).and_then(|m| m.base);
        while let Some(k) = current {
            depth += 1;
            if depth > self.mappings.len() {
                break;
            }
            current = self.get_mapping(k).and_then(|m| m.base);
        }
        depth
    }
}
