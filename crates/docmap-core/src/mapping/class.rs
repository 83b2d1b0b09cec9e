//! Class mappings.

use super::entity::EntityMapping;
use super::flags::MappingFlags;
use super::property::Property;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Document field holding an entity's identifier.
pub const ID_FIELD: &str = "_id";

static NEXT_TYPE_KEY: AtomicU32 = AtomicU32::new(1);

/// Stable identifier of a mapped type.
///
/// Objects carry the key of their type; registries are keyed by it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeKey(u32);

impl TypeKey {
    /// Allocate a fresh key, unique within the process.
    pub fn allocate() -> Self {
        Self(NEXT_TYPE_KEY.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw key value.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw key value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Describes how one type maps to documents.
///
/// Root-only state (identity, indexes, versioning, locking) is reached
/// through the registry from any mapping of the hierarchy.
#[derive(Debug, Clone)]
pub struct ClassMapping {
    /// Key of the mapped type.
    pub key: TypeKey,
    /// Type name.
    pub name: String,
    /// Mapping kind.
    pub flags: MappingFlags,
    /// Mapped base class.
    pub base: Option<TypeKey>,
    /// Root of the hierarchy. Equal to `key` on roots.
    pub inheritance_root: TypeKey,
    /// Document field recording the concrete class. Roots only.
    pub discriminator_field: Option<String>,
    /// Value written to the discriminator field for this class.
    pub discriminator_value: Option<String>,
    /// Properties declared on this class, excluding inherited ones.
    pub properties: Vec<Property>,
    /// Entity data. `Some` exactly when flagged `ENTITY`.
    pub entity: Option<EntityMapping>,
}

impl ClassMapping {
    /// Create an embeddable class mapping at the root of its hierarchy.
    pub fn embeddable(key: TypeKey, name: impl Into<String>) -> Self {
        Self::with_flags(
            key,
            name,
            MappingFlags::OBJECT
                | MappingFlags::CLASS
                | MappingFlags::EMBEDDABLE
                | MappingFlags::INHERITANCE_ROOT,
            None,
        )
    }

    /// Create an entity class mapping.
    ///
    /// The mapping starts as an inheritance root; use [`derived_from`](Self::derived_from)
    /// to attach it to a base class.
    pub fn entity(key: TypeKey, name: impl Into<String>, entity: EntityMapping) -> Self {
        Self::with_flags(
            key,
            name,
            MappingFlags::OBJECT
                | MappingFlags::CLASS
                | MappingFlags::ENTITY
                | MappingFlags::INHERITANCE_ROOT,
            Some(entity),
        )
    }

    /// Create an anonymous object mapping.
    pub fn object(key: TypeKey, name: impl Into<String>) -> Self {
        Self::with_flags(key, name, MappingFlags::OBJECT, None)
    }

    fn with_flags(
        key: TypeKey,
        name: impl Into<String>,
        flags: MappingFlags,
        entity: Option<EntityMapping>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            flags,
            base: None,
            inheritance_root: key,
            discriminator_field: None,
            discriminator_value: None,
            properties: Vec::new(),
            entity,
        }
    }

    /// Attach this mapping below `base` in its hierarchy.
    ///
    /// Clears the root flag, the discriminator field and any root policy.
    pub fn derived_from(mut self, base: &ClassMapping) -> Self {
        self.base = Some(base.key);
        self.inheritance_root = base.inheritance_root;
        self.flags.remove(MappingFlags::INHERITANCE_ROOT);
        self.discriminator_field = None;
        if let Some(entity) = self.entity.as_mut() {
            entity.root = None;
        }
        self
    }

    /// Add a property.
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Add multiple properties.
    pub fn with_properties(mut self, properties: impl IntoIterator<Item = Property>) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Set the discriminator field.
    pub fn with_discriminator_field(mut self, field: impl Into<String>) -> Self {
        self.discriminator_field = Some(field.into());
        self
    }

    /// Set the discriminator value.
    pub fn with_discriminator_value(mut self, value: impl Into<String>) -> Self {
        self.discriminator_value = Some(value.into());
        self
    }

    /// Check if this is an entity mapping.
    pub fn is_entity(&self) -> bool {
        self.flags.contains(MappingFlags::ENTITY)
    }

    /// Check if this is an embeddable mapping.
    pub fn is_embeddable(&self) -> bool {
        self.flags.contains(MappingFlags::EMBEDDABLE)
    }

    /// Check if this mapping is backed by a named class.
    pub fn is_class(&self) -> bool {
        self.flags.contains(MappingFlags::CLASS)
    }

    /// Check if this mapping is the top of its hierarchy.
    pub fn is_inheritance_root(&self) -> bool {
        self.flags.contains(MappingFlags::INHERITANCE_ROOT)
    }

    /// Entity data, if this is an entity mapping.
    pub fn entity_mapping(&self) -> Option<&EntityMapping> {
        self.entity.as_ref()
    }

    /// Get a declared property by object field name.
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Get a declared property by document field name.
    pub fn get_property_by_field(&self, field: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.field == field)
    }
}
