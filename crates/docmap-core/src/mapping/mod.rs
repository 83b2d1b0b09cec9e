//! Mapping model for docmap.
//!
//! Class mappings describe how the fields of a type correspond to document
//! fields, including inheritance and discriminators. Root-only entity state
//! is reached through the [`MappingRegistry`].

mod builder;
mod class;
mod entity;
mod flags;
mod property;
mod registry;
mod types;

pub use builder::{
    Annotation, ClassMappingBuilder, DeclarationKind, DeclarationProvider, PropertyAnnotation,
    PropertyDeclaration, TypeDeclaration, ValidationError, ValidationReport,
};
pub use class::{ClassMapping, TypeKey, ID_FIELD};
pub use entity::{ChangeTracking, EntityMapping, Index, IndexOrder, RootPolicy};
pub use flags::MappingFlags;
pub use property::Property;
pub use registry::MappingRegistry;
pub use types::{FieldType, ScalarType};
