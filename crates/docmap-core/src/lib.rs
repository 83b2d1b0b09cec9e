//! docmap core - entity mapping, identity and change tracking.
//!
//! This crate maps live object graphs to JSON-like documents and back. It
//! holds the mapping model and registry, the identity generators, the
//! transform engine that reads, writes and compares documents, and the
//! observer used for cheap dirty detection.

pub mod changes;
pub mod config;
pub mod error;
pub mod identity;
pub mod mapping;
pub mod object;
pub mod observer;
pub mod tracking;
pub mod transform;

pub use changes::Changes;
pub use config::{Configuration, MappingProvider, NamingStrategy};
pub use error::{Error, Result};
pub use identity::{Identifier, IdentityGenerator, ObjectIdGenerator, UuidGenerator};
pub use mapping::{
    Annotation, ChangeTracking, ClassMapping, ClassMappingBuilder, DeclarationKind,
    DeclarationProvider, EntityMapping, FieldType, Index, IndexOrder, MappingFlags,
    MappingRegistry, Property, PropertyAnnotation, PropertyDeclaration, RootPolicy, ScalarType,
    TypeDeclaration, TypeKey, ValidationError, ValidationReport, ID_FIELD,
};
pub use object::{ListRef, ObjectRef, Value, Visited};
pub use observer::Observer;
pub use tracking::TrackedEntity;
pub use transform::{CompareOptions, Mapper, MappingError, MappingErrors, UnresolvedReferences};
