//! docmap - an object-document mapper with change tracking.
//!
//! Declare your types, build a [`MappingRegistry`] through a
//! [`Configuration`], then use a [`Mapper`] to read documents into live
//! objects, write them back and compute minimal update documents. Loaded
//! entities can be wrapped in a [`TrackedEntity`] to decide when an update
//! is needed at all.
//!
//! # Crates
//!
//! - `docmap-core`: the mapping model, transform engine and change tracking.
//! - `docmap`: this facade, re-exporting the public API and a [`prelude`].

pub use docmap_core::{changes, config, identity, mapping, object, observer, tracking, transform};
pub use docmap_core::{
    Annotation, ChangeTracking, Changes, ClassMapping, ClassMappingBuilder, CompareOptions,
    Configuration, DeclarationKind, DeclarationProvider, EntityMapping, Error, FieldType,
    Identifier, IdentityGenerator, Index, IndexOrder, ListRef, Mapper, MappingError,
    MappingErrors, MappingFlags, MappingProvider, MappingRegistry, NamingStrategy,
    ObjectIdGenerator, ObjectRef, Observer, Property, PropertyAnnotation, PropertyDeclaration,
    Result, RootPolicy, ScalarType, TrackedEntity, TypeDeclaration, TypeKey,
    UnresolvedReferences, UuidGenerator, ValidationError, ValidationReport, Value, Visited,
    ID_FIELD,
};

/// Documents as handled by the mapper.
pub type Document = serde_json::Value;

/// Bootstrap a registry from declarations with the given configuration.
///
/// Shorthand for [`Configuration::build_registry`] over a single
/// [`DeclarationProvider`]. Fails with [`Error::NoMappings`] when nothing is
/// declared.
pub fn bootstrap(
    config: &Configuration,
    declarations: impl IntoIterator<Item = TypeDeclaration>,
) -> Result<MappingRegistry> {
    let declarations: Vec<TypeDeclaration> = declarations.into_iter().collect();
    if declarations.is_empty() {
        return Err(Error::NoMappings);
    }
    let provider = DeclarationProvider::new(declarations);
    config.build_registry(&[&provider])
}

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        bootstrap, Annotation, ChangeTracking, Changes, Configuration, Document, FieldType,
        Identifier, IdentityGenerator, ListRef, Mapper, MappingRegistry, ObjectIdGenerator,
        ObjectRef, Observer, PropertyAnnotation, PropertyDeclaration, ScalarType, TrackedEntity,
        TypeDeclaration, TypeKey, UuidGenerator, Value,
    };
}
