//! Transformation between live objects and documents.
//!
//! A [`Mapper`] walks a value and its [`ClassMapping`] together:
//!
//! - [`Mapper::read`] turns a document into an object,
//! - [`Mapper::write`] turns an object into a document,
//! - [`Mapper::compare`] records the update operations needed to bring a
//!   persisted document up to date with an object.
//!
//! Entities nested below the root are references and are stored as their
//! bare identifier. Data problems never abort the walk: they are appended to
//! an error sink and the offending subtree is skipped.

mod compare;
mod equality;
mod error;
mod read;
mod write;

pub use error::{MappingError, MappingErrors};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::changes::Changes;
use crate::identity::Identifier;
use crate::mapping::{ClassMapping, MappingRegistry, TypeKey, ID_FIELD};
use crate::object::{Value, Visited};

/// What `compare` does with a reference whose identifier cannot be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnresolvedReferences {
    /// Leave the field unchanged and record nothing.
    #[default]
    Skip,
    /// Record the path in [`Changes::unresolved`] and log a warning.
    Report,
}

/// Options for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareOptions {
    /// Handling of unresolved references.
    pub unresolved_references: UnresolvedReferences,
}

impl CompareOptions {
    /// Set the handling of unresolved references.
    pub fn with_unresolved_references(mut self, policy: UnresolvedReferences) -> Self {
        self.unresolved_references = policy;
        self
    }
}

/// Reads, writes and compares values using a registry.
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'a> {
    registry: &'a MappingRegistry,
    options: CompareOptions,
}

impl<'a> Mapper<'a> {
    /// Create a mapper over `registry`.
    pub fn new(registry: &'a MappingRegistry) -> Self {
        Self {
            registry,
            options: CompareOptions::default(),
        }
    }

    /// Set the comparison options.
    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    /// The registry.
    pub fn registry(&self) -> &'a MappingRegistry {
        self.registry
    }

    /// The comparison options.
    pub fn options(&self) -> CompareOptions {
        self.options
    }

    /// Read a root document, failing if any error was recorded.
    pub fn read_document(&self, mapping: &ClassMapping, document: &Json) -> Result<Value, MappingErrors> {
        let mut errors = Vec::new();
        let value = self.read(mapping, document, "", &mut errors);
        match (value, MappingErrors::from_vec(errors)) {
            (_, Some(errors)) => Err(errors),
            (Some(value), None) => Ok(value),
            (None, None) => Err(MappingErrors::single(MappingError::new(
                "Document could not be read.",
                "",
                document.clone(),
            ))),
        }
    }

    /// Write a root object, failing if any error was recorded.
    pub fn write_object(&self, mapping: &ClassMapping, value: &Value) -> Result<Json, MappingErrors> {
        let mut errors = Vec::new();
        let document = self.write(mapping, value, "", &mut errors, &mut Visited::new());
        match (document, MappingErrors::from_vec(errors)) {
            (_, Some(errors)) => Err(errors),
            (Some(document), None) => Ok(document),
            (None, None) => Err(MappingErrors::single(MappingError::new(
                "Object could not be written.",
                "",
                value.summary(),
            ))),
        }
    }

    /// Compare a root object against its persisted document.
    pub fn diff(&self, mapping: &ClassMapping, value: &Value, document: &Json) -> Changes {
        let mut changes = Changes::new();
        self.compare(mapping, value, document, &mut changes, "");
        changes
    }

    /// Look up a mapping referenced by a field type.
    fn mapping_for(
        &self,
        key: TypeKey,
        path: &str,
        value: impl FnOnce() -> Json,
        errors: &mut Vec<MappingError>,
    ) -> Option<&'a ClassMapping> {
        let mapping = self.registry.get_mapping(key);
        if mapping.is_none() {
            errors.push(MappingError::new(format!("Type {key} is not mapped."), path, value()));
        }
        mapping
    }

    /// Check whether `value` is an instance of `mapping` or one of its subclasses.
    fn is_instance(&self, mapping: &ClassMapping, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|object| object.type_key())
            .is_some_and(|key| self.registry.is_assignable(key, mapping.key))
    }

    /// The identifier a reference value stands for.
    ///
    /// Instances yield their `_id`; anything else is taken as the identifier
    /// itself.
    fn reference_identifier(&self, mapping: &ClassMapping, value: &Value) -> Option<Identifier> {
        if self.is_instance(mapping, value) {
            value.as_object().and_then(|object| object.id())
        } else {
            bare_identifier(value)
        }
    }

    /// Validate an identifier with the hierarchy's generator.
    fn check_identifier(
        &self,
        mapping: &ClassMapping,
        id: Identifier,
        path: &str,
        errors: &mut Vec<MappingError>,
    ) -> Option<Identifier> {
        let valid = self
            .registry
            .identity_for(mapping.key)
            .is_some_and(|generator| generator.validate(&id));
        if valid {
            Some(id)
        } else {
            errors.push(MappingError::new(
                format!("'{id}' is not a valid identifier."),
                id_path(path),
                id.to_document(),
            ));
            None
        }
    }

    /// The concrete mapping of `mapping`'s hierarchy named by a discriminator value.
    fn discriminated<'m>(&self, mapping: &'m ClassMapping, value: Option<&str>) -> Option<&'m ClassMapping>
    where
        'a: 'm,
    {
        let Some(value) = value else {
            return Some(mapping);
        };
        if mapping.discriminator_value.as_deref() == Some(value) {
            return Some(mapping);
        }
        self.registry
            .resolve_discriminator(mapping.inheritance_root, value)
            .filter(|concrete| self.registry.is_assignable(concrete.key, mapping.key))
    }

    /// The discriminator field of `mapping`'s hierarchy.
    fn discriminator_field<'m>(&self, mapping: &'m ClassMapping) -> Option<&'m str>
    where
        'a: 'm,
    {
        self.registry
            .root_of(mapping.key)
            .unwrap_or(mapping)
            .discriminator_field
            .as_deref()
    }
}

/// A value that can stand in for an identifier on its own.
///
/// Only untyped objects qualify as stubs; typed objects are instances.
fn bare_identifier(value: &Value) -> Option<Identifier> {
    match value {
        Value::Object(object) if object.type_key().is_some() => None,
        other => other.identifier(),
    }
}

/// Message for a null held by a property that is not nullable.
const NOT_NULLABLE: &str = "Field cannot be null.";

/// Join a document path and a field.
fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

/// Path of the identifier field below `path`.
fn id_path(path: &str) -> String {
    join(path, ID_FIELD)
}

/// Render a document value for a message.
fn display_json(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}
