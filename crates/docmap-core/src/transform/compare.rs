//! Object against persisted document.

use serde_json::{Map, Value as Json};
use tracing::{debug, warn};

use super::{join, Mapper, UnresolvedReferences};
use crate::changes::Changes;
use crate::identity::Identifier;
use crate::mapping::{ClassMapping, FieldType};
use crate::object::{ObjectRef, Value, Visited};

impl<'a> Mapper<'a> {
    /// Record in `changes` the operations that turn `document` into the
    /// written form of `value`.
    ///
    /// Nothing is recorded for fields whose written form equals the
    /// persisted one. References are compared by identifier using the
    /// hierarchy's generator.
    pub fn compare(
        &self,
        mapping: &ClassMapping,
        value: &Value,
        document: &Json,
        changes: &mut Changes,
        path: &str,
    ) {
        self.compare_mapping(mapping, value, document, changes, path, &mut Visited::new());
    }

    fn compare_mapping(
        &self,
        mapping: &ClassMapping,
        value: &Value,
        document: &Json,
        changes: &mut Changes,
        path: &str,
        visited: &mut Visited,
    ) {
        if mapping.is_entity() && !path.is_empty() {
            self.compare_reference(mapping, value, document, changes, path);
        } else {
            self.compare_class(mapping, value, document, changes, path, visited);
        }
    }

    fn compare_reference(
        &self,
        mapping: &ClassMapping,
        value: &Value,
        document: &Json,
        changes: &mut Changes,
        path: &str,
    ) {
        let Some(id) = self.reference_identifier(mapping, value) else {
            if self.options.unresolved_references == UnresolvedReferences::Report {
                warn!(path, mapping = %mapping.name, "Reference identifier could not be determined");
                changes.mark_unresolved(path);
            }
            return;
        };

        let unchanged = match (self.registry.identity_for(mapping.key), Identifier::from_document(document)) {
            (Some(generator), Some(persisted)) => generator.are_equal(&id, &persisted),
            _ => false,
        };
        if !unchanged {
            changes.set(path, id.to_document());
        }
    }

    fn compare_class(
        &self,
        mapping: &ClassMapping,
        value: &Value,
        document: &Json,
        changes: &mut Changes,
        path: &str,
        visited: &mut Visited,
    ) {
        let (Some(object), Some(fields), Some(concrete)) = (
            value.as_object(),
            document.as_object(),
            self.concrete_for_object(mapping, value),
        ) else {
            self.replace(&FieldType::Embedded(mapping.key), value, changes, path);
            return;
        };

        if !visited.enter(object.address()) {
            return;
        }

        if let Some(field) = self.discriminator_field(concrete) {
            let current = concrete.discriminator_value.as_deref();
            let persisted = fields.get(field).and_then(Json::as_str);
            if current != persisted {
                if !path.is_empty() {
                    visited.leave(object.address());
                    self.replace(&FieldType::Embedded(mapping.key), value, changes, path);
                    return;
                }
                match current {
                    Some(current) => changes.set(field, Json::String(current.to_string())),
                    None => changes.unset(field),
                }
            }
        }

        self.compare_fields(concrete, object, fields, changes, path, visited);
        visited.leave(object.address());
    }

    fn compare_fields(
        &self,
        concrete: &ClassMapping,
        object: &ObjectRef,
        fields: &Map<String, Json>,
        changes: &mut Changes,
        path: &str,
        visited: &mut Visited,
    ) {
        for property in self.registry.properties(concrete) {
            if !property.is_mapped() {
                continue;
            }
            let current = object.get(&property.name);
            let persisted = fields.get(&property.field);
            let field_path = join(path, &property.field);

            match (current, persisted) {
                (None, None) => {}
                (None, Some(_)) => changes.unset(field_path),
                (Some(Value::Null), Some(Json::Null)) => {}
                (Some(Value::Null), _) if !property.nullable => {
                    debug!(path = %field_path, "Skipping null in a field that is not nullable");
                }
                (Some(Value::Null), _) => changes.set(field_path, Json::Null),
                (Some(current), persisted) => {
                    let persisted = persisted.unwrap_or(&Json::Null);
                    self.compare_value(&property.field_type, &current, persisted, changes, &field_path, visited);
                }
            }
        }
    }

    fn compare_value(
        &self,
        field_type: &FieldType,
        value: &Value,
        persisted: &Json,
        changes: &mut Changes,
        path: &str,
        visited: &mut Visited,
    ) {
        match field_type {
            FieldType::Reference(key) | FieldType::Embedded(key) => match self.registry.get_mapping(*key) {
                Some(mapping) => self.compare_mapping(mapping, value, persisted, changes, path, visited),
                None => debug!(path, key = %key, "Skipping field of unmapped type"),
            },
            FieldType::Scalar(_) | FieldType::Array(_) => self.replace_if_changed(field_type, value, persisted, changes, path),
        }
    }

    fn replace_if_changed(
        &self,
        field_type: &FieldType,
        value: &Value,
        persisted: &Json,
        changes: &mut Changes,
        path: &str,
    ) {
        let mut errors = Vec::new();
        match self.write_value(field_type, value, path, &mut errors, &mut Visited::new()) {
            Some(written) if self.documents_equal(field_type, &written, persisted) => {}
            Some(written) => changes.set(path, written),
            None => debug!(path, errors = errors.len(), "Skipping field that cannot be written"),
        }
    }

    fn replace(&self, field_type: &FieldType, value: &Value, changes: &mut Changes, path: &str) {
        if path.is_empty() {
            warn!(mapping = ?field_type.target(), "Cannot compare a root value that is not a document");
            return;
        }
        let mut errors = Vec::new();
        match self.write_value(field_type, value, path, &mut errors, &mut Visited::new()) {
            Some(written) => changes.set(path, written),
            None => debug!(path, errors = errors.len(), "Skipping field that cannot be written"),
        }
    }
}
