//! Document to object.

use serde_json::{Map, Value as Json};

use super::{display_json, id_path, join, MappingError, Mapper, NOT_NULLABLE};
use crate::identity::Identifier;
use crate::mapping::{ClassMapping, FieldType, ScalarType, ID_FIELD};
use crate::object::{ListRef, ObjectRef, Value};

impl<'a> Mapper<'a> {
    /// Read `document` according to `mapping`.
    ///
    /// `path` is the dotted document path of `document`; the empty path is
    /// the document root. At the root an entity is read in full. Below the
    /// root an entity is a reference, `document` is its identifier and the
    /// identifier itself is returned. Errors are appended to `errors`;
    /// `None` means the value could not be read.
    pub fn read(
        &self,
        mapping: &ClassMapping,
        document: &Json,
        path: &str,
        errors: &mut Vec<MappingError>,
    ) -> Option<Value> {
        if mapping.is_entity() {
            self.read_entity(mapping, document, path, errors)
        } else {
            self.read_class(mapping, document, path, errors)
        }
    }

    fn read_entity(
        &self,
        mapping: &ClassMapping,
        document: &Json,
        path: &str,
        errors: &mut Vec<MappingError>,
    ) -> Option<Value> {
        let raw = if path.is_empty() {
            match document.get(ID_FIELD).filter(|id| !id.is_null()) {
                Some(id) => id,
                None => {
                    errors.push(MappingError::new("Missing identifier.", ID_FIELD, document.clone()));
                    return None;
                }
            }
        } else {
            document
        };

        let id = match Identifier::from_document(raw) {
            Some(id) => self.check_identifier(mapping, id, path, errors)?,
            None => {
                errors.push(MappingError::new(
                    format!("'{}' is not a valid identifier.", display_json(raw)),
                    id_path(path),
                    raw.clone(),
                ));
                return None;
            }
        };

        if !path.is_empty() {
            return Some(Value::Id(id));
        }

        let value = self.read_class(mapping, document, path, errors)?;
        if let Value::Object(object) = &value {
            object.set(ID_FIELD, Value::Id(id));
        }
        Some(value)
    }

    fn read_class(
        &self,
        mapping: &ClassMapping,
        document: &Json,
        path: &str,
        errors: &mut Vec<MappingError>,
    ) -> Option<Value> {
        let Some(fields) = document.as_object() else {
            errors.push(MappingError::new("Expected document.", path, document.clone()));
            return None;
        };
        let concrete = self.concrete_for_document(mapping, fields, path, errors)?;

        let object = ObjectRef::new(concrete.key);
        for property in self.registry.properties(concrete) {
            if !property.is_mapped() {
                continue;
            }
            let Some(raw) = fields.get(&property.field) else {
                continue;
            };
            let field_path = join(path, &property.field);
            if raw.is_null() {
                if property.nullable {
                    object.set(&property.name, Value::Null);
                } else {
                    errors.push(MappingError::new(NOT_NULLABLE, field_path, Json::Null));
                }
                continue;
            }

            if let Some(value) = self.read_value(&property.field_type, raw, &field_path, errors) {
                object.set(&property.name, value);
            }
        }
        Some(Value::Object(object))
    }

    fn concrete_for_document<'m>(
        &self,
        mapping: &'m ClassMapping,
        fields: &Map<String, Json>,
        path: &str,
        errors: &mut Vec<MappingError>,
    ) -> Option<&'m ClassMapping>
    where
        'a: 'm,
    {
        let Some(field) = self.discriminator_field(mapping) else {
            return Some(mapping);
        };
        let Some(raw) = fields.get(field) else {
            return Some(mapping);
        };

        let concrete = raw.as_str().and_then(|value| self.discriminated(mapping, Some(value)));
        if concrete.is_none() {
            errors.push(MappingError::new(
                format!("Unknown discriminator value '{}'.", display_json(raw)),
                join(path, field),
                raw.clone(),
            ));
        }
        concrete
    }

    fn read_value(
        &self,
        field_type: &FieldType,
        raw: &Json,
        path: &str,
        errors: &mut Vec<MappingError>,
    ) -> Option<Value> {
        match field_type {
            FieldType::Scalar(scalar) => {
                if !scalar.accepts_document(raw) {
                    errors.push(MappingError::new(
                        format!("Expected {}.", scalar.name()),
                        path,
                        raw.clone(),
                    ));
                    return None;
                }
                Some(scalar_from_document(*scalar, raw))
            }
            FieldType::Embedded(key) | FieldType::Reference(key) => {
                let mapping = self.mapping_for(*key, path, || raw.clone(), errors)?;
                self.read(mapping, raw, path, errors)
            }
            FieldType::Array(element) => {
                let Some(items) = raw.as_array() else {
                    errors.push(MappingError::new("Expected array.", path, raw.clone()));
                    return None;
                };

                let mut values = Vec::with_capacity(items.len());
                let mut failed = false;
                for (index, item) in items.iter().enumerate() {
                    if item.is_null() {
                        values.push(Value::Null);
                        continue;
                    }
                    let item_path = join(path, &index.to_string());
                    match self.read_value(element, item, &item_path, errors) {
                        Some(value) => values.push(value),
                        None => failed = true,
                    }
                }
                (!failed).then(|| Value::List(ListRef::from_values(values)))
            }
        }
    }
}

/// Convert a document scalar already checked against `scalar`.
fn scalar_from_document(scalar: ScalarType, raw: &Json) -> Value {
    match raw {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) if scalar == ScalarType::Float => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::List(ListRef::from_values(
            items.iter().map(|item| scalar_from_document(ScalarType::Any, item)).collect(),
        )),
        Json::Object(fields) => {
            let object = ObjectRef::untyped();
            for (name, value) in fields {
                object.set(name, scalar_from_document(ScalarType::Any, value));
            }
            Value::Object(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::model;
    use super::*;
    use crate::identity::IdentityGenerator;
    use serde_json::json;

    #[test]
    fn test_read_root_entity() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let (id, parent) = (model.id(), model.id());

        let document = json!({
            "_id": id.to_document(),
            "name": "Alice",
            "age": 31,
            "parent": parent.to_document(),
            "address": {"street": "Main St", "city": "Springfield"},
            "tags": ["a", "b"],
            "scratch": "ignored"
        });

        let mut errors = Vec::new();
        let value = mapper.read(model.mapping(model.person), &document, "", &mut errors).unwrap();
        assert!(errors.is_empty(), "{errors:?}");

        let object = value.as_object().unwrap();
        assert_eq!(object.type_key(), Some(model.person));
        assert!(model.generator.are_equal(&object.id().unwrap(), &id));
        assert_eq!(object.get("name").unwrap().as_str(), Some("Alice"));
        assert!(model.generator.are_equal(object.get("parent").unwrap().as_id().unwrap(), &parent));
        assert!(object.get("scratch").is_none());
        assert_eq!(object.get("tags").unwrap().as_list().unwrap().len(), 2);

        let address = object.get("address").unwrap();
        let address = address.as_object().unwrap();
        assert_eq!(address.type_key(), Some(model.address));
        assert_eq!(address.get("city").unwrap().as_str(), Some("Springfield"));
    }

    #[test]
    fn test_missing_identifier() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let document = json!({"name": "Alice"});

        let mut errors = Vec::new();
        assert!(mapper.read(model.mapping(model.person), &document, "", &mut errors).is_none());
        assert_eq!(errors, vec![MappingError::new("Missing identifier.", "_id", document)]);
    }

    #[test]
    fn test_invalid_identifier() {
        let model = model();
        let mapper = Mapper::new(&model.registry);

        let mut errors = Vec::new();
        let value = mapper.read(model.mapping(model.person), &json!({"_id": "nope"}), "", &mut errors);
        assert!(value.is_none());
        assert_eq!(errors[0].message, "'nope' is not a valid identifier.");
        assert_eq!(errors[0].path, "_id");
        assert_eq!(errors[0].value, json!("nope"));
    }

    #[test]
    fn test_invalid_reference_keeps_siblings() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let document = json!({
            "_id": model.id().to_document(),
            "name": "Alice",
            "parent": "bad",
            "age": "old"
        });

        let mut errors = Vec::new();
        let value = mapper.read(model.mapping(model.person), &document, "", &mut errors).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, "age");
        assert_eq!(errors[0].message, "Expected integer.");
        assert_eq!(errors[1].path, "parent._id");
        assert!(object.get("parent").is_none());
        assert!(object.get("age").is_none());
        assert_eq!(object.get("name").unwrap().as_str(), Some("Alice"));
    }

    #[test]
    fn test_null_requires_nullable_property() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let document = json!({"_id": model.id().to_document(), "name": null, "parent": null});

        let mut errors = Vec::new();
        let value = mapper.read(model.mapping(model.person), &document, "", &mut errors).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(errors, vec![MappingError::new("Field cannot be null.", "name", Json::Null)]);
        assert!(object.get("name").is_none());
        assert!(object.get("parent").unwrap().is_null());
    }

    #[test]
    fn test_reference_is_not_hydrated() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let id = model.id();

        let mut errors = Vec::new();
        let value = mapper
            .read(model.mapping(model.person), &id.to_document(), "parent", &mut errors)
            .unwrap();
        assert!(model.generator.are_equal(value.as_id().unwrap(), &id));
    }

    #[test]
    fn test_discriminator_selects_subclass() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let document = json!({
            "_id": model.id().to_document(),
            "__t": "Employee",
            "name": "Bob",
            "company": "Acme"
        });

        let value = mapper.read_document(model.mapping(model.person), &document).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.type_key(), Some(model.employee));
        assert_eq!(object.get("company").unwrap().as_str(), Some("Acme"));
    }

    #[test]
    fn test_unknown_discriminator() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let document = json!({"_id": model.id().to_document(), "__t": "Robot"});

        let errors = mapper.read_document(model.mapping(model.person), &document).unwrap_err();
        assert_eq!(errors.first().message, "Unknown discriminator value 'Robot'.");
        assert_eq!(errors.first().path, "__t");
    }

    #[test]
    fn test_array_errors_are_indexed() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let document = json!({"_id": model.id().to_document(), "tags": ["a", 2, "c"]});

        let errors = mapper.read_document(model.mapping(model.person), &document).unwrap_err();
        assert_eq!(errors.first().path, "tags.1");
        assert_eq!(errors.first().message, "Expected string.");
    }

    #[test]
    fn test_embedded_must_be_document() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let document = json!({"_id": model.id().to_document(), "address": "Main St"});

        let errors = mapper.read_document(model.mapping(model.person), &document).unwrap_err();
        assert_eq!(errors.first().message, "Expected document.");
        assert_eq!(errors.first().path, "address");
    }
}
