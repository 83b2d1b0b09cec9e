//! Object to document.

use serde_json::{Map, Value as Json};

use super::{bare_identifier, id_path, join, MappingError, Mapper, NOT_NULLABLE};
use crate::mapping::{ClassMapping, FieldType, ID_FIELD};
use crate::object::{Value, Visited};

const RECURSIVE_REFERENCE: &str = "Recursive reference of embedded object is not allowed.";

impl<'a> Mapper<'a> {
    /// Write `value` according to `mapping`.
    ///
    /// At the root an entity is written in full with its `_id`. Below the
    /// root an entity is a reference: an instance is replaced by its `_id`
    /// and any other value is taken as the identifier itself. `visited`
    /// holds the objects and lists on the current walk; re-entering one is
    /// an error, while writing the same node from sibling paths is not.
    pub fn write(
        &self,
        mapping: &ClassMapping,
        value: &Value,
        path: &str,
        errors: &mut Vec<MappingError>,
        visited: &mut Visited,
    ) -> Option<Json> {
        if mapping.is_entity() {
            self.write_entity(mapping, value, path, errors, visited)
        } else {
            self.write_class(mapping, value, path, errors, visited)
        }
    }

    fn write_entity(
        &self,
        mapping: &ClassMapping,
        value: &Value,
        path: &str,
        errors: &mut Vec<MappingError>,
        visited: &mut Visited,
    ) -> Option<Json> {
        // Instances and untyped stubs must carry `_id`; other values are ids.
        let carrier = value
            .as_object()
            .filter(|object| object.type_key().is_none() || self.is_instance(mapping, value));
        let id = if let Some(object) = carrier {
            match object.id() {
                Some(id) => id,
                None => {
                    errors.push(MappingError::new("Missing identifier.", id_path(path), value.summary()));
                    return None;
                }
            }
        } else {
            match bare_identifier(value) {
                Some(id) => id,
                None => {
                    let summary = value.summary();
                    errors.push(MappingError::new(
                        format!("'{summary}' is not a valid identifier."),
                        id_path(path),
                        summary,
                    ));
                    return None;
                }
            }
        };
        let id = self.check_identifier(mapping, id, path, errors)?;

        if !path.is_empty() {
            return Some(id.to_document());
        }

        let mut document = self.write_class(mapping, value, path, errors, visited)?;
        if let Json::Object(fields) = &mut document {
            fields.insert(ID_FIELD.to_string(), id.to_document());
        }
        Some(document)
    }

    fn write_class(
        &self,
        mapping: &ClassMapping,
        value: &Value,
        path: &str,
        errors: &mut Vec<MappingError>,
        visited: &mut Visited,
    ) -> Option<Json> {
        let Some(concrete) = self.concrete_for_object(mapping, value) else {
            errors.push(MappingError::new(
                format!("Expected instance of '{}'.", mapping.name),
                path,
                value.summary(),
            ));
            return None;
        };
        let object = value.as_object()?;
        if !visited.enter(object.address()) {
            errors.push(MappingError::new(RECURSIVE_REFERENCE, path, value.summary()));
            return None;
        }

        let mut document = Map::new();
        if let (Some(field), Some(discriminator)) = (
            self.discriminator_field(concrete),
            concrete.discriminator_value.as_ref(),
        ) {
            document.insert(field.to_string(), Json::String(discriminator.clone()));
        }

        for property in self.registry.properties(concrete) {
            if !property.is_mapped() {
                continue;
            }
            let Some(field_value) = object.get(&property.name) else {
                continue;
            };
            let field_path = join(path, &property.field);
            if field_value.is_null() {
                if property.nullable {
                    document.insert(property.field.clone(), Json::Null);
                } else {
                    errors.push(MappingError::new(NOT_NULLABLE, field_path, Json::Null));
                }
                continue;
            }

            if let Some(written) =
                self.write_value(&property.field_type, &field_value, &field_path, errors, visited)
            {
                document.insert(property.field.clone(), written);
            }
        }

        visited.leave(object.address());
        Some(Json::Object(document))
    }

    /// The mapping to write an object with: its own mapping when it is
    /// `mapping` or a subclass, `mapping` itself when untyped.
    pub(super) fn concrete_for_object<'m>(
        &self,
        mapping: &'m ClassMapping,
        value: &Value,
    ) -> Option<&'m ClassMapping>
    where
        'a: 'm,
    {
        let object = value.as_object()?;
        match object.type_key() {
            None => Some(mapping),
            Some(key) if key == mapping.key => Some(mapping),
            Some(key) if self.registry.is_assignable(key, mapping.key) => self.registry.get_mapping(key),
            Some(_) => None,
        }
    }

    pub(super) fn write_value(
        &self,
        field_type: &FieldType,
        value: &Value,
        path: &str,
        errors: &mut Vec<MappingError>,
        visited: &mut Visited,
    ) -> Option<Json> {
        match field_type {
            FieldType::Scalar(scalar) => {
                if !scalar.accepts_value(value) {
                    errors.push(MappingError::new(
                        format!("Expected {}.", scalar.name()),
                        path,
                        value.summary(),
                    ));
                    return None;
                }
                scalar_to_document(value, path, errors, visited)
            }
            FieldType::Embedded(key) | FieldType::Reference(key) => {
                let mapping = self.mapping_for(*key, path, || value.summary(), errors)?;
                self.write(mapping, value, path, errors, visited)
            }
            FieldType::Array(element) => {
                let Some(list) = value.as_list() else {
                    errors.push(MappingError::new("Expected array.", path, value.summary()));
                    return None;
                };
                if !visited.enter(list.address()) {
                    errors.push(MappingError::new(RECURSIVE_REFERENCE, path, value.summary()));
                    return None;
                }

                let items = list.items();
                let mut written = Vec::with_capacity(items.len());
                let mut failed = false;
                for (index, item) in items.iter().enumerate() {
                    if item.is_null() {
                        written.push(Json::Null);
                        continue;
                    }
                    let item_path = join(path, &index.to_string());
                    match self.write_value(element, item, &item_path, errors, visited) {
                        Some(item) => written.push(item),
                        None => failed = true,
                    }
                }

                visited.leave(list.address());
                (!failed).then_some(Json::Array(written))
            }
        }
    }
}

/// Convert an untyped value to its document form.
fn scalar_to_document(
    value: &Value,
    path: &str,
    errors: &mut Vec<MappingError>,
    visited: &mut Visited,
) -> Option<Json> {
    match value {
        Value::Null => Some(Json::Null),
        Value::Bool(b) => Some(Json::Bool(*b)),
        Value::Integer(i) => Some(Json::from(*i)),
        Value::Float(f) => Some(Json::from(*f)),
        Value::String(s) => Some(Json::String(s.clone())),
        Value::Id(id) => Some(id.to_document()),
        Value::List(list) => {
            if !visited.enter(list.address()) {
                errors.push(MappingError::new(RECURSIVE_REFERENCE, path, value.summary()));
                return None;
            }
            let items: Option<Vec<Json>> = list
                .items()
                .iter()
                .enumerate()
                .map(|(index, item)| scalar_to_document(item, &join(path, &index.to_string()), errors, visited))
                .collect();
            visited.leave(list.address());
            items.map(Json::Array)
        }
        Value::Object(object) => {
            if !visited.enter(object.address()) {
                errors.push(MappingError::new(RECURSIVE_REFERENCE, path, value.summary()));
                return None;
            }
            let fields: Option<Map<String, Json>> = object
                .fields()
                .into_iter()
                .map(|(name, item)| {
                    let written = scalar_to_document(&item, &join(path, &name), errors, visited);
                    written.map(|written| (name, written))
                })
                .collect();
            visited.leave(object.address());
            fields.map(Json::Object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::model;
    use super::*;
    use crate::identity::Identifier;
    use crate::object::{ListRef, ObjectRef};
    use serde_json::json;

    #[test]
    fn test_write_root_entity() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let (id, parent) = (model.id(), model.id());

        let person = ObjectRef::new(model.person)
            .with("_id", id.clone())
            .with("name", "Alice")
            .with("parent", ObjectRef::new(model.person).with("_id", parent.clone()))
            .with(
                "address",
                ObjectRef::new(model.address).with("street", "Main St").with("city", "Springfield"),
            )
            .with("tags", ListRef::from_values(vec!["a".into(), "b".into()]))
            .with("scratch", "ignored");

        let document = mapper.write_object(model.mapping(model.person), &person.into()).unwrap();
        assert_eq!(
            document,
            json!({
                "_id": id.to_document(),
                "__t": "Person",
                "name": "Alice",
                "parent": parent.to_document(),
                "address": {"street": "Main St", "city": "Springfield"},
                "tags": ["a", "b"]
            })
        );
    }

    #[test]
    fn test_reference_accepts_bare_identifier() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let id = model.id();

        for value in [
            Value::Id(id.clone()),
            Value::from(id.as_str().unwrap()),
            Value::from(ObjectRef::stub(id.clone())),
        ] {
            let mut errors = Vec::new();
            let written = mapper.write(model.mapping(model.person), &value, "parent", &mut errors, &mut Visited::new());
            assert_eq!(written, Some(id.to_document()));
            assert!(errors.is_empty());
        }
    }

    #[test]
    fn test_missing_identifier_on_instance() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let parent = ObjectRef::new(model.person).with("name", "Nobody");

        let mut errors = Vec::new();
        let written = mapper.write(
            model.mapping(model.person),
            &parent.into(),
            "parent",
            &mut errors,
            &mut Visited::new(),
        );
        assert!(written.is_none());
        assert_eq!(errors[0].message, "Missing identifier.");
        assert_eq!(errors[0].path, "parent._id");
    }

    #[test]
    fn test_missing_identifier_on_untyped_object() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let person = ObjectRef::untyped().with("name", "Nobody");

        let errors = mapper.write_object(model.mapping(model.person), &person.into()).unwrap_err();
        assert_eq!(errors.first().message, "Missing identifier.");
        assert_eq!(errors.first().path, "_id");

        let mut errors = Vec::new();
        let stub = ObjectRef::untyped();
        let written = mapper.write(model.mapping(model.person), &stub.into(), "parent", &mut errors, &mut Visited::new());
        assert!(written.is_none());
        assert_eq!(errors[0].message, "Missing identifier.");
        assert_eq!(errors[0].path, "parent._id");
    }

    #[test]
    fn test_null_requires_nullable_property() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let person = ObjectRef::new(model.person)
            .with("_id", model.id())
            .with("name", Value::Null)
            .with("parent", Value::Null);

        let mut errors = Vec::new();
        let written = mapper
            .write(model.mapping(model.person), &person.into(), "", &mut errors, &mut Visited::new())
            .unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Field cannot be null.");
        assert_eq!(errors[0].path, "name");
        assert!(written.get("name").is_none());
        assert_eq!(written.get("parent"), Some(&Json::Null));
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let person = ObjectRef::new(model.person).with("_id", Identifier::new("1"));

        let errors = mapper.write_object(model.mapping(model.person), &person.into()).unwrap_err();
        assert_eq!(errors.first().message, "'1' is not a valid identifier.");
        assert_eq!(errors.first().path, "_id");
    }

    #[test]
    fn test_wrong_instance_rejected() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let person = ObjectRef::new(model.person)
            .with("_id", model.id())
            .with("address", ObjectRef::new(model.person));

        let errors = mapper.write_object(model.mapping(model.person), &person.into()).unwrap_err();
        assert_eq!(errors.first().message, "Expected instance of 'Address'.");
        assert_eq!(errors.first().path, "address");
    }

    #[test]
    fn test_subclass_writes_discriminator() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let employee = ObjectRef::new(model.employee)
            .with("_id", model.id())
            .with("company", "Acme");

        let document = mapper.write_object(model.mapping(model.person), &employee.into()).unwrap();
        assert_eq!(document["__t"], json!("Employee"));
        assert_eq!(document["company"], json!("Acme"));
    }

    #[test]
    fn test_shared_node_is_not_a_cycle() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let tags = ListRef::from_values(vec!["x".into()]);

        let left = ObjectRef::new(model.person).with("_id", model.id()).with("tags", tags.clone());
        let right = ObjectRef::new(model.person).with("_id", model.id()).with("tags", tags);
        let mut visited = Visited::new();
        let mut errors = Vec::new();

        assert!(mapper.write(model.mapping(model.person), &left.into(), "", &mut errors, &mut visited).is_some());
        assert!(mapper.write(model.mapping(model.person), &right.into(), "", &mut errors, &mut visited).is_some());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_cycle_is_an_error() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let list = ListRef::new();
        list.push(list.clone());

        let person = ObjectRef::new(model.person).with("_id", model.id()).with("scratch", 1);
        person.set("tags", list);

        let errors = mapper.write_object(model.mapping(model.person), &person.into()).unwrap_err();
        assert!(errors.iter().any(|e| e.message == "Expected string."));

        let any = ListRef::new();
        any.push(any.clone());
        let mut errors = Vec::new();
        assert!(scalar_to_document(&any.into(), "data", &mut errors, &mut Visited::new()).is_none());
        assert_eq!(errors[0].message, RECURSIVE_REFERENCE);
        assert_eq!(errors[0].path, "data.0");
    }
}
