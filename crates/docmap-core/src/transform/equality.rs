//! Equality of objects and documents under a mapping.

use serde_json::Value as Json;

use super::{Mapper, MappingError};
use crate::identity::Identifier;
use crate::mapping::{ClassMapping, FieldType, ScalarType, ID_FIELD};
use crate::object::{Value, Visited};

impl<'a> Mapper<'a> {
    /// Check whether two objects are equal under `mapping`.
    ///
    /// Entities are equal when their identifiers are equal under the
    /// hierarchy's generator. Other values are equal when their written
    /// documents are.
    pub fn are_equal(&self, mapping: &ClassMapping, a: &Value, b: &Value) -> bool {
        if mapping.is_entity() {
            let (Some(a), Some(b)) = (
                self.reference_identifier(mapping, a),
                self.reference_identifier(mapping, b),
            ) else {
                return false;
            };
            return self
                .registry
                .identity_for(mapping.key)
                .is_some_and(|generator| generator.are_equal(&a, &b));
        }

        let mut errors: Vec<MappingError> = Vec::new();
        let a = self.write(mapping, a, "", &mut errors, &mut Visited::new());
        let b = self.write(mapping, b, "", &mut errors, &mut Visited::new());
        match (a, b) {
            (Some(a), Some(b)) if errors.is_empty() => self.are_documents_equal(mapping, &a, &b),
            _ => false,
        }
    }

    /// Check whether two documents are equal under `mapping`, field by field.
    pub fn are_documents_equal(&self, mapping: &ClassMapping, a: &Json, b: &Json) -> bool {
        let (Some(a_fields), Some(b_fields)) = (a.as_object(), b.as_object()) else {
            return false;
        };

        if mapping.is_entity() {
            let same_id = match (a_fields.get(ID_FIELD), b_fields.get(ID_FIELD)) {
                (Some(a_id), Some(b_id)) => self.identifiers_equal(mapping, a_id, b_id),
                (None, None) => true,
                _ => false,
            };
            if !same_id {
                return false;
            }
        }

        let mut concrete = mapping;
        if let Some(field) = self.discriminator_field(mapping) {
            let a_value = a_fields.get(field).and_then(Json::as_str);
            if a_value != b_fields.get(field).and_then(Json::as_str) {
                return false;
            }
            match self.discriminated(mapping, a_value) {
                Some(resolved) => concrete = resolved,
                None => return false,
            }
        }

        self.registry
            .properties(concrete)
            .into_iter()
            .filter(|property| property.is_mapped())
            .all(|property| {
                match (a_fields.get(&property.field), b_fields.get(&property.field)) {
                    (None, None) => true,
                    (Some(a), Some(b)) => self.documents_equal(&property.field_type, a, b),
                    _ => false,
                }
            })
    }

    /// Check whether two document values are equal under a field type.
    pub(super) fn documents_equal(&self, field_type: &FieldType, a: &Json, b: &Json) -> bool {
        if a.is_null() || b.is_null() {
            return a.is_null() && b.is_null();
        }

        match field_type {
            FieldType::Scalar(ScalarType::Float) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            FieldType::Scalar(_) => a == b,
            FieldType::Reference(key) => self
                .registry
                .get_mapping(*key)
                .is_some_and(|mapping| self.identifiers_equal(mapping, a, b)),
            FieldType::Embedded(key) => self
                .registry
                .get_mapping(*key)
                .is_some_and(|mapping| self.are_documents_equal(mapping, a, b)),
            FieldType::Array(element) => match (a.as_array(), b.as_array()) {
                (Some(a), Some(b)) => {
                    a.len() == b.len()
                        && a.iter().zip(b).all(|(a, b)| self.documents_equal(element, a, b))
                }
                _ => false,
            },
        }
    }

    fn identifiers_equal(&self, mapping: &ClassMapping, a: &Json, b: &Json) -> bool {
        let (Some(a), Some(b)) = (Identifier::from_document(a), Identifier::from_document(b)) else {
            return false;
        };
        self.registry
            .identity_for(mapping.key)
            .is_some_and(|generator| generator.are_equal(&a, &b))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::model;
    use super::*;
    use crate::object::ObjectRef;
    use serde_json::json;

    #[test]
    fn test_entities_equal_by_identifier() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let id = model.id();
        let upper = Identifier::new(id.as_str().unwrap().to_uppercase());

        let loaded = ObjectRef::new(model.person).with("_id", id.clone()).with("name", "A");
        let stub = ObjectRef::stub(upper);
        let other = ObjectRef::new(model.person).with("_id", model.id());

        let person = model.mapping(model.person);
        assert!(mapper.are_equal(person, &loaded.clone().into(), &stub.into()));
        assert!(mapper.are_equal(person, &loaded.clone().into(), &Value::Id(id)));
        assert!(!mapper.are_equal(person, &loaded.into(), &other.into()));
        assert!(!mapper.are_equal(person, &Value::Null, &Value::Null));
    }

    #[test]
    fn test_embeddables_equal_by_content() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let address = model.mapping(model.address);

        let a = ObjectRef::new(model.address).with("city", "Paris");
        let b = ObjectRef::untyped().with("city", "Paris");
        let c = ObjectRef::new(model.address).with("city", "Lyon");

        assert!(mapper.are_equal(address, &a.clone().into(), &b.into()));
        assert!(!mapper.are_equal(address, &a.into(), &c.into()));
    }

    #[test]
    fn test_documents_equal() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let person = model.mapping(model.person);
        let (id, parent) = (model.id(), model.id());
        let parent_upper = parent.as_str().unwrap().to_uppercase();

        let a = json!({"_id": id.to_document(), "__t": "Person", "name": "A", "parent": parent.to_document()});
        let b = json!({"_id": id.to_document(), "__t": "Person", "name": "A", "parent": parent_upper});
        let c = json!({"_id": id.to_document(), "__t": "Person", "name": "B", "parent": parent.to_document()});
        let d = json!({"_id": id.to_document(), "__t": "Employee", "name": "A", "parent": parent.to_document()});

        assert!(mapper.are_documents_equal(person, &a, &b));
        assert!(!mapper.are_documents_equal(person, &a, &c));
        assert!(!mapper.are_documents_equal(person, &a, &d));
    }

    #[test]
    fn test_float_fields_compare_numerically() {
        let model = model();
        let mapper = Mapper::new(&model.registry);
        let float = FieldType::scalar(ScalarType::Float);

        assert!(mapper.documents_equal(&float, &json!(3), &json!(3.0)));
        assert!(!mapper.documents_equal(&FieldType::scalar(ScalarType::Any), &json!(3), &json!(3.0)));
        assert!(mapper.documents_equal(&float, &json!(null), &json!(null)));
    }
}
