//! Field type definitions.

use super::TypeKey;
use crate::object::Value;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Scalar types a property can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Any scalar (and lists of scalars), stored as-is.
    Any,
    /// Boolean value.
    Bool,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point. Integers are accepted.
    Float,
    /// UTF-8 string.
    String,
}

/// The type of a mapped property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A scalar value.
    Scalar(ScalarType),
    /// An embedded object, stored inline.
    Embedded(TypeKey),
    /// A reference to an entity, stored as its identifier.
    Reference(TypeKey),
    /// An ordered sequence.
    Array(Box<FieldType>),
}

impl ScalarType {
    /// Human readable name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Any => "scalar",
            ScalarType::Bool => "boolean",
            ScalarType::Integer => "integer",
            ScalarType::Float => "number",
            ScalarType::String => "string",
        }
    }

    /// Check whether a document value has this type.
    pub fn accepts_document(&self, value: &Json) -> bool {
        match self {
            ScalarType::Any => !value.is_object(),
            ScalarType::Bool => value.is_boolean(),
            ScalarType::Integer => value.is_i64(),
            ScalarType::Float => value.is_number(),
            ScalarType::String => value.is_string(),
        }
    }

    /// Check whether an object value has this type.
    pub fn accepts_value(&self, value: &Value) -> bool {
        match self {
            ScalarType::Any => !matches!(value, Value::Object(_)),
            ScalarType::Bool => matches!(value, Value::Bool(_)),
            ScalarType::Integer => matches!(value, Value::Integer(_)),
            ScalarType::Float => matches!(value, Value::Integer(_) | Value::Float(_)),
            ScalarType::String => matches!(value, Value::String(_)),
        }
    }
}

impl FieldType {
    /// Create a scalar field type.
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }

    /// Create an embedded field type.
    pub fn embedded(key: TypeKey) -> Self {
        FieldType::Embedded(key)
    }

    /// Create a reference field type.
    pub fn reference(key: TypeKey) -> Self {
        FieldType::Reference(key)
    }

    /// Create an array field type.
    pub fn array(element: FieldType) -> Self {
        FieldType::Array(Box::new(element))
    }

    /// Check if this type is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, FieldType::Array(_))
    }

    /// The mapping this type ultimately points at, looking through arrays.
    pub fn target(&self) -> Option<TypeKey> {
        match self {
            FieldType::Scalar(_) => None,
            FieldType::Embedded(key) | FieldType::Reference(key) => Some(*key),
            FieldType::Array(element) => element.target(),
        }
    }

    /// The innermost non-array type.
    pub fn element(&self) -> &FieldType {
        match self {
            FieldType::Array(element) => element.element(),
            other => other,
        }
    }
}
