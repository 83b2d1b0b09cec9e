//! Property descriptors.

use super::types::FieldType;

/// A mapped property of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Field name on the object.
    pub name: String,
    /// Field name in the document.
    pub field: String,
    /// Property data type.
    pub field_type: FieldType,
    /// Holds the entity identifier; handled outside the generic field loop.
    pub identifier: bool,
    /// Skipped on read, write and compare.
    pub ignored: bool,
    /// Whether the property may hold null. Read and write reject null otherwise.
    pub nullable: bool,
}

impl Property {
    /// Create a property whose document field has the same name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            field: name.clone(),
            name,
            field_type,
            identifier: false,
            ignored: false,
            nullable: false,
        }
    }

    /// Set the document field name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Mark as ignored.
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Mark as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as the identifier property.
    pub fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    /// Whether the generic field loop reads, writes and compares this property.
    pub fn is_mapped(&self) -> bool {
        !self.ignored && !self.identifier
    }
}
