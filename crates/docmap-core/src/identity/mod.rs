//! Entity identifiers and the generators that own their semantics.
//!
//! An [`Identifier`] is opaque. Two identifiers are only ever compared
//! through the [`IdentityGenerator`] of the hierarchy they belong to, since
//! generators may accept several spellings of the same id.

mod object_id;
mod uuid;

pub use self::object_id::ObjectIdGenerator;
pub use self::uuid::UuidGenerator;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;

/// An opaque, generator-defined identifier value.
///
/// Identifiers are text or integers. There is intentionally no `PartialEq`;
/// use [`IdentityGenerator::are_equal`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Json);

impl Identifier {
    /// Create a text identifier.
    pub fn new(text: impl Into<String>) -> Self {
        Self(Json::String(text.into()))
    }

    /// Create an integer identifier.
    pub fn from_integer(value: i64) -> Self {
        Self(Json::from(value))
    }

    /// Interpret a document value as an identifier.
    ///
    /// Only strings and integers qualify.
    pub fn from_document(value: &Json) -> Option<Self> {
        match value {
            Json::String(_) => Some(Self(value.clone())),
            Json::Number(n) if n.is_i64() || n.is_u64() => Some(Self(value.clone())),
            _ => None,
        }
    }

    /// The identifier as stored in a document.
    pub fn as_document(&self) -> &Json {
        &self.0
    }

    /// The identifier as stored in a document, owned.
    pub fn to_document(&self) -> Json {
        self.0.clone()
    }

    /// Text form, if this is a text identifier.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Integer form, if this is an integer identifier.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.as_i64()
    }

    /// Byte-for-byte equality of the raw representation.
    ///
    /// Not a substitute for generator equality.
    pub(crate) fn same_raw(&self, other: &Identifier) -> bool {
        self.0 == other.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Json::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// Produces, validates and compares identifiers for an entity hierarchy.
pub trait IdentityGenerator: Send + Sync + fmt::Debug {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Generate a new identifier.
    fn generate(&self) -> Identifier;

    /// Check whether `id` is a well-formed identifier of this scheme.
    fn validate(&self, id: &Identifier) -> bool;

    /// Check whether two identifiers denote the same entity.
    ///
    /// Invalid identifiers are never equal.
    fn are_equal(&self, a: &Identifier, b: &Identifier) -> bool;

    /// Parse the text form of an identifier.
    fn parse(&self, text: &str) -> Option<Identifier>;

    /// Canonical text form of an identifier.
    fn format(&self, id: &Identifier) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_document() {
        assert!(Identifier::from_document(&json!("abc")).is_some());
        assert!(Identifier::from_document(&json!(12)).is_some());
        assert!(Identifier::from_document(&json!(1.5)).is_none());
        assert!(Identifier::from_document(&json!(null)).is_none());
        assert!(Identifier::from_document(&json!({"_id": "abc"})).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Identifier::new("abc").to_string(), "abc");
        assert_eq!(Identifier::from_integer(42).to_string(), "42");
    }

    #[test]
    fn test_serde_transparent() {
        let id: Identifier = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(id.as_str(), Some("abc"));
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("abc"));
    }
}
