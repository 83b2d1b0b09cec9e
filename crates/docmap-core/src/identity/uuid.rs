//! UUID identifiers.

use super::{IdentityGenerator, Identifier};
use uuid::Uuid;

/// Generates random (v4) UUIDs in hyphenated lowercase form.
///
/// Any spelling accepted by [`Uuid::parse_str`] is valid, and two ids are
/// equal when they parse to the same UUID.
#[derive(Debug, Default)]
pub struct UuidGenerator;

impl UuidGenerator {
    /// Create a UUID generator.
    pub fn new() -> Self {
        Self
    }

    fn uuid_of(id: &Identifier) -> Option<Uuid> {
        id.as_str().and_then(|text| Uuid::parse_str(text).ok())
    }
}

impl IdentityGenerator for UuidGenerator {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn generate(&self) -> Identifier {
        Identifier::new(Uuid::new_v4().hyphenated().to_string())
    }

    fn validate(&self, id: &Identifier) -> bool {
        Self::uuid_of(id).is_some()
    }

    fn are_equal(&self, a: &Identifier, b: &Identifier) -> bool {
        match (Self::uuid_of(a), Self::uuid_of(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn parse(&self, text: &str) -> Option<Identifier> {
        Uuid::parse_str(text)
            .ok()
            .map(|uuid| Identifier::new(uuid.hyphenated().to_string()))
    }

    fn format(&self, id: &Identifier) -> String {
        match Self::uuid_of(id) {
            Some(uuid) => uuid.hyphenated().to_string(),
            None => id.to_string(),
        }
    }
}
