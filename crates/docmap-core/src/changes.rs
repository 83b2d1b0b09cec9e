//! Accumulated update operations.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value as Json};

/// Operator assigning a field.
pub const SET: &str = "$set";

/// Operator removing a field.
pub const UNSET: &str = "$unset";

/// Operator incrementing a numeric field.
pub const INC: &str = "$inc";

/// Field-level update operations produced by one comparison pass.
///
/// Operations are grouped by operator and keyed by dotted document path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Changes {
    operations: BTreeMap<String, Map<String, Json>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unresolved: Vec<String>,
}

impl Changes {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `$set`.
    pub fn set(&mut self, path: impl Into<String>, value: Json) {
        self.put(SET, path.into(), value);
    }

    /// Record an `$unset`.
    pub fn unset(&mut self, path: impl Into<String>) {
        self.put(UNSET, path.into(), Json::String(String::new()));
    }

    /// Record an `$inc`.
    pub fn increment(&mut self, path: impl Into<String>, by: i64) {
        self.put(INC, path.into(), Json::from(by));
    }

    /// Record a reference whose identifier could not be determined.
    pub fn mark_unresolved(&mut self, path: impl Into<String>) {
        self.unresolved.push(path.into());
    }

    fn put(&mut self, operator: &str, path: String, value: Json) {
        self.operations
            .entry(operator.to_string())
            .or_default()
            .insert(path, value);
    }

    /// Check if no operation was recorded.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of recorded operations across all operators.
    pub fn len(&self) -> usize {
        self.operations.values().map(Map::len).sum()
    }

    /// Value recorded for `path` under `operator`.
    pub fn get(&self, operator: &str, path: &str) -> Option<&Json> {
        self.operations.get(operator)?.get(path)
    }

    /// Paths of unresolved references.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// The update document, e.g. `{"$set": {"name": "Joe"}}`.
    pub fn to_document(&self) -> Json {
        Json::Object(
            self.operations
                .iter()
                .map(|(operator, fields)| (operator.clone(), Json::Object(fields.clone())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty() {
        let changes = Changes::new();
        assert!(changes.is_empty());
        assert_eq!(changes.len(), 0);
        assert_eq!(changes.to_document(), json!({}));
    }

    #[test]
    fn test_operations_grouped_by_operator() {
        let mut changes = Changes::new();
        changes.set("name", json!("Joe"));
        changes.set("address.city", json!("Paris"));
        changes.unset("nickname");
        changes.increment("__v", 1);

        assert_eq!(changes.len(), 4);
        assert_eq!(changes.get(SET, "address.city"), Some(&json!("Paris")));
        assert_eq!(
            changes.to_document(),
            json!({
                "$set": {"name": "Joe", "address.city": "Paris"},
                "$unset": {"nickname": ""},
                "$inc": {"__v": 1}
            })
        );
    }

    #[test]
    fn test_unresolved_does_not_count_as_change() {
        let mut changes = Changes::new();
        changes.mark_unresolved("parent");
        assert!(changes.is_empty());
        assert_eq!(changes.unresolved().to_vec(), vec!["parent".to_string()]);
    }
}
