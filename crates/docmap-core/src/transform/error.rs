//! Data errors reported while transforming values.

use std::fmt;

use serde::Serialize;
use serde_json::Value as Json;

/// A problem with one value, located by its document path.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{message} (at '{path}')")]
pub struct MappingError {
    /// Description.
    pub message: String,
    /// Dotted document path of the offending value.
    pub path: String,
    /// The offending value.
    pub value: Json,
}

impl MappingError {
    /// Create a mapping error.
    pub fn new(message: impl Into<String>, path: impl Into<String>, value: Json) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            value,
        }
    }
}

/// A non-empty list of mapping errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MappingErrors(Vec<MappingError>);

impl MappingErrors {
    /// Wrap collected errors. Returns `None` if there are none.
    pub fn from_vec(errors: Vec<MappingError>) -> Option<Self> {
        (!errors.is_empty()).then_some(Self(errors))
    }

    pub(crate) fn single(error: MappingError) -> Self {
        Self(vec![error])
    }

    /// The first error.
    pub fn first(&self) -> &MappingError {
        &self.0[0]
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> std::slice::Iter<'_, MappingError> {
        self.0.iter()
    }

    /// Unwrap into the underlying list.
    pub fn into_vec(self) -> Vec<MappingError> {
        self.0
    }
}

impl fmt::Display for MappingErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first())?;
        if self.len() > 1 {
            write!(f, " and {} more error(s)", self.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for MappingErrors {}

impl<'a> IntoIterator for &'a MappingErrors {
    type Item = &'a MappingError;
    type IntoIter = std::slice::Iter<'a, MappingError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_list_is_rejected() {
        assert!(MappingErrors::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_display() {
        let errors = MappingErrors::from_vec(vec![
            MappingError::new("Missing identifier.", "_id", json!({})),
            MappingError::new("Expected string.", "name", json!(3)),
        ])
        .unwrap();

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "Missing identifier. (at '_id') and 1 more error(s)"
        );
        assert_eq!(
            serde_json::to_value(&errors).unwrap()[1]["path"],
            json!("name")
        );
    }
}
