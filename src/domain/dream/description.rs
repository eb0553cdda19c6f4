//! The user's dream description.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Free-text dream description, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DreamDescription(String);

impl DreamDescription {
    /// Creates a description, rejecting empty or whitespace-only text.
    pub fn new(text: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("description"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DreamDescription {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DreamDescription {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DreamDescription> for String {
    fn from(value: DreamDescription) -> Self {
        value.0
    }
}

impl fmt::Display for DreamDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let d = DreamDescription::new("  I was flying over a glass city \n").unwrap();
        assert_eq!(d.as_str(), "I was flying over a glass city");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(
            DreamDescription::new(""),
            Err(ValidationError::empty_field("description"))
        );
        assert!(DreamDescription::new(" \t\n ").is_err());
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<DreamDescription>("\"   \"").is_err());
        let d: DreamDescription = serde_json::from_str("\"falling\"").unwrap();
        assert_eq!(d.to_string(), "falling");
    }
}
