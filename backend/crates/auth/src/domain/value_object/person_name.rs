//! Person Name Value Object
//!
//! Given name or surname as displayed back to the user.
//! NFKC-normalized and trimmed; any script is allowed.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use crate::error::AuthError;

/// Maximum length in characters (after normalization)
pub const PERSON_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonName(String);

impl PersonName {
    /// `field` names the input in validation messages ("Name", "Surname").
    pub fn new(raw: &str, field: &str) -> Result<Self, AuthError> {
        let normalized: String = raw.nfkc().collect();
        let trimmed = normalized.trim();

        if trimmed.is_empty() {
            return Err(AuthError::Validation(format!("{} cannot be empty", field)));
        }
        if trimmed.chars().count() > PERSON_NAME_MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "{} must be at most {} characters",
                field, PERSON_NAME_MAX_LENGTH
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(AuthError::Validation(format!(
                "{} contains invalid characters",
                field
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_normalizes() {
        let name = PersonName::new("  Ｊｏｈｎ ", "Name").unwrap();
        assert_eq!(name.as_str(), "John");
    }

    #[test]
    fn test_non_latin_names() {
        assert!(PersonName::new("Đorđević", "Surname").is_ok());
        assert!(PersonName::new("山田", "Surname").is_ok());
    }

    #[test]
    fn test_rejects_empty_long_and_control() {
        assert!(matches!(
            PersonName::new("   ", "Name"),
            Err(AuthError::Validation(msg)) if msg == "Name cannot be empty"
        ));
        assert!(PersonName::new(&"x".repeat(PERSON_NAME_MAX_LENGTH + 1), "Name").is_err());
        assert!(PersonName::new("Jo\u{0007}hn", "Name").is_err());
    }
}
