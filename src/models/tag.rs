//! Tag model
//!
//! Tags are free-form labels ("vacation", "reimbursable") that can be
//! attached to any number of transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::TagId;

pub const MAX_TAG_NAME_LEN: usize = 30;

/// Characters reserved for separating tags in CSV cells and CLI lists
pub const TAG_SEPARATORS: &[char] = &[';', '|', ','];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TagId::new(),
            name: name.into().trim().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Case-insensitive name comparison
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    pub fn validate(&self) -> Result<(), TagValidationError> {
        if self.name.is_empty() {
            return Err(TagValidationError::EmptyName);
        }

        let len = self.name.chars().count();
        if len > MAX_TAG_NAME_LEN {
            return Err(TagValidationError::NameTooLong(len));
        }

        if let Some(c) = self.name.chars().find(|c| TAG_SEPARATORS.contains(c)) {
            return Err(TagValidationError::ReservedCharacter(c));
        }

        Ok(())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.name)
    }
}

/// Split a tag list like "travel; work|food" into trimmed, non-empty names
pub fn split_tag_list(s: &str, separator: char) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for part in s.split(|c: char| c == separator || c == '|') {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            names.push(name.to_string());
        }
    }
    names
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    EmptyName,
    NameTooLong(usize),
    ReservedCharacter(char),
}

impl fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Tag name cannot be empty"),
            Self::NameTooLong(len) => write!(
                f,
                "Tag name too long ({} chars, max {})",
                len, MAX_TAG_NAME_LEN
            ),
            Self::ReservedCharacter(c) => {
                write!(f, "Tag name cannot contain '{}'", c)
            }
        }
    }
}

impl std::error::Error for TagValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tag() {
        let tag = Tag::new(" vacation ");
        assert_eq!(tag.name, "vacation");
        assert!(tag.matches_name("VACATION"));
        assert_eq!(tag.to_string(), "#vacation");
    }

    #[test]
    fn test_validation() {
        assert!(Tag::new("work").validate().is_ok());
        assert_eq!(Tag::new("  ").validate(), Err(TagValidationError::EmptyName));
        assert_eq!(
            Tag::new("a;b").validate(),
            Err(TagValidationError::ReservedCharacter(';'))
        );
        assert!(matches!(
            Tag::new("x".repeat(31)).validate(),
            Err(TagValidationError::NameTooLong(31))
        ));
    }

    #[test]
    fn test_split_tag_list() {
        assert_eq!(
            split_tag_list("travel; work |food;;Travel", ';'),
            vec!["travel", "work", "food"]
        );
        assert_eq!(split_tag_list("a,b", ','), vec!["a", "b"]);
        assert!(split_tag_list("  ", ';').is_empty());
    }
}
