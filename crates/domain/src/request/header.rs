//! Request header type

use serde::{Deserialize, Serialize};

/// A single request header entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name.
    pub key: String,
    /// Header value (may contain `{{variable}}` references).
    #[serde(default)]
    pub value: String,
    /// Disabled entries are skipped during resolution.
    #[serde(default)]
    pub disabled: bool,
}

impl Header {
    /// Creates an enabled header.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            disabled: false,
        }
    }

    /// Returns true when the entry participates in resolution.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.key.trim().is_empty()
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn matches_key(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active() {
        assert!(Header::new("Accept", "application/json").is_active());
        let mut header = Header::new("Accept", "text/html");
        header.disabled = true;
        assert!(!header.is_active());
        assert!(!Header::new("", "orphan").is_active());
    }

    #[test]
    fn test_matches_key_case_insensitive() {
        let header = Header::new("Content-Type", "application/json");
        assert!(header.matches_key("content-type"));
        assert!(header.matches_key("CONTENT-TYPE"));
        assert!(!header.matches_key("Accept"));
    }
}
