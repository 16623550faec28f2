//! Variables and variable scopes
//!
//! A variable lives in exactly one of four scopes. Scopes are looked up
//! in precedence order: request > folder > collection > environment.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A single variable value with an enabled flag.
///
/// Disabled variables are invisible to lookup; an enabled variable with an
/// empty value is still a found value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// The variable value.
    pub value: String,
    /// Whether the variable participates in resolution.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Variable {
    /// Creates a new enabled variable.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a disabled variable.
    #[must_use]
    pub fn disabled(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            enabled: false,
        }
    }
}

/// Name-to-variable mapping for a single scope.
pub type VariableMap = HashMap<String, Variable>;

/// The four variable scopes, lowest to highest precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableScope {
    /// Caller-supplied configuration, lowest precedence.
    Environment,
    /// Variables declared on the collection.
    Collection,
    /// Variables declared on the enclosing folder chain.
    Folder,
    /// Variables declared on (or injected for) a single request.
    Request,
}

impl VariableScope {
    /// All scopes in precedence order, highest first.
    pub const PRECEDENCE: [Self; 4] = [
        Self::Request,
        Self::Folder,
        Self::Collection,
        Self::Environment,
    ];

    /// Returns the canonical scope name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Collection => "collection",
            Self::Folder => "folder",
            Self::Request => "request",
        }
    }
}

impl FromStr for VariableScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "environment" => Ok(Self::Environment),
            "collection" => Ok(Self::Collection),
            "folder" => Ok(Self::Folder),
            "request" => Ok(Self::Request),
            other => Err(DomainError::InvalidScope(other.to_string())),
        }
    }
}

impl std::fmt::Display for VariableScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_variable_new_is_enabled() {
        let var = Variable::new("hello");
        assert!(var.enabled);
        assert_eq!(var.value, "hello");
    }

    #[test]
    fn test_scope_parse_roundtrip() {
        for scope in VariableScope::PRECEDENCE {
            let parsed: VariableScope = scope.as_str().parse().expect("canonical name parses");
            assert_eq!(parsed, scope);
        }
    }

    #[test]
    fn test_scope_parse_invalid() {
        let err = "global".parse::<VariableScope>().unwrap_err();
        assert_eq!(err, DomainError::InvalidScope("global".to_string()));
    }

    #[test]
    fn test_precedence_order() {
        assert_eq!(VariableScope::PRECEDENCE[0], VariableScope::Request);
        assert_eq!(VariableScope::PRECEDENCE[3], VariableScope::Environment);
    }
}
