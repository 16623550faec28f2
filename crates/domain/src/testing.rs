//! Test assertion value object

use serde::{Deserialize, Serialize};

/// One named pass/fail outcome produced by a test script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Assertion name as given by the script.
    pub name: String,
    /// Whether the assertion passed.
    pub passed: bool,
    /// Failure detail, present only for failed assertions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Assertion {
    /// Creates a passing assertion.
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
        }
    }

    /// Creates a failing assertion with an error detail.
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
        }
    }
}
