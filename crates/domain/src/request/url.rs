//! Request URL type
//!
//! A URL is either a raw template string (which may contain `{{variable}}`
//! references and `:param` path parameters) or a set of structured
//! components from which the absolute URL is synthesized.

use serde::{Deserialize, Serialize};

/// A query string entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    /// Parameter name.
    pub key: String,
    /// Parameter value.
    #[serde(default)]
    pub value: String,
    /// Disabled entries are skipped during resolution.
    #[serde(default)]
    pub disabled: bool,
}

impl QueryParam {
    /// Creates an enabled query parameter.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            disabled: false,
        }
    }
}

/// A request URL: raw template and/or structured components.
///
/// When a non-empty raw template exists it takes precedence; structured
/// query parameters are still merged into the resolved raw URL when their
/// keys are not already present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Url {
    /// Raw URL template, e.g. `https://{{host}}/users/:id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// URL scheme, e.g. `https`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Host segments, joined with `.`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,
    /// Optional port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Path segments, joined with `/`. A segment starting with `:` is a
    /// path parameter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    /// Query parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<QueryParam>,
    /// Fragment (without the leading `#`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Url {
    /// Creates a URL from a raw template string.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            ..Self::default()
        }
    }

    /// Returns the raw template when present and non-empty.
    #[must_use]
    pub fn raw_template(&self) -> Option<&str> {
        self.raw.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// Returns true when neither a raw template nor a host is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_template().is_none() && self.host.is_empty()
    }

    /// Returns the enabled query parameters.
    pub fn active_query(&self) -> impl Iterator<Item = &QueryParam> {
        self.query.iter().filter(|q| !q.disabled && !q.key.is_empty())
    }

    /// Adds a query parameter.
    pub fn add_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push(QueryParam::new(key, value));
    }
}

impl From<&str> for Url {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}
