//! Request body types
//!
//! The body mode is a closed enum decided at parse time; resolvers match
//! over the variant instead of re-validating mode strings.

use serde::{Deserialize, Serialize};

/// A form entry used by url-encoded and multipart bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// Field name.
    pub key: String,
    /// Field value, or a file path for file-kind entries.
    #[serde(default)]
    pub value: String,
    /// Whether the value is inline text or a file path.
    #[serde(default)]
    pub kind: FormFieldKind,
    /// Disabled entries are skipped during resolution.
    #[serde(default)]
    pub disabled: bool,
}

impl FormField {
    /// Creates an enabled text field.
    #[must_use]
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            kind: FormFieldKind::Text,
            disabled: false,
        }
    }

    /// Creates an enabled file field whose value is the source path.
    #[must_use]
    pub fn file(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: path.into(),
            kind: FormFieldKind::File,
            disabled: false,
        }
    }

    /// Returns true when the entry participates in resolution.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.key.trim().is_empty()
    }
}

/// The payload kind of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormFieldKind {
    /// Inline text value (default).
    #[default]
    Text,
    /// The value is a path to a file; the file content is attached by the
    /// transport, the path itself is what gets variable-resolved.
    File,
}

/// The mode-specific body payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Body {
    /// Raw text, typically JSON.
    Raw {
        /// The raw content.
        content: String,
    },
    /// `application/x-www-form-urlencoded` fields.
    UrlEncoded {
        /// The form fields.
        fields: Vec<FormField>,
    },
    /// `multipart/form-data` fields.
    FormData {
        /// The form fields.
        fields: Vec<FormField>,
    },
    /// A GraphQL query with optional JSON variables.
    #[serde(rename = "graphql")]
    GraphQl {
        /// The GraphQL query text.
        query: String,
        /// JSON-encoded variables object.
        #[serde(default)]
        variables: String,
    },
    /// The body is the content of a file; only the path is resolved here.
    File {
        /// Path to the source file.
        path: String,
    },
    /// Opaque binary payload carried as text.
    Binary {
        /// The payload.
        content: String,
    },
}

/// A request body: a mode payload plus a disabled flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySpec {
    /// The mode-specific payload.
    #[serde(flatten)]
    pub body: Body,
    /// A disabled body resolves to "no body".
    #[serde(default)]
    pub disabled: bool,
}

impl BodySpec {
    /// Creates an enabled raw body.
    #[must_use]
    pub fn raw(content: impl Into<String>) -> Self {
        Self {
            body: Body::Raw {
                content: content.into(),
            },
            disabled: false,
        }
    }

    /// Creates an enabled url-encoded body.
    #[must_use]
    pub fn url_encoded(fields: Vec<FormField>) -> Self {
        Self {
            body: Body::UrlEncoded { fields },
            disabled: false,
        }
    }

    /// Creates an enabled multipart body.
    #[must_use]
    pub fn form_data(fields: Vec<FormField>) -> Self {
        Self {
            body: Body::FormData { fields },
            disabled: false,
        }
    }

    /// Creates an enabled GraphQL body.
    #[must_use]
    pub fn graphql(query: impl Into<String>, variables: impl Into<String>) -> Self {
        Self {
            body: Body::GraphQl {
                query: query.into(),
                variables: variables.into(),
            },
            disabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mode_tag_serde() {
        let spec = BodySpec::raw(r#"{"a": 1}"#);
        let json = serde_json::to_string(&spec).expect("serializes");
        assert!(json.contains("\"mode\":\"raw\""));
        let back: BodySpec = serde_json::from_str(&json).expect("round trips");
        assert_eq!(back, spec);
    }

    #[test]
    fn test_graphql_rename() {
        let json = r#"{"mode": "graphql", "query": "{ user { id } }"}"#;
        let spec: BodySpec = serde_json::from_str(json).expect("parses");
        let Body::GraphQl { query, variables } = spec.body else {
            unreachable!("Expected GraphQl body variant");
        };
        assert_eq!(query, "{ user { id } }");
        assert_eq!(variables, "");
    }

    #[test]
    fn test_form_field_active() {
        assert!(FormField::text("name", "value").is_active());
        let mut field = FormField::file("upload", "/tmp/data.bin");
        field.disabled = true;
        assert!(!field.is_active());
    }
}
