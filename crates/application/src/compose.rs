//! Extension composer
//!
//! A [`RequestPatch`] is an ordered set of overrides applied to a request
//! before resolution: URL replacement, extra query parameters and headers,
//! body edits and auth parameter overrides. The base request is never
//! mutated; `apply` returns a patched clone.

use serde_json::Value;

use quiver_domain::{ApiKeyLocation, AuthConfig, Body, FormField, Header, RequestSpec};

use crate::error::{EngineError, EngineResult};
use crate::store::VariableStore;

/// An ordered set of request overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestPatch {
    url: Option<String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body_replacements: Vec<(String, String)>,
    body_fields: Vec<(String, String)>,
    auth_params: Vec<(String, String)>,
}

impl RequestPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the request URL with a new raw template.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn add_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets a header, replacing any existing header with the same name
    /// (case-insensitive).
    #[must_use]
    pub fn add_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Replaces every occurrence of a literal substring in a raw or
    /// GraphQL body.
    #[must_use]
    pub fn replace_in_body(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.body_replacements.push((from.into(), to.into()));
        self
    }

    /// Sets a top-level field: a JSON property for raw JSON bodies, a
    /// variables property for GraphQL bodies, or a form field
    /// (substitute-or-append) for form bodies.
    #[must_use]
    pub fn set_body_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body_fields.push((key.into(), value.into()));
        self
    }

    /// Overrides an auth parameter by field name (`token`, `username`,
    /// `password`, `key`, `value`, `in`). Names the current auth scheme
    /// does not use are ignored.
    #[must_use]
    pub fn set_auth_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_params.push((key.into(), value.into()));
        self
    }

    /// Returns true when the patch contains no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.query.is_empty()
            && self.headers.is_empty()
            && self.body_replacements.is_empty()
            && self.body_fields.is_empty()
            && self.auth_params.is_empty()
    }

    /// Applies the patch to a request, resolving every override value
    /// against the store first.
    pub fn apply(
        &self,
        request: &RequestSpec,
        store: &mut VariableStore,
    ) -> EngineResult<RequestSpec> {
        let mut patched = request.clone();

        if let Some(url) = &self.url {
            patched.url = quiver_domain::Url::from_raw(store.resolve(url)?);
        }
        for (key, value) in &self.query {
            patched
                .url
                .add_query(store.resolve(key)?, store.resolve(value)?);
        }

        for (key, value) in &self.headers {
            let key = store.resolve(key)?;
            let value = store.resolve(value)?;
            match patched.headers.iter_mut().find(|h| h.matches_key(&key)) {
                Some(existing) => existing.value = value,
                None => patched.headers.push(Header::new(key, value)),
            }
        }

        self.apply_body(&mut patched, store)?;
        self.apply_auth(&mut patched, store)?;

        Ok(patched)
    }

    fn apply_body(&self, request: &mut RequestSpec, store: &mut VariableStore) -> EngineResult<()> {
        if self.body_replacements.is_empty() && self.body_fields.is_empty() {
            return Ok(());
        }
        let Some(spec) = &mut request.body else {
            return Ok(());
        };

        for (from, to) in &self.body_replacements {
            let to = store.resolve(to)?;
            match &mut spec.body {
                Body::Raw { content } | Body::Binary { content } => {
                    *content = content.replace(from.as_str(), &to);
                }
                Body::GraphQl { query, .. } => {
                    *query = query.replace(from.as_str(), &to);
                }
                Body::UrlEncoded { .. } | Body::FormData { .. } | Body::File { .. } => {}
            }
        }

        for (key, value) in &self.body_fields {
            let key = store.resolve(key)?;
            let value = store.resolve(value)?;
            match &mut spec.body {
                Body::Raw { content } => {
                    set_json_field(content, &key, &value)?;
                }
                Body::GraphQl { variables, .. } => {
                    if variables.trim().is_empty() {
                        *variables = "{}".to_string();
                    }
                    set_json_field(variables, &key, &value)?;
                }
                Body::UrlEncoded { fields } | Body::FormData { fields } => {
                    match fields.iter_mut().find(|f| f.key == key) {
                        Some(field) => field.value = value,
                        None => fields.push(FormField::text(key, value)),
                    }
                }
                Body::File { .. } | Body::Binary { .. } => {}
            }
        }

        Ok(())
    }

    fn apply_auth(&self, request: &mut RequestSpec, store: &mut VariableStore) -> EngineResult<()> {
        if self.auth_params.is_empty() {
            return Ok(());
        }
        let Some(auth) = &mut request.auth else {
            return Ok(());
        };

        for (name, raw) in &self.auth_params {
            let resolved = store.resolve(raw)?;
            match (&mut *auth, name.as_str()) {
                (AuthConfig::Bearer { token }, "token") => *token = resolved,
                (AuthConfig::Basic { username, .. }, "username") => *username = resolved,
                (AuthConfig::Basic { password, .. }, "password") => *password = resolved,
                (AuthConfig::ApiKey { key, .. }, "key") => *key = resolved,
                (AuthConfig::ApiKey { value, .. }, "value") => *value = resolved,
                (AuthConfig::ApiKey { location, .. }, "in") => {
                    *location = match resolved.as_str() {
                        "header" => ApiKeyLocation::Header,
                        "query" => ApiKeyLocation::Query,
                        other => {
                            return Err(EngineError::Preparation(format!(
                                "unknown api key location: {other}"
                            )))
                        }
                    };
                }
                _ => {}
            }
        }

        Ok(())
    }
}

fn set_json_field(content: &mut String, key: &str, value: &str) -> EngineResult<()> {
    let mut root: Value = serde_json::from_str(content)
        .map_err(|e| EngineError::Preparation(format!("body is not valid JSON: {e}")))?;
    let Value::Object(map) = &mut root else {
        return Err(EngineError::Preparation(
            "body is not a JSON object".to_string(),
        ));
    };
    // Values that parse as JSON are injected typed, everything else as a
    // string.
    let parsed = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    map.insert(key.to_string(), parsed);
    *content = serde_json::to_string(&root)
        .map_err(|e| EngineError::Internal(format!("body serialization failed: {e}")))?;
    Ok(())
}
