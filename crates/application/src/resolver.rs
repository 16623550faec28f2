//! Request resolver
//!
//! Takes a [`RequestSpec`] plus a populated [`VariableStore`] and produces
//! a [`PreparedRequest`]: every template resolved, path parameters
//! substituted, auth materialized into its header or query parameter, and
//! the body reduced to a transport-ready form.

use std::collections::HashMap;

use serde_json::Value;

use quiver_domain::{AuthConfig, Body, FormFieldKind, HttpMethod, RequestSpec, Url};

use crate::auth::{materialize, AuthOutcome};
use crate::error::{EngineError, EngineResult};
use crate::store::VariableStore;

/// A fully resolved request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL with path parameters substituted.
    pub url: String,
    /// Resolved headers. Later duplicates (case-insensitive) win.
    pub headers: HashMap<String, String>,
    /// Query parameters to append beyond those already in the URL.
    pub query: Vec<(String, String)>,
    /// The resolved body.
    pub body: PreparedBody,
}

/// A transport-ready body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PreparedBody {
    /// No body.
    #[default]
    None,
    /// Raw text; `json` is set when the content parses as JSON.
    Raw {
        /// The resolved content.
        content: String,
        /// Parsed JSON value when the content is valid JSON.
        json: Option<Value>,
    },
    /// URL-encoded form fields.
    Form {
        /// Resolved key/value pairs.
        fields: Vec<(String, String)>,
    },
    /// Multipart form parts.
    Multipart {
        /// Resolved parts.
        parts: Vec<PreparedPart>,
    },
    /// A GraphQL request body.
    GraphQl {
        /// The resolved query text.
        query: String,
        /// Parsed variables object, when provided.
        variables: Option<Value>,
    },
    /// The body is streamed from a file by the transport.
    File {
        /// Resolved path to the source file.
        path: String,
    },
    /// Opaque payload sent as-is.
    Binary {
        /// The resolved content.
        content: String,
    },
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPart {
    /// Part name.
    pub key: String,
    /// Inline value, or the file path for file parts.
    pub value: String,
    /// Whether `value` is a file path.
    pub is_file: bool,
}

/// Resolves a request against the store and materializes its effective
/// auth.
///
/// `inherited_auth` is the nearest enclosing folder or collection config;
/// it applies only when the request declares no auth of its own.
pub fn resolve_request(
    request: &RequestSpec,
    store: &mut VariableStore,
    inherited_auth: Option<&AuthConfig>,
) -> EngineResult<PreparedRequest> {
    let url = resolve_url(&request.url, store)?;
    let mut headers = resolve_headers(request, store)?;
    let mut query = Vec::new();
    let body = resolve_body(request, store)?;

    match materialize(request.auth.as_ref(), inherited_auth, store)? {
        AuthOutcome::None => {}
        AuthOutcome::Header { name, value } => {
            insert_header(&mut headers, name, value);
        }
        AuthOutcome::QueryParam { key, value } => {
            query.push((key, value));
        }
    }

    Ok(PreparedRequest {
        method: request.method,
        url,
        headers,
        query,
        body,
    })
}

fn resolve_url(url: &Url, store: &mut VariableStore) -> EngineResult<String> {
    if url.is_empty() {
        return Err(EngineError::MissingUrl);
    }

    let mut resolved = if let Some(raw) = url.raw_template() {
        let resolved = store.resolve(raw)?;
        store.resolve_path_parameters(&resolved)?
    } else {
        synthesize_url(url, store)?
    };

    // Structured query parameters are merged into a raw URL when their
    // keys are not already present.
    if url.raw_template().is_some() {
        for param in url.active_query() {
            let key = store.resolve(&param.key)?;
            if query_contains_key(&resolved, &key) {
                continue;
            }
            let value = store.resolve(&param.value)?;
            let separator = if resolved.contains('?') { '&' } else { '?' };
            resolved.push(separator);
            resolved.push_str(&key);
            resolved.push('=');
            resolved.push_str(&value);
        }
    }

    Ok(resolved)
}

fn synthesize_url(url: &Url, store: &mut VariableStore) -> EngineResult<String> {
    let scheme = match &url.scheme {
        Some(scheme) => store.resolve(scheme)?,
        None => "http".to_string(),
    };
    let host = store.resolve(&url.host.join("."))?;

    let mut result = format!("{scheme}://{host}");
    if let Some(port) = url.port {
        result.push(':');
        result.push_str(&port.to_string());
    }

    for segment in &url.path {
        result.push('/');
        if let Some(name) = segment.strip_prefix(':') {
            let value = store
                .get(name)
                .ok_or_else(|| EngineError::UnresolvedVariable {
                    name: name.to_string(),
                })?;
            result.push_str(&value);
        } else {
            result.push_str(&store.resolve(segment)?);
        }
    }

    let mut first = true;
    for param in url.active_query() {
        result.push(if first { '?' } else { '&' });
        first = false;
        result.push_str(&store.resolve(&param.key)?);
        result.push('=');
        result.push_str(&store.resolve(&param.value)?);
    }

    if let Some(hash) = &url.hash {
        result.push('#');
        result.push_str(&store.resolve(hash)?);
    }

    Ok(result)
}

fn query_contains_key(url: &str, key: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(url) {
        return parsed.query_pairs().any(|(k, _)| k == key);
    }
    // Unparseable URLs (e.g. a bare host) fall back to a textual check.
    url.split_once('?')
        .map(|(_, q)| q.split('&').any(|pair| pair.split('=').next() == Some(key)))
        .unwrap_or(false)
}

fn resolve_headers(
    request: &RequestSpec,
    store: &mut VariableStore,
) -> EngineResult<HashMap<String, String>> {
    let mut headers = HashMap::new();
    for header in request.active_headers() {
        let key = store.resolve(&header.key)?;
        let value = store.resolve(&header.value)?;
        insert_header(&mut headers, key, value);
    }
    Ok(headers)
}

// Case-insensitive replacement keeping the incoming casing.
fn insert_header(headers: &mut HashMap<String, String>, key: String, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&key));
    headers.insert(key, value);
}

fn resolve_body(request: &RequestSpec, store: &mut VariableStore) -> EngineResult<PreparedBody> {
    let Some(spec) = &request.body else {
        return Ok(PreparedBody::None);
    };
    if spec.disabled {
        return Ok(PreparedBody::None);
    }

    match &spec.body {
        Body::Raw { content } => {
            let content = store.resolve(content)?;
            // Only object/array literals count as JSON; bare scalars stay
            // plain text.
            let looks_structured =
                matches!(content.trim_start().as_bytes().first().copied(), Some(b'{' | b'['));
            let json = if looks_structured {
                serde_json::from_str(&content).ok()
            } else {
                None
            };
            Ok(PreparedBody::Raw { content, json })
        }
        Body::UrlEncoded { fields } => {
            let mut resolved = Vec::new();
            for field in fields.iter().filter(|f| f.is_active()) {
                resolved.push((store.resolve(&field.key)?, store.resolve(&field.value)?));
            }
            if resolved.is_empty() {
                return Ok(PreparedBody::None);
            }
            Ok(PreparedBody::Form { fields: resolved })
        }
        Body::FormData { fields } => {
            let mut parts = Vec::new();
            for field in fields.iter().filter(|f| f.is_active()) {
                parts.push(PreparedPart {
                    key: store.resolve(&field.key)?,
                    value: store.resolve(&field.value)?,
                    is_file: field.kind == FormFieldKind::File,
                });
            }
            if parts.is_empty() {
                return Ok(PreparedBody::None);
            }
            Ok(PreparedBody::Multipart { parts })
        }
        Body::GraphQl { query, variables } => {
            let query = store.resolve(query)?;
            let variables = if variables.trim().is_empty() {
                None
            } else {
                let resolved = store.resolve(variables)?;
                // Unparseable variables fall back to raw text.
                Some(
                    serde_json::from_str(&resolved)
                        .unwrap_or(Value::String(resolved)),
                )
            };
            Ok(PreparedBody::GraphQl { query, variables })
        }
        Body::File { path } => Ok(PreparedBody::File {
            path: store.resolve(path)?,
        }),
        Body::Binary { content } => Ok(PreparedBody::Binary {
            content: store.resolve(content)?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quiver_domain::{BodySpec, FormField, Header, VariableScope};

    fn store_with(pairs: &[(&str, &str)]) -> VariableStore {
        let mut store = VariableStore::new();
        for (name, value) in pairs {
            store.set(*name, *value, VariableScope::Environment);
        }
        store
    }

    #[test]
    fn test_raw_url_resolved_with_path_params() {
        let mut store = store_with(&[("host", "api.example.com"), ("id", "42")]);
        let request = RequestSpec::get("https://{{host}}/users/:id");
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert_eq!(prepared.url, "https://api.example.com/users/42");
    }

    #[test]
    fn test_missing_url_is_an_error() {
        let mut store = VariableStore::new();
        let request = RequestSpec::new("no url");
        let err = resolve_request(&request, &mut store, None).unwrap_err();
        assert_eq!(err, EngineError::MissingUrl);
    }

    #[test]
    fn test_structured_url_synthesis() {
        let mut store = store_with(&[("version", "v2")]);
        let mut request = RequestSpec::new("structured");
        request.url = Url {
            raw: None,
            scheme: Some("https".to_string()),
            host: vec!["api".to_string(), "example".to_string(), "com".to_string()],
            port: Some(8443),
            path: vec!["{{version}}".to_string(), "users".to_string()],
            query: vec![],
            hash: None,
        };
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert_eq!(prepared.url, "https://api.example.com:8443/v2/users");
    }

    #[test]
    fn test_structured_path_parameter_segment() {
        let mut store = store_with(&[("user_id", "7")]);
        let mut request = RequestSpec::new("path param");
        request.url = Url {
            raw: None,
            scheme: None,
            host: vec!["localhost".to_string()],
            port: None,
            path: vec!["users".to_string(), ":user_id".to_string()],
            query: vec![],
            hash: None,
        };
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert_eq!(prepared.url, "http://localhost/users/7");
    }

    #[test]
    fn test_structured_query_merged_into_raw_url() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::get("https://example.com/search?page=1");
        request.url.add_query("page", "2");
        request.url.add_query("limit", "10");
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        // page already present in the raw URL, limit appended.
        assert_eq!(prepared.url, "https://example.com/search?page=1&limit=10");
    }

    #[test]
    fn test_headers_resolved_and_later_duplicate_wins() {
        let mut store = store_with(&[("type", "application/json")]);
        let mut request = RequestSpec::get("https://example.com");
        request.headers.push(Header::new("content-type", "text/plain"));
        request.headers.push(Header::new("Content-Type", "{{type}}"));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert_eq!(prepared.headers.len(), 1);
        assert_eq!(
            prepared.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_disabled_header_skipped() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::get("https://example.com");
        let mut header = Header::new("X-Debug", "1");
        header.disabled = true;
        request.headers.push(header);
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert!(prepared.headers.is_empty());
    }

    #[test]
    fn test_raw_json_body_detected() {
        let mut store = store_with(&[("name", "ada")]);
        let mut request = RequestSpec::post("https://example.com/users");
        request.body = Some(BodySpec::raw(r#"{"name": "{{name}}"}"#));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        let PreparedBody::Raw { content, json } = prepared.body else {
            unreachable!("Expected raw body");
        };
        assert_eq!(content, r#"{"name": "ada"}"#);
        assert_eq!(json.unwrap()["name"], "ada");
    }

    #[test]
    fn test_declared_body_kept_for_get() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::get("https://example.com");
        request.body = Some(BodySpec::raw("payload"));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert_eq!(
            prepared.body,
            PreparedBody::Raw {
                content: "payload".to_string(),
                json: None,
            }
        );
    }

    #[test]
    fn test_disabled_body_dropped() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::post("https://example.com");
        let mut body = BodySpec::raw("ignored");
        body.disabled = true;
        request.body = Some(body);
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert_eq!(prepared.body, PreparedBody::None);
    }

    #[test]
    fn test_form_fields_resolved() {
        let mut store = store_with(&[("user", "ada")]);
        let mut request = RequestSpec::post("https://example.com/login");
        let mut disabled = FormField::text("debug", "1");
        disabled.disabled = true;
        request.body = Some(BodySpec::url_encoded(vec![
            FormField::text("username", "{{user}}"),
            disabled,
        ]));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert_eq!(
            prepared.body,
            PreparedBody::Form {
                fields: vec![("username".to_string(), "ada".to_string())],
            }
        );
    }

    #[test]
    fn test_multipart_file_part() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::post("https://example.com/upload");
        request.body = Some(BodySpec::form_data(vec![FormField::file(
            "data",
            "/tmp/payload.bin",
        )]));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        let PreparedBody::Multipart { parts } = prepared.body else {
            unreachable!("Expected multipart body");
        };
        assert!(parts[0].is_file);
    }

    #[test]
    fn test_graphql_variables_parsed() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::post("https://example.com/graphql");
        request.body = Some(BodySpec::graphql(
            "query { user(id: $id) { name } }",
            r#"{"id": 1}"#,
        ));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        let PreparedBody::GraphQl { variables, .. } = prepared.body else {
            unreachable!("Expected GraphQL body");
        };
        assert_eq!(variables.unwrap()["id"], 1);
    }

    #[test]
    fn test_graphql_unparseable_variables_kept_as_text() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::post("https://example.com/graphql");
        request.body = Some(BodySpec::graphql("query {}", "not json"));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        let PreparedBody::GraphQl { variables, .. } = prepared.body else {
            unreachable!("Expected GraphQL body");
        };
        assert_eq!(variables, Some(Value::String("not json".to_string())));
    }

    #[test]
    fn test_scalar_raw_body_is_not_json() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::post("https://example.com");
        request.body = Some(BodySpec::raw("42"));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        let PreparedBody::Raw { json, .. } = prepared.body else {
            unreachable!("Expected raw body");
        };
        assert!(json.is_none());
    }

    #[test]
    fn test_auth_header_applied() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::get("https://example.com");
        request.auth = Some(AuthConfig::bearer("tok"));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert_eq!(
            prepared.headers.get("Authorization").map(String::as_str),
            Some("Bearer tok")
        );
    }

    #[test]
    fn test_api_key_query_appended() {
        let mut store = VariableStore::new();
        let mut request = RequestSpec::get("https://example.com");
        request.auth = Some(AuthConfig::api_key_query("api_key", "xyz"));
        let prepared = resolve_request(&request, &mut store, None).unwrap();
        assert_eq!(
            prepared.query,
            vec![("api_key".to_string(), "xyz".to_string())]
        );
    }

    #[test]
    fn test_inherited_auth_used_when_request_silent() {
        let mut store = VariableStore::new();
        let request = RequestSpec::get("https://example.com");
        let inherited = AuthConfig::bearer("parent");
        let prepared = resolve_request(&request, &mut store, Some(&inherited)).unwrap();
        assert_eq!(
            prepared.headers.get("Authorization").map(String::as_str),
            Some("Bearer parent")
        );
    }
}
