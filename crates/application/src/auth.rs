//! Auth materializer
//!
//! Turns an [`AuthConfig`] into the concrete header or query parameter it
//! contributes to the outgoing request. All parameters are
//! variable-resolved first, so `{{token}}` works anywhere an auth field
//! does.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use quiver_domain::{ApiKeyLocation, AuthConfig};

use crate::error::{EngineError, EngineResult};
use crate::store::VariableStore;

/// The concrete contribution of an auth scheme to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No auth is applied.
    None,
    /// A header to set.
    Header {
        /// Header name, e.g. `Authorization`.
        name: String,
        /// Header value.
        value: String,
    },
    /// A query parameter to append.
    QueryParam {
        /// Parameter key.
        key: String,
        /// Parameter value.
        value: String,
    },
}

/// Materializes the effective auth for a request.
///
/// The request-level config wins when present; otherwise the inherited
/// config (folder, then collection) applies. A request-level
/// [`AuthConfig::None`] explicitly disables inherited auth.
pub fn materialize(
    request_auth: Option<&AuthConfig>,
    inherited: Option<&AuthConfig>,
    store: &mut VariableStore,
) -> EngineResult<AuthOutcome> {
    let effective = match request_auth {
        Some(config) => config,
        None => match inherited {
            Some(config) => config,
            None => return Ok(AuthOutcome::None),
        },
    };

    match effective {
        AuthConfig::None => Ok(AuthOutcome::None),
        AuthConfig::Bearer { token } => {
            let token = store.resolve(token)?;
            if token.trim().is_empty() {
                return Err(auth_error("bearer", "token is empty"));
            }
            Ok(AuthOutcome::Header {
                name: "Authorization".to_string(),
                value: format!("Bearer {token}"),
            })
        }
        AuthConfig::Basic { username, password } => {
            // Either side may be empty; the pair is encoded as-is.
            let username = store.resolve(username)?;
            let password = store.resolve(password)?;
            let credentials = STANDARD.encode(format!("{username}:{password}"));
            Ok(AuthOutcome::Header {
                name: "Authorization".to_string(),
                value: format!("Basic {credentials}"),
            })
        }
        AuthConfig::ApiKey {
            key,
            value,
            location,
        } => {
            let key = store.resolve(key)?;
            let value = store.resolve(value)?;
            if key.trim().is_empty() {
                return Err(auth_error("apikey", "key is empty"));
            }
            if value.trim().is_empty() {
                return Err(auth_error("apikey", "value is empty"));
            }
            match location {
                ApiKeyLocation::Header => Ok(AuthOutcome::Header { name: key, value }),
                ApiKeyLocation::Query => Ok(AuthOutcome::QueryParam { key, value }),
            }
        }
    }
}

/// Returns the raw (unresolved) parameters of a config, keyed by field
/// name. Used for diagnostics and by the extension composer when patching
/// auth parameters.
#[must_use]
pub fn raw_parameters(config: &AuthConfig) -> HashMap<String, String> {
    let mut params = HashMap::new();
    match config {
        AuthConfig::None => {}
        AuthConfig::Bearer { token } => {
            params.insert("token".to_string(), token.clone());
        }
        AuthConfig::Basic { username, password } => {
            params.insert("username".to_string(), username.clone());
            params.insert("password".to_string(), password.clone());
        }
        AuthConfig::ApiKey {
            key,
            value,
            location,
        } => {
            params.insert("key".to_string(), key.clone());
            params.insert("value".to_string(), value.clone());
            let location = match location {
                ApiKeyLocation::Header => "header",
                ApiKeyLocation::Query => "query",
            };
            params.insert("in".to_string(), location.to_string());
        }
    }
    params
}

fn auth_error(kind: &str, message: &str) -> EngineError {
    EngineError::Auth {
        auth_kind: kind.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quiver_domain::VariableScope;

    #[test]
    fn test_bearer_header() {
        let mut store = VariableStore::new();
        let auth = AuthConfig::bearer("abc123");
        let outcome = materialize(Some(&auth), None, &mut store).unwrap();
        assert_eq!(
            outcome,
            AuthOutcome::Header {
                name: "Authorization".to_string(),
                value: "Bearer abc123".to_string(),
            }
        );
    }

    #[test]
    fn test_bearer_token_resolved_from_store() {
        let mut store = VariableStore::new();
        store.set("token", "secret", VariableScope::Environment);
        let auth = AuthConfig::bearer("{{token}}");
        let outcome = materialize(Some(&auth), None, &mut store).unwrap();
        assert_eq!(
            outcome,
            AuthOutcome::Header {
                name: "Authorization".to_string(),
                value: "Bearer secret".to_string(),
            }
        );
    }

    #[test]
    fn test_bearer_empty_token_fails() {
        let mut store = VariableStore::new();
        let auth = AuthConfig::bearer("  ");
        let err = materialize(Some(&auth), None, &mut store).unwrap_err();
        assert!(matches!(err, EngineError::Auth { ref auth_kind, .. } if auth_kind == "bearer"));
    }

    #[test]
    fn test_basic_encodes_credentials() {
        let mut store = VariableStore::new();
        let auth = AuthConfig::basic("user", "pass");
        let outcome = materialize(Some(&auth), None, &mut store).unwrap();
        // base64("user:pass")
        assert_eq!(
            outcome,
            AuthOutcome::Header {
                name: "Authorization".to_string(),
                value: "Basic dXNlcjpwYXNz".to_string(),
            }
        );
    }

    #[test]
    fn test_basic_allows_empty_username() {
        let mut store = VariableStore::new();
        let auth = AuthConfig::basic("", "pass");
        let outcome = materialize(Some(&auth), None, &mut store).unwrap();
        // base64(":pass")
        assert_eq!(
            outcome,
            AuthOutcome::Header {
                name: "Authorization".to_string(),
                value: "Basic OnBhc3M=".to_string(),
            }
        );
    }

    #[test]
    fn test_api_key_query_location() {
        let mut store = VariableStore::new();
        let auth = AuthConfig::api_key_query("api_key", "xyz");
        let outcome = materialize(Some(&auth), None, &mut store).unwrap();
        assert_eq!(
            outcome,
            AuthOutcome::QueryParam {
                key: "api_key".to_string(),
                value: "xyz".to_string(),
            }
        );
    }

    #[test]
    fn test_inherited_applies_when_request_has_none() {
        let mut store = VariableStore::new();
        let inherited = AuthConfig::bearer("parent");
        let outcome = materialize(None, Some(&inherited), &mut store).unwrap();
        assert!(matches!(outcome, AuthOutcome::Header { .. }));
    }

    #[test]
    fn test_explicit_none_disables_inherited() {
        let mut store = VariableStore::new();
        let inherited = AuthConfig::bearer("parent");
        let outcome = materialize(Some(&AuthConfig::None), Some(&inherited), &mut store).unwrap();
        assert_eq!(outcome, AuthOutcome::None);
    }

    #[test]
    fn test_raw_parameters_api_key() {
        let auth = AuthConfig::api_key_header("X-Api-Key", "{{key}}");
        let params = raw_parameters(&auth);
        assert_eq!(params.get("key").map(String::as_str), Some("X-Api-Key"));
        assert_eq!(params.get("in").map(String::as_str), Some("header"));
    }
}
