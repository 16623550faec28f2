//! Request specification types

mod body;
mod header;
mod method;
mod url;

pub use body::{Body, BodySpec, FormField, FormFieldKind};
pub use header::Header;
pub use method::HttpMethod;
pub use url::{QueryParam, Url};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthConfig;
use crate::scripting::{Event, EventKind};
use crate::variables::VariableMap;

/// A single named HTTP request inside a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Unique identifier
    pub id: Uuid,
    /// Request name
    pub name: String,
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Request URL
    #[serde(default)]
    pub url: Url,
    /// Ordered header entries
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Optional body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodySpec>,
    /// Request-level auth; `None` inherits from the enclosing folder or
    /// collection, `Some(AuthConfig::None)` explicitly disables auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
    /// Ordered pre-request/test events
    #[serde(default)]
    pub events: Vec<Event>,
    /// Request-declared variables (highest precedence scope)
    #[serde(default)]
    pub variables: VariableMap,
}

impl RequestSpec {
    /// Creates a new request with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            method: HttpMethod::default(),
            url: Url::default(),
            headers: Vec::new(),
            body: None,
            auth: None,
            events: Vec::new(),
            variables: VariableMap::new(),
        }
    }

    /// Creates a GET request for the given raw URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        let raw = url.into();
        let mut request = Self::new(raw.clone());
        request.url = Url::from_raw(raw);
        request
    }

    /// Creates a POST request for the given raw URL.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        let mut request = Self::get(url);
        request.method = HttpMethod::Post;
        request
    }

    /// Returns the enabled header entries.
    pub fn active_headers(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter().filter(|h| h.is_active())
    }

    /// Returns the events of the given kind whose scripts should run.
    pub fn runnable_events(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(move |e| e.listen == kind && e.script.should_run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_request_defaults() {
        let request = RequestSpec::new("Get Users");
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.url.is_empty());
        assert!(request.auth.is_none());
    }

    #[test]
    fn test_get_constructor() {
        let request = RequestSpec::get("https://api.example.com/users");
        assert_eq!(
            request.url.raw_template(),
            Some("https://api.example.com/users")
        );
    }

    #[test]
    fn test_runnable_events_filters_kind_and_disabled() {
        let mut request = RequestSpec::new("r");
        request.events.push(Event::pre_request("set(\"a\", \"1\")"));
        request.events.push(Event::test("assertStatus(200)"));
        let mut disabled = Event::test("assertStatus(500)");
        disabled.script.enabled = false;
        request.events.push(disabled);

        assert_eq!(request.runnable_events(EventKind::PreRequest).count(), 1);
        assert_eq!(request.runnable_events(EventKind::Test).count(), 1);
    }
}
