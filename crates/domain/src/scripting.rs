//! Pre-request and test script value objects.

use serde::{Deserialize, Serialize};

/// A script attached to a request, folder, or collection event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Script {
    /// The script source text.
    pub content: String,
    /// Whether the script is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for Script {
    fn default() -> Self {
        Self {
            content: String::new(),
            enabled: true,
        }
    }
}

impl Script {
    /// Creates a new script with content.
    #[must_use]
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            enabled: true,
        }
    }

    /// Checks if the script has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Checks if the script should run.
    #[must_use]
    pub fn should_run(&self) -> bool {
        self.enabled && !self.is_empty()
    }
}

/// When an event's script runs relative to the transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Runs before the request is prepared and sent.
    #[serde(rename = "prerequest")]
    PreRequest,
    /// Runs after a response exists.
    Test,
}

/// A tagged script entry on a collection, folder, or request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// When the script runs.
    pub listen: EventKind,
    /// The script to run.
    pub script: Script,
}

impl Event {
    /// Creates a pre-request event.
    #[must_use]
    pub fn pre_request(content: impl Into<String>) -> Self {
        Self {
            listen: EventKind::PreRequest,
            script: Script::with_content(content),
        }
    }

    /// Creates a test event.
    #[must_use]
    pub fn test(content: impl Into<String>) -> Self {
        Self {
            listen: EventKind::Test,
            script: Script::with_content(content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_empty() {
        let script = Script::default();
        assert!(script.is_empty());
        assert!(!script.should_run());
    }

    #[test]
    fn test_script_disabled() {
        let mut script = Script::with_content("log(\"hello\")");
        script.enabled = false;
        assert!(!script.should_run());
    }

    #[test]
    fn test_event_kind_serde() {
        let event = Event::pre_request("set(\"a\", \"1\")");
        let json = serde_json::to_string(&event).expect("serializes");
        assert!(json.contains("\"prerequest\""));
        let back: Event = serde_json::from_str(&json).expect("round trips");
        assert_eq!(back.listen, EventKind::PreRequest);
    }
}
