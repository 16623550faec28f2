//! Engine error taxonomy
//!
//! Every variant raised while preparing or executing a single request is
//! caught at the orchestrator boundary and converted into
//! `ExecutionResult::error`; only configuration errors surface to callers
//! directly.

use thiserror::Error;

use quiver_domain::DomainError;

use crate::ports::HttpClientError;

/// Errors produced by the execution engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A `{{name}}` or `:name` reference had no value in any scope.
    #[error("unresolved variable: {name}")]
    UnresolvedVariable {
        /// The first unresolved reference.
        name: String,
    },

    /// Resolution did not converge within the iteration bound; this is how
    /// self-referential chains are detected.
    #[error("variable resolution exceeded max depth {depth}; residual text: {residual}")]
    MaxDepthExceeded {
        /// The configured iteration bound.
        depth: usize,
        /// The text still containing references when the bound tripped.
        residual: String,
    },

    /// Authentication could not be materialized.
    #[error("{auth_kind} auth error: {message}")]
    Auth {
        /// The auth kind ("bearer", "basic", "apikey").
        auth_kind: String,
        /// What went wrong, naming the offending parameter.
        message: String,
    },

    /// The request has neither a raw URL template nor structured host
    /// components.
    #[error("request has no URL")]
    MissingUrl,

    /// The request could not be turned into a transport-ready form.
    #[error("request preparation failed: {0}")]
    Preparation(String),

    /// The HTTP layer reported a failure.
    #[error("transport error: {0}")]
    Transport(#[from] HttpClientError),

    /// A script raised a runtime fault.
    #[error("script error: {0}")]
    Script(String),

    /// A script exceeded its wall-clock time budget.
    #[error("script exceeded timeout of {limit_ms}ms")]
    ScriptTimeout {
        /// The configured limit in milliseconds.
        limit_ms: u64,
    },

    /// A named item was not found in the collection.
    #[error("not found: {0}")]
    NotFound(String),

    /// A domain validation error.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Catch-all for anything unanticipated.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_scope_converts() {
        let err: EngineError = DomainError::InvalidScope("global".to_string()).into();
        assert!(matches!(err, EngineError::Domain(_)));
        assert_eq!(err.to_string(), "invalid variable scope: global");
    }

    #[test]
    fn test_max_depth_message_includes_residual() {
        let err = EngineError::MaxDepthExceeded {
            depth: 10,
            residual: "{{a}}".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("10"));
        assert!(message.contains("{{a}}"));
    }
}
