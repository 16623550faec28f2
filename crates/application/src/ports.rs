//! Transport port
//!
//! Abstracts the HTTP client so the engine stays independent of the
//! concrete HTTP library. The infrastructure crate provides the reqwest
//! implementation.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use quiver_domain::ResponseSpec;

use crate::resolver::PreparedRequest;

/// Errors the transport layer can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpClientError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// DNS resolution failed.
    #[error("DNS lookup failed for {host}: {message}")]
    DnsError {
        /// The host that failed to resolve.
        host: String,
        /// Underlying error text.
        message: String,
    },

    /// The remote refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// The target host.
        host: String,
        /// The target port.
        port: u16,
    },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// The configured redirect limit.
        max: usize,
    },

    /// The URL could not be parsed by the transport.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The body could not be built (e.g. an unreadable file part).
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for executing prepared HTTP requests.
pub trait HttpClient: Send + Sync {
    /// Executes a prepared request and returns the captured response.
    fn execute(
        &self,
        request: &PreparedRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + '_>>;
}
