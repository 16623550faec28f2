//! Quiver Infrastructure - transport adapters
//!
//! Implements the application layer's [`HttpClient`] port on top of
//! reqwest.
//!
//! [`HttpClient`]: quiver_application::HttpClient

pub mod http;

pub use http::{ClientConfig, ReqwestHttpClient};
