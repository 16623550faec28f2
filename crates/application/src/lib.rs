//! Quiver Application - the execution engine
//!
//! This crate turns collection value objects into live HTTP calls: the
//! scoped variable store, the request resolver, the auth materializer, the
//! extension composer, the script sandbox, and the orchestrator that
//! sequences or parallelizes whole runs. The HTTP transport itself is a
//! port implemented by the infrastructure crate.

pub mod auth;
pub mod compose;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod resolver;
pub mod sandbox;
pub mod store;

pub use auth::{materialize, AuthOutcome};
pub use compose::RequestPatch;
pub use error::{EngineError, EngineResult};
pub use orchestrator::{RunMode, RunOptions, Runner};
pub use ports::{HttpClient, HttpClientError};
pub use resolver::{resolve_request, PreparedBody, PreparedPart, PreparedRequest};
pub use sandbox::{Sandbox, SandboxConfig, ScriptOutcome};
pub use store::VariableStore;
