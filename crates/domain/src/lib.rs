//! Quiver Domain - Core value objects
//!
//! This crate defines the domain model for the Quiver collection runner:
//! the collection/folder/request tree, request components (URL, headers,
//! body, auth, scripts), responses, and execution results. All types here
//! are pure Rust with no I/O dependencies.

pub mod auth;
pub mod collection;
pub mod error;
pub mod execution;
pub mod request;
pub mod response;
pub mod scripting;
pub mod testing;
pub mod variables;

pub use auth::{ApiKeyLocation, AuthConfig};
pub use collection::{Collection, CollectionItem, Folder};
pub use error::{DomainError, DomainResult};
pub use execution::{CollectionRunResult, ExecutionResult, FolderRunResult, RunStats};
pub use request::{
    Body, BodySpec, FormField, FormFieldKind, Header, HttpMethod, QueryParam, RequestSpec, Url,
};
pub use response::ResponseSpec;
pub use scripting::{Event, EventKind, Script};
pub use testing::Assertion;
pub use variables::{Variable, VariableMap, VariableScope};
