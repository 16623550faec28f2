//! Scoped variable store
//!
//! Holds the four variable scopes and resolves `{{name}}` references with
//! request > folder > collection > environment precedence. Resolution is
//! iterative: each pass substitutes every reference in one sweep, and a
//! bounded number of passes catches self-referential chains.

pub mod builtins;
pub mod parser;

use std::collections::HashMap;

use quiver_domain::{Variable, VariableMap, VariableScope};

use crate::error::{EngineError, EngineResult};
use parser::{scan_path_params, scan_references};

/// Maximum number of substitution passes before resolution is declared
/// non-convergent.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// A layered variable store with one map per scope.
///
/// Built-in dynamic variables (`{{$uuid}}` etc.) are generated lazily and
/// cached, so every reference within one store's lifetime sees the same
/// value.
#[derive(Debug, Clone)]
pub struct VariableStore {
    environment: VariableMap,
    collection: VariableMap,
    folder: VariableMap,
    request: VariableMap,
    builtin_cache: HashMap<String, String>,
    max_depth: usize,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self {
            environment: VariableMap::new(),
            collection: VariableMap::new(),
            folder: VariableMap::new(),
            request: VariableMap::new(),
            builtin_cache: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl VariableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the iteration bound used by [`Self::resolve`].
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Creates a store from the four scope maps.
    #[must_use]
    pub fn with_scopes(
        environment: VariableMap,
        collection: VariableMap,
        folder: VariableMap,
        request: VariableMap,
    ) -> Self {
        Self {
            environment,
            collection,
            folder,
            request,
            ..Self::default()
        }
    }

    /// Looks up a variable by name, narrowest scope first.
    ///
    /// Disabled variables are skipped rather than masking a value in a
    /// wider scope. Built-in names (prefixed with `$`) are generated on
    /// first use and cached.
    pub fn get(&mut self, name: &str) -> Option<String> {
        if name.starts_with('$') {
            if let Some(cached) = self.builtin_cache.get(name) {
                return Some(cached.clone());
            }
            let value = builtins::generate(name)?;
            self.builtin_cache.insert(name.to_string(), value.clone());
            return Some(value);
        }

        for scope in VariableScope::PRECEDENCE {
            if let Some(variable) = self.scope_map(scope).get(name) {
                if variable.enabled {
                    return Some(variable.value.clone());
                }
            }
        }
        None
    }

    /// Sets a variable in the given scope, enabled.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>, scope: VariableScope) {
        self.scope_map_mut(scope)
            .insert(name.into(), Variable::new(value));
    }

    /// Returns a reference to the map backing a scope.
    #[must_use]
    pub fn scope_map(&self, scope: VariableScope) -> &VariableMap {
        match scope {
            VariableScope::Environment => &self.environment,
            VariableScope::Collection => &self.collection,
            VariableScope::Folder => &self.folder,
            VariableScope::Request => &self.request,
        }
    }

    fn scope_map_mut(&mut self, scope: VariableScope) -> &mut VariableMap {
        match scope {
            VariableScope::Environment => &mut self.environment,
            VariableScope::Collection => &mut self.collection,
            VariableScope::Folder => &mut self.folder,
            VariableScope::Request => &mut self.request,
        }
    }

    /// Replaces the contents of a scope wholesale.
    ///
    /// The orchestrator uses this to swap the folder and request scopes as
    /// a run moves between items.
    pub fn replace_scope(&mut self, scope: VariableScope, variables: VariableMap) {
        *self.scope_map_mut(scope) = variables;
    }

    /// Resolves all `{{name}}` references in `input` with the configured
    /// iteration bound.
    pub fn resolve(&mut self, input: &str) -> EngineResult<String> {
        self.resolve_with_depth(input, self.max_depth)
    }

    /// Resolves all `{{name}}` references in `input`, allowing at most
    /// `max_depth` substitution passes.
    ///
    /// Substituted values are themselves rescanned on the next pass, so
    /// `a = "{{b}}"` chains converge. A reference with no value in any
    /// scope fails with [`EngineError::UnresolvedVariable`]; a chain still
    /// containing references after `max_depth` passes fails with
    /// [`EngineError::MaxDepthExceeded`].
    pub fn resolve_with_depth(&mut self, input: &str, max_depth: usize) -> EngineResult<String> {
        let mut current = input.to_string();

        for _ in 0..max_depth {
            let references = scan_references(&current);
            if references.is_empty() {
                return Ok(current);
            }

            // Look up in textual order so a failure names the first
            // unresolved reference, then substitute right-to-left so
            // earlier spans stay valid.
            let mut values = Vec::with_capacity(references.len());
            for reference in &references {
                let value =
                    self.get(&reference.name)
                        .ok_or_else(|| EngineError::UnresolvedVariable {
                            name: reference.name.clone(),
                        })?;
                values.push(value);
            }
            for (reference, value) in references.iter().zip(&values).rev() {
                current.replace_range(reference.span.clone(), value);
            }
        }

        if scan_references(&current).is_empty() {
            Ok(current)
        } else {
            Err(EngineError::MaxDepthExceeded {
                depth: max_depth,
                residual: current,
            })
        }
    }

    /// Resolves `:name` path parameters against the store.
    ///
    /// Only identifiers at a path-segment boundary are treated as
    /// parameters; port numbers are left alone.
    pub fn resolve_path_parameters(&mut self, input: &str) -> EngineResult<String> {
        let mut current = input.to_string();
        let references = scan_path_params(&current);

        let mut values = Vec::with_capacity(references.len());
        for reference in &references {
            let value = self
                .get(&reference.name)
                .ok_or_else(|| EngineError::UnresolvedVariable {
                    name: reference.name.clone(),
                })?;
            values.push(value);
        }
        for (reference, value) in references.iter().zip(&values).rev() {
            current.replace_range(reference.span.clone(), value);
        }

        Ok(current)
    }

    /// Resolves references best-effort: unknown names are left in place.
    ///
    /// Scripts use this mode so a log line mentioning an unset variable
    /// does not abort the script.
    pub fn resolve_lenient(&mut self, input: &str) -> String {
        let mut current = input.to_string();

        for _ in 0..DEFAULT_MAX_DEPTH {
            let references = scan_references(&current);
            let mut substituted = false;
            for reference in references.iter().rev() {
                if let Some(value) = self.get(&reference.name) {
                    current.replace_range(reference.span.clone(), &value);
                    substituted = true;
                }
            }
            if !substituted {
                break;
            }
        }

        current
    }

    /// Flattens the scopes into a single map, narrowest scope winning.
    #[must_use]
    pub fn merged(&self) -> HashMap<String, String> {
        let mut merged = HashMap::new();
        // Widest first so narrower scopes overwrite.
        for scope in VariableScope::PRECEDENCE.iter().rev() {
            for (name, variable) in self.scope_map(*scope) {
                if variable.enabled {
                    merged.insert(name.clone(), variable.value.clone());
                }
            }
        }
        merged
    }

    /// Creates an independent store for one request: the environment,
    /// collection and folder scopes are copied, the request scope is taken
    /// from the argument, and the built-in cache starts fresh.
    #[must_use]
    pub fn derive(&self, request: VariableMap) -> Self {
        Self {
            environment: self.environment.clone(),
            collection: self.collection.clone(),
            folder: self.folder.clone(),
            request,
            builtin_cache: HashMap::new(),
            max_depth: self.max_depth,
        }
    }
}
