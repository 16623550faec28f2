//! Run orchestrator
//!
//! Drives whole-collection, single-folder and single-request runs through
//! the per-request pipeline: pre-request scripts, patching and resolution,
//! transport, test scripts, result. Any pipeline error becomes a failed
//! [`ExecutionResult`]; the run itself only errors when the named folder
//! or request does not exist.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, warn};

use quiver_domain::{
    AuthConfig, Collection, CollectionItem, CollectionRunResult, EventKind, ExecutionResult,
    Folder, FolderRunResult, RequestSpec, Script, VariableMap,
};

use crate::compose::RequestPatch;
use crate::error::{EngineError, EngineResult};
use crate::ports::HttpClient;
use crate::resolver::resolve_request;
use crate::sandbox::{Sandbox, SandboxConfig, ScriptOutcome};
use crate::store::{VariableStore, DEFAULT_MAX_DEPTH};

/// How requests within a run are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// One request at a time, in declaration order. Collection and
    /// environment variable writes propagate to later requests.
    #[default]
    Sequential,
    /// All requests at once, each against an isolated snapshot of the
    /// store. Results keep declaration order.
    Parallel,
}

/// Options controlling a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Scheduling mode.
    pub mode: RunMode,
    /// Stop after the first failed request. The failing result is still
    /// included.
    pub stop_on_error: bool,
    /// Pause between consecutive requests (sequential mode only).
    pub delay: Option<Duration>,
    /// Wall-clock budget per script.
    pub script_timeout: Duration,
    /// Iteration bound for variable resolution.
    pub max_resolve_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Sequential,
            stop_on_error: false,
            delay: None,
            script_timeout: Duration::from_secs(5),
            max_resolve_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One request in a run plan, with the folder chain that leads to it.
struct PlanEntry<'a> {
    request: &'a RequestSpec,
    folders: Vec<&'a Folder>,
}

/// Executes collections, folders and single requests against an
/// [`HttpClient`].
pub struct Runner<C: HttpClient> {
    client: Arc<C>,
    options: RunOptions,
}

impl<C: HttpClient> Runner<C> {
    /// Creates a runner with default options.
    #[must_use]
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            options: RunOptions::default(),
        }
    }

    /// Creates a runner with explicit options.
    #[must_use]
    pub fn with_options(client: Arc<C>, options: RunOptions) -> Self {
        Self { client, options }
    }

    /// Runs every request in the collection, depth-first in declaration
    /// order.
    pub async fn run_collection(
        &self,
        collection: &Collection,
        environment: VariableMap,
    ) -> CollectionRunResult {
        info!(collection = %collection.name, requests = collection.request_count(), "starting collection run");
        let mut store = self.base_store(collection, environment);
        let mut plan = Vec::new();
        plan_items(&collection.items, &[], &mut plan);

        let mut run = CollectionRunResult::new(collection.name.clone());
        for result in self.run_plan(collection, &plan, &mut store).await {
            run.push(result);
        }
        info!(collection = %collection.name, total = run.results.len(), passed = run.all_passed(), "collection run finished");
        run
    }

    /// Runs every request under the named folder.
    ///
    /// Fails with [`EngineError::NotFound`] when no folder has that name.
    pub async fn run_folder(
        &self,
        collection: &Collection,
        folder_name: &str,
        environment: VariableMap,
    ) -> EngineResult<FolderRunResult> {
        let folder = collection
            .find_folder(folder_name)
            .ok_or_else(|| EngineError::NotFound(format!("folder: {folder_name}")))?;

        info!(folder = %folder.name, "starting folder run");
        let mut store = self.base_store(collection, environment);
        let mut plan = Vec::new();
        plan_items(&folder.items, &[folder], &mut plan);

        let mut run = FolderRunResult::new(folder.name.clone());
        for result in self.run_plan(collection, &plan, &mut store).await {
            run.push(result);
        }
        Ok(run)
    }

    /// Runs one request by name, optionally patched.
    ///
    /// Fails with [`EngineError::NotFound`] when no request has that name.
    pub async fn run_single(
        &self,
        collection: &Collection,
        request_name: &str,
        environment: VariableMap,
        patch: Option<&RequestPatch>,
    ) -> EngineResult<ExecutionResult> {
        let mut plan = Vec::new();
        plan_items(&collection.items, &[], &mut plan);
        let entry = plan
            .into_iter()
            .find(|e| e.request.name == request_name)
            .ok_or_else(|| EngineError::NotFound(format!("request: {request_name}")))?;

        let mut store = self.base_store(collection, environment);
        store.replace_scope(
            quiver_domain::VariableScope::Folder,
            folder_scope(&entry.folders),
        );
        store.replace_scope(
            quiver_domain::VariableScope::Request,
            entry.request.variables.clone(),
        );
        Ok(self
            .execute_request(collection, &entry, &mut store, patch)
            .await)
    }

    fn base_store(&self, collection: &Collection, environment: VariableMap) -> VariableStore {
        let mut store = VariableStore::with_scopes(
            environment,
            collection.variables.clone(),
            VariableMap::new(),
            VariableMap::new(),
        );
        store.set_max_depth(self.options.max_resolve_depth);
        store
    }

    async fn run_plan(
        &self,
        collection: &Collection,
        plan: &[PlanEntry<'_>],
        store: &mut VariableStore,
    ) -> Vec<ExecutionResult> {
        match self.options.mode {
            RunMode::Sequential => self.run_sequential(collection, plan, store).await,
            RunMode::Parallel => self.run_parallel(collection, plan, store).await,
        }
    }

    async fn run_sequential(
        &self,
        collection: &Collection,
        plan: &[PlanEntry<'_>],
        store: &mut VariableStore,
    ) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(plan.len());

        for (index, entry) in plan.iter().enumerate() {
            if index > 0 {
                if let Some(delay) = self.options.delay {
                    tokio::time::sleep(delay).await;
                }
            }

            store.replace_scope(
                quiver_domain::VariableScope::Folder,
                folder_scope(&entry.folders),
            );
            store.replace_scope(
                quiver_domain::VariableScope::Request,
                entry.request.variables.clone(),
            );

            let result = self.execute_request(collection, entry, store, None).await;
            let failed = !result.is_success();
            results.push(result);

            if failed && self.options.stop_on_error {
                warn!(request = %entry.request.name, "stopping run after failure");
                break;
            }
        }

        results
    }

    async fn run_parallel(
        &self,
        collection: &Collection,
        plan: &[PlanEntry<'_>],
        store: &mut VariableStore,
    ) -> Vec<ExecutionResult> {
        let futures: Vec<_> = plan
            .iter()
            .map(|entry| {
                // Each request gets an isolated snapshot; sibling writes do
                // not interleave.
                let mut snapshot = store.derive(entry.request.variables.clone());
                snapshot.replace_scope(
                    quiver_domain::VariableScope::Folder,
                    folder_scope(&entry.folders),
                );
                async move {
                    self.execute_request(collection, entry, &mut snapshot, None)
                        .await
                }
            })
            .collect();

        let mut results = Vec::with_capacity(plan.len());
        for result in join_all(futures).await {
            let failed = !result.is_success();
            results.push(result);
            if failed && self.options.stop_on_error {
                break;
            }
        }
        results
    }

    /// The five-step pipeline for one request. Every error short-circuits
    /// into a failed result carrying the assertions gathered so far.
    async fn execute_request(
        &self,
        collection: &Collection,
        entry: &PlanEntry<'_>,
        store: &mut VariableStore,
        patch: Option<&RequestPatch>,
    ) -> ExecutionResult {
        let request = entry.request;
        let started = Instant::now();
        let sandbox = Sandbox::new(SandboxConfig {
            timeout: self.options.script_timeout,
        });
        let mut assertions = Vec::new();
        debug!(request = %request.name, "executing request");

        // Step 1: pre-request scripts, outermost first.
        for script in pre_request_scripts(collection, entry) {
            let outcome = sandbox.run(script, store, None);
            if let Some(error) = absorb(outcome, &mut assertions) {
                return ExecutionResult::failure(
                    &request.name,
                    None,
                    error.to_string(),
                    assertions,
                    started.elapsed(),
                );
            }
        }

        // Step 2: patch, resolve and materialize auth.
        let patched;
        let request_ref = match patch {
            Some(patch) if !patch.is_empty() => match patch.apply(request, store) {
                Ok(result) => {
                    patched = result;
                    &patched
                }
                Err(error) => {
                    return ExecutionResult::failure(
                        &request.name,
                        None,
                        error.to_string(),
                        assertions,
                        started.elapsed(),
                    )
                }
            },
            _ => request,
        };
        let inherited_auth = inherited_auth(collection, entry);
        let prepared = match resolve_request(request_ref, store, inherited_auth) {
            Ok(prepared) => prepared,
            Err(error) => {
                return ExecutionResult::failure(
                    &request.name,
                    None,
                    error.to_string(),
                    assertions,
                    started.elapsed(),
                )
            }
        };

        // Step 3: transport.
        let response = match self.client.execute(&prepared).await {
            Ok(response) => response,
            Err(error) => {
                return ExecutionResult::failure(
                    &request.name,
                    None,
                    EngineError::Transport(error).to_string(),
                    assertions,
                    started.elapsed(),
                )
            }
        };
        debug!(request = %request.name, status = response.status, elapsed_ms = response.elapsed_ms(), "response received");

        // Step 4: the request's test scripts, with the response bound.
        for script in test_scripts(entry) {
            let outcome = sandbox.run(script, store, Some(&response));
            if let Some(error) = absorb(outcome, &mut assertions) {
                return ExecutionResult::failure(
                    &request.name,
                    Some(response),
                    error.to_string(),
                    assertions,
                    started.elapsed(),
                );
            }
        }

        // Step 5: success.
        ExecutionResult::success(&request.name, response, assertions, started.elapsed())
    }
}

/// Moves a script outcome's assertions into the accumulator and returns
/// the fault, if any.
fn absorb(outcome: ScriptOutcome, assertions: &mut Vec<quiver_domain::Assertion>) -> Option<EngineError> {
    assertions.extend(outcome.assertions);
    outcome.error
}

fn plan_items<'a>(
    items: &'a [CollectionItem],
    chain: &[&'a Folder],
    plan: &mut Vec<PlanEntry<'a>>,
) {
    for item in items {
        match item {
            CollectionItem::Request(request) => plan.push(PlanEntry {
                request,
                folders: chain.to_vec(),
            }),
            CollectionItem::Folder(folder) => {
                let mut nested = chain.to_vec();
                nested.push(folder);
                plan_items(&folder.items, &nested, plan);
            }
        }
    }
}

/// Merges the folder chain's variables, innermost folder winning.
fn folder_scope(folders: &[&Folder]) -> VariableMap {
    let mut merged = VariableMap::new();
    for folder in folders {
        merged.extend(folder.variables.clone());
    }
    merged
}

/// The auth config a request without its own falls back to: nearest
/// enclosing folder first, then the collection.
fn inherited_auth<'a>(collection: &'a Collection, entry: &PlanEntry<'a>) -> Option<&'a AuthConfig> {
    entry
        .folders
        .iter()
        .rev()
        .find_map(|folder| folder.auth.as_ref())
        .or(collection.auth.as_ref())
}

/// Pre-request scripts run outermost first: collection, then each folder
/// down the chain, then the request itself.
fn pre_request_scripts<'a>(collection: &'a Collection, entry: &PlanEntry<'a>) -> Vec<&'a Script> {
    let kind = EventKind::PreRequest;
    let mut scripts: Vec<&Script> = collection
        .runnable_events(kind)
        .map(|event| &event.script)
        .collect();
    for folder in &entry.folders {
        scripts.extend(
            folder
                .events
                .iter()
                .filter(|event| event.listen == kind && event.script.should_run())
                .map(|event| &event.script),
        );
    }
    scripts.extend(
        entry
            .request
            .runnable_events(kind)
            .map(|event| &event.script),
    );
    scripts
}

/// Test scripts belong to the request alone; collection- and folder-level
/// events only contribute pre-request scripts.
fn test_scripts<'a>(entry: &PlanEntry<'a>) -> Vec<&'a Script> {
    entry
        .request
        .runnable_events(EventKind::Test)
        .map(|event| &event.script)
        .collect()
}
