//! Execution results and aggregates
//!
//! One [`ExecutionResult`] is produced per request execution; folder and
//! collection results are append-only accumulators over these with derived
//! statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::response::ResponseSpec;
use crate::testing::Assertion;

/// The immutable outcome of executing a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Name of the executed request.
    pub request_name: String,
    /// The response, absent when the request failed before or during
    /// transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSpec>,
    /// The failure, absent on success. Failures are always data, never
    /// silent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Assertions captured by pre-request and test scripts.
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    /// Wall-clock time spent on this execution (may be partial on
    /// failure).
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(
        request_name: impl Into<String>,
        response: ResponseSpec,
        assertions: Vec<Assertion>,
        elapsed: Duration,
    ) -> Self {
        Self {
            request_name: request_name.into(),
            response: Some(response),
            error: None,
            assertions,
            elapsed,
        }
    }

    /// Creates a failed result. A response may still be present when the
    /// failure happened after transport (e.g. in a test script).
    #[must_use]
    pub fn failure(
        request_name: impl Into<String>,
        response: Option<ResponseSpec>,
        error: impl Into<String>,
        assertions: Vec<Assertion>,
        elapsed: Duration,
    ) -> Self {
        Self {
            request_name: request_name.into(),
            response,
            error: Some(error.into()),
            assertions,
            elapsed,
        }
    }

    /// True iff no error occurred and a response exists.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none() && self.response.is_some()
    }

    /// Number of passed assertions.
    #[must_use]
    pub fn assertions_passed(&self) -> usize {
        self.assertions.iter().filter(|a| a.passed).count()
    }

    /// Number of failed assertions.
    #[must_use]
    pub fn assertions_failed(&self) -> usize {
        self.assertions.iter().filter(|a| !a.passed).count()
    }
}

/// Derived statistics over a set of execution results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RunStats {
    /// Total number of results.
    pub total: usize,
    /// Results with no error and a response.
    pub success_count: usize,
    /// Results carrying an error.
    pub failure_count: usize,
    /// Assertions that passed across all results.
    pub assertions_passed: usize,
    /// Assertions that failed across all results.
    pub assertions_failed: usize,
    /// Sum of per-result elapsed times.
    pub total_elapsed: Duration,
}

impl RunStats {
    /// Computes statistics over a slice of results.
    #[must_use]
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        let success_count = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            assertions_passed: results.iter().map(ExecutionResult::assertions_passed).sum(),
            assertions_failed: results.iter().map(ExecutionResult::assertions_failed).sum(),
            total_elapsed: results.iter().map(|r| r.elapsed).sum(),
        }
    }

    /// Fraction of successful results in `0.0..=1.0`; `1.0` for an empty
    /// run.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.success_count as f64 / self.total as f64
        }
    }
}

/// Ordered results of executing every request in a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRunResult {
    /// Folder name.
    pub folder_name: String,
    /// Results in execution order.
    pub results: Vec<ExecutionResult>,
}

impl FolderRunResult {
    /// Creates an empty folder result.
    #[must_use]
    pub fn new(folder_name: impl Into<String>) -> Self {
        Self {
            folder_name: folder_name.into(),
            results: Vec::new(),
        }
    }

    /// Appends one execution result. This is the only mutation path.
    pub fn push(&mut self, result: ExecutionResult) {
        self.results.push(result);
    }

    /// Derived statistics.
    #[must_use]
    pub fn stats(&self) -> RunStats {
        RunStats::from_results(&self.results)
    }

    /// True iff every result succeeded.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ExecutionResult::is_success)
    }
}

/// Ordered results of executing every request in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRunResult {
    /// Collection name.
    pub collection_name: String,
    /// Results in execution order.
    pub results: Vec<ExecutionResult>,
}

impl CollectionRunResult {
    /// Creates an empty collection result.
    #[must_use]
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            results: Vec::new(),
        }
    }

    /// Appends one execution result. This is the only mutation path.
    pub fn push(&mut self, result: ExecutionResult) {
        self.results.push(result);
    }

    /// Derived statistics.
    #[must_use]
    pub fn stats(&self) -> RunStats {
        RunStats::from_results(&self.results)
    }

    /// True iff every result succeeded.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ExecutionResult::is_success)
    }
}
