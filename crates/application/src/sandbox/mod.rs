//! Restricted script sandbox
//!
//! Executes the small statement language used by pre-request and test
//! scripts: variable writes, logging and assertions. There is no general
//! scripting runtime; the vocabulary is closed, every statement runs
//! against the shared [`VariableStore`], and test statements can inspect
//! the captured response through `{{$status}}`, `{{$body}}`,
//! `{{$elapsed}}`, `{{$header:Name}}` and `{{$json:$.path}}`
//! placeholders.

pub mod parser;

use std::str::FromStr;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use quiver_domain::{Assertion, ResponseSpec, Script, VariableScope};

use crate::error::EngineError;
use crate::store::{parser::scan_references, VariableStore, DEFAULT_MAX_DEPTH};
use parser::{parse_script, Command};

/// Sandbox execution limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Wall-clock budget for one script.
    pub timeout: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Everything a script produced: assertions, log lines and the fault that
/// stopped it, if any.
///
/// Failed assertions are ordinary data; only runtime faults (bad scope
/// name, parse error, timeout) populate `error`. Assertions recorded
/// before a fault are preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptOutcome {
    /// Assertions in statement order.
    pub assertions: Vec<Assertion>,
    /// Messages from `log(...)` statements.
    pub logs: Vec<String>,
    /// The fault that aborted the script, if any.
    pub error: Option<EngineError>,
}

impl ScriptOutcome {
    /// Returns true when the script ran to completion without a fault.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.error.is_none()
    }
}

/// Executes scripts against a variable store and an optional response.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    /// Creates a sandbox with the given limits.
    #[must_use]
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Runs one script. `response` is `Some` for test scripts and `None`
    /// for pre-request scripts.
    pub fn run(
        &self,
        script: &Script,
        store: &mut VariableStore,
        response: Option<&ResponseSpec>,
    ) -> ScriptOutcome {
        let mut outcome = ScriptOutcome::default();
        if !script.should_run() {
            return outcome;
        }

        let commands = match parse_script(&script.content) {
            Ok(commands) => commands,
            Err(err) => {
                outcome.error = Some(EngineError::Script(err.to_string()));
                return outcome;
            }
        };

        let started = Instant::now();
        for command in commands {
            if started.elapsed() > self.config.timeout {
                outcome.error = Some(self.timeout_fault());
                return outcome;
            }
            if let Err(fault) = execute(&command, store, response, &mut outcome) {
                outcome.error = Some(fault);
                return outcome;
            }
        }
        // The budget covers the whole script, so a single overrunning
        // statement is still flagged.
        if started.elapsed() > self.config.timeout {
            outcome.error = Some(self.timeout_fault());
        }

        outcome
    }

    fn timeout_fault(&self) -> EngineError {
        EngineError::ScriptTimeout {
            limit_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

fn execute(
    command: &Command,
    store: &mut VariableStore,
    response: Option<&ResponseSpec>,
    outcome: &mut ScriptOutcome,
) -> Result<(), EngineError> {
    match command {
        Command::SetVariable { name, value, scope } => {
            let scope = match scope {
                Some(raw) => VariableScope::from_str(raw)
                    .map_err(|e| EngineError::Script(e.to_string()))?,
                None => VariableScope::Collection,
            };
            let value = interpolate(store, response, value);
            debug!(variable = %name, scope = %scope, "script set");
            store.set(name.clone(), value, scope);
        }
        Command::Log { message } => {
            let message = interpolate(store, response, message);
            debug!(script_log = %message);
            outcome.logs.push(message);
        }
        Command::Test { name, condition } => {
            let resolved = interpolate(store, response, condition);
            let assertion = if evaluate_condition(&resolved) {
                Assertion::pass(name.clone())
            } else {
                Assertion::fail(name.clone(), format!("condition failed: {resolved}"))
            };
            outcome.assertions.push(assertion);
        }
        Command::AssertEqual { left, right } => {
            let left_value = interpolate(store, response, left);
            let right_value = interpolate(store, response, right);
            let name = format!("{left} equals {right}");
            let assertion = if values_equal(&left_value, &right_value) {
                Assertion::pass(name)
            } else {
                Assertion::fail(name, format!("expected {right_value:?}, got {left_value:?}"))
            };
            outcome.assertions.push(assertion);
        }
        Command::AssertTrue { value } => {
            let resolved = interpolate(store, response, value);
            let name = format!("{value} is truthy");
            let assertion = if is_truthy(&resolved) {
                Assertion::pass(name)
            } else {
                Assertion::fail(name, format!("value was {resolved:?}"))
            };
            outcome.assertions.push(assertion);
        }
        Command::AssertFalse { value } => {
            let resolved = interpolate(store, response, value);
            let name = format!("{value} is falsy");
            let assertion = if is_truthy(&resolved) {
                Assertion::fail(name, format!("value was {resolved:?}"))
            } else {
                Assertion::pass(name)
            };
            outcome.assertions.push(assertion);
        }
        Command::AssertStatus { expected } => {
            let name = format!("status is {expected}");
            let assertion = match response {
                Some(response) if response.status == *expected => Assertion::pass(name),
                Some(response) => {
                    Assertion::fail(name, format!("got {}", response.status))
                }
                None => Assertion::fail(name, "no response available"),
            };
            outcome.assertions.push(assertion);
        }
    }
    Ok(())
}

/// Best-effort interpolation: store variables, built-ins and response
/// placeholders. Unknown references are left in place so a log line
/// mentioning an unset variable does not abort the script.
fn interpolate(store: &mut VariableStore, response: Option<&ResponseSpec>, input: &str) -> String {
    let mut current = input.to_string();

    for _ in 0..DEFAULT_MAX_DEPTH {
        let references = scan_references(&current);
        let mut substituted = false;
        for reference in references.iter().rev() {
            let value = response
                .and_then(|r| response_placeholder(r, &reference.name))
                .or_else(|| store.get(&reference.name));
            if let Some(value) = value {
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

fn response_placeholder(response: &ResponseSpec, name: &str) -> Option<String> {
    match name {
        "$status" => Some(response.status.to_string()),
        "$body" => Some(response.body.clone()),
        "$elapsed" => Some(response.elapsed_ms().to_string()),
        _ => {
            if let Some(header) = name.strip_prefix("$header:") {
                return Some(response.get_header(header).cloned().unwrap_or_default());
            }
            if let Some(path) = name.strip_prefix("$json:") {
                let root = response.json()?;
                return Some(render_json(json_lookup(&root, path)?));
            }
            None
        }
    }
}

fn render_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Looks up a dotted path like `$.items[0].name` in a JSON value.
fn json_lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix('$').unwrap_or(path);
    let mut current = root;

    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let (name, indices) = split_indices(segment)?;
        if !name.is_empty() {
            current = current.get(name)?;
        }
        for index in indices {
            current = current.get(index)?;
        }
    }

    Some(current)
}

fn split_indices(segment: &str) -> Option<(&str, Vec<usize>)> {
    let Some(bracket) = segment.find('[') else {
        return Some((segment, Vec::new()));
    };
    let name = &segment[..bracket];
    let mut indices = Vec::new();
    for part in segment[bracket..].split('[').filter(|s| !s.is_empty()) {
        let index = part.strip_suffix(']')?.parse().ok()?;
        indices.push(index);
    }
    Some((name, indices))
}

fn evaluate_condition(condition: &str) -> bool {
    if let Some((left, right)) = condition.split_once(" matches ") {
        let left = unquote(left);
        return regex::Regex::new(unquote(right))
            .map(|re| re.is_match(left))
            .unwrap_or(false);
    }

    // Two-char operators first so ">=" is not read as ">".
    for op in ["==", "!=", ">=", "<=", ">", "<"] {
        if let Some((left, right)) = condition.split_once(op) {
            let left = unquote(left);
            let right = unquote(right);
            return match op {
                "==" => values_equal(left, right),
                "!=" => !values_equal(left, right),
                _ => compare_ordered(left, right, op),
            };
        }
    }

    is_truthy(condition.trim())
}

fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
}

fn values_equal(left: &str, right: &str) -> bool {
    if let (Ok(l), Ok(r)) = (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        return (l - r).abs() < f64::EPSILON;
    }
    left == right
}

fn compare_ordered(left: &str, right: &str, op: &str) -> bool {
    let ordering = match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r),
        _ => Some(left.cmp(right)),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        ">=" => ordering.is_ge(),
        "<=" => ordering.is_le(),
        ">" => ordering.is_gt(),
        "<" => ordering.is_lt(),
        _ => false,
    }
}

fn is_truthy(value: &str) -> bool {
    // A reference that survived interpolation means the variable is not
    // set, so `test("has token", {{token}})` doubles as an existence
    // check.
    if value.starts_with("{{") && value.ends_with("}}") {
        return false;
    }
    !matches!(value, "" | "false" | "0" | "null" | "undefined")
}
