//! Shared key/value state threaded through a workflow run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workflow::{Binding, DEFAULT_INPUT_KEY, WorkflowSpec};

/// Mutable string-keyed JSON map owned by one workflow execution.
///
/// The executor records every step's output here so later steps can bind to
/// it, and step failures under `error_<index>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    values: Map<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a context from caller input.
    ///
    /// Objects are used as-is; any other value is stored under `input`.
    pub fn from_input(input: Value) -> Self {
        match input {
            Value::Object(values) => Self { values },
            Value::Null => Self::default(),
            other => {
                let mut values = Map::new();
                values.insert(DEFAULT_INPUT_KEY.to_string(), other);
                Self { values }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Key under which the failure of step `index` is recorded.
    pub fn error_key(index: usize) -> String {
        format!("error_{index}")
    }

    /// Record a step failure as `error_<index>`.
    pub fn record_error(&mut self, index: usize, message: impl Into<String>) {
        self.values
            .insert(Self::error_key(index), Value::String(message.into()));
    }

    /// Errors recorded so far, keyed by step index.
    pub fn errors(&self) -> Vec<(usize, &str)> {
        let mut errors: Vec<(usize, &str)> = self
            .values
            .iter()
            .filter_map(|(k, v)| {
                let index = k.strip_prefix("error_")?.parse::<usize>().ok()?;
                Some((index, v.as_str().unwrap_or_default()))
            })
            .collect();
        errors.sort_by_key(|(i, _)| *i);
        errors
    }

    /// Resolve the input value for a step.
    ///
    /// `step_outputs` maps step indices to the context key each earlier step
    /// wrote. Missing keys resolve to `Value::Null` rather than failing, so a
    /// skipped upstream step yields an empty input instead of aborting.
    pub fn resolve_binding(&self, binding: Option<&Binding>, step_outputs: &[String]) -> Value {
        match binding {
            None => self.get(DEFAULT_INPUT_KEY).cloned().unwrap_or(Value::Null),
            Some(Binding::ContextKey { key }) => self.get(key).cloned().unwrap_or(Value::Null),
            Some(Binding::StepOutput {
                source_step_index,
                source_key,
            }) => {
                let Some(value) = step_outputs
                    .get(*source_step_index)
                    .and_then(|key| self.get(key))
                else {
                    return Value::Null;
                };
                match source_key {
                    Some(field) => value.get(field).cloned().unwrap_or(Value::Null),
                    None => value.clone(),
                }
            }
        }
    }

    /// Project the declared workflow outputs, or the whole context if none.
    pub fn outputs_for(&self, workflow: &WorkflowSpec) -> Value {
        if workflow.outputs.is_empty() {
            return Value::Object(self.values.clone());
        }
        let projected: Map<String, Value> = workflow
            .outputs
            .iter()
            .map(|(name, key)| (name.clone(), self.get(key).cloned().unwrap_or(Value::Null)))
            .collect();
        Value::Object(projected)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}
