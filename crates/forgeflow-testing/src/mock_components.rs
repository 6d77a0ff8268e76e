//! # Mock Components for Testing
//!
//! Components with predictable behaviour and inspectable call history.

use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use forgeflow_core::{Component, ComponentError, ComponentKind, ComponentRecord};

use crate::fixtures::Registration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A component that returns a canned value, or its input when none is set.
///
/// Clones share call history, so a test can keep one handle while the
/// registry owns another.
#[derive(Debug, Clone)]
pub struct MockComponent {
    name: String,
    kind: ComponentKind,
    response: Option<Value>,
    call_history: Arc<Mutex<Vec<Value>>>,
}

impl MockComponent {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            response: None,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A tool that returns its input unchanged.
    pub fn echo(name: impl Into<String>) -> Self {
        Self::new(name, ComponentKind::Tool)
    }

    /// A tool that always returns `response`.
    pub fn returning(name: impl Into<String>, response: Value) -> Self {
        Self::echo(name).with_response(response)
    }

    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Number of times `run` was called
    pub fn call_count(&self) -> usize {
        lock(&self.call_history).len()
    }

    /// Inputs received, in call order
    pub fn call_history(&self) -> Vec<Value> {
        lock(&self.call_history).clone()
    }

    pub fn was_called_with(&self, input: &Value) -> bool {
        lock(&self.call_history).contains(input)
    }

    pub fn reset(&self) {
        lock(&self.call_history).clear();
    }

    /// Record with a `mock.<name>` implementation reference.
    pub fn record(&self) -> ComponentRecord {
        mock_record(&self.name, self.kind)
    }

    pub fn into_registration(self) -> Registration {
        Registration::new(self.record(), Arc::new(self))
    }
}

impl Component for MockComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ComponentKind {
        self.kind
    }

    fn description(&self) -> &str {
        "mock component"
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        lock(&self.call_history).push(input.clone());
        Ok(self.response.clone().unwrap_or(input))
    }
}

/// A component whose `run` always fails.
#[derive(Debug, Clone)]
pub struct FailingComponent {
    name: String,
    kind: ComponentKind,
    message: String,
}

impl FailingComponent {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ComponentKind::Tool,
            message: message.into(),
        }
    }

    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn record(&self) -> ComponentRecord {
        mock_record(&self.name, self.kind)
    }

    pub fn into_registration(self) -> Registration {
        Registration::new(self.record(), Arc::new(self))
    }
}

impl Component for FailingComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ComponentKind {
        self.kind
    }

    fn run(&self, _input: Value) -> Result<Value, ComponentError> {
        Err(ComponentError::execution_failed(&self.name, &self.message))
    }
}

/// A component that blocks its thread for `delay` before echoing.
#[derive(Debug, Clone)]
pub struct SlowComponent {
    name: String,
    delay: Duration,
}

impl SlowComponent {
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }

    pub fn record(&self) -> ComponentRecord {
        mock_record(&self.name, ComponentKind::Tool)
    }

    pub fn into_registration(self) -> Registration {
        Registration::new(self.record(), Arc::new(self))
    }
}

impl Component for SlowComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Tool
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        std::thread::sleep(self.delay);
        Ok(input)
    }
}

fn mock_record(name: &str, kind: ComponentKind) -> ComponentRecord {
    ComponentRecord::new(name, kind, format!("mock.{name}"))
        .with_description(format!("mock {kind} {name}"))
        .with_tag("mock")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_tracks_calls_across_clones() {
        let mock = MockComponent::returning("Upper", json!("UP"));
        let shared = mock.clone();

        assert_eq!(shared.run(json!("a")).unwrap(), json!("UP"));
        assert_eq!(shared.run(json!("b")).unwrap(), json!("UP"));

        assert_eq!(mock.call_count(), 2);
        assert!(mock.was_called_with(&json!("b")));
        mock.reset();
        assert_eq!(shared.call_count(), 0);
    }

    #[test]
    fn test_failing_component() {
        let failing = FailingComponent::new("Boom", "kaboom");
        let err = failing.run(json!(null)).unwrap_err();
        assert_eq!(err.component_name(), "Boom");
        assert!(err.to_string().contains("kaboom"));
    }

    #[test]
    fn test_records_validate_for_each_kind() {
        for kind in ComponentKind::all() {
            let mock = MockComponent::echo("Thing").with_kind(*kind);
            assert!(mock.record().validate().is_ok());
        }
    }
}
