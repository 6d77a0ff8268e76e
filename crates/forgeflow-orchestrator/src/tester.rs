//! Runs input/expected cases against a registered component.
//!
//! The resulting [`TestReport`] converts into the [`TestResults`] the
//! evaluator accepts.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use forgeflow_core::{RegistryResult, TestResults};
use forgeflow_registry::Registry;

/// One input and the output it should produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    pub expected: Value,
}

impl TestCase {
    pub fn new(input: Value, expected: Value) -> Self {
        Self { input, expected }
    }
}

impl Default for TestCase {
    /// The echo case used when a caller supplies none.
    fn default() -> Self {
        Self::new(json!("test input"), json!("test input"))
    }
}

/// Outcome of one case, numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub test_case: usize,
    pub input: Value,
    pub expected: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaseResult {
    fn failure_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        Some(match (&self.error, &self.actual) {
            (Some(error), _) => format!("Test case {} failed: {error}", self.test_case),
            (None, Some(actual)) => format!(
                "Test case {}: expected {}, got {actual}",
                self.test_case, self.expected
            ),
            (None, None) => format!("Test case {} produced no output", self.test_case),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub component: String,
    /// True only when every case passed.
    pub success: bool,
    pub success_rate: f64,
    pub passed: usize,
    pub total: usize,
    pub results: Vec<CaseResult>,
}

impl TestReport {
    /// Summary in the shape the evaluator consumes.
    pub fn to_test_results(&self) -> TestResults {
        let failures: Vec<String> = self
            .results
            .iter()
            .filter_map(CaseResult::failure_message)
            .collect();
        if failures.is_empty() {
            TestResults::passing(self.total)
        } else {
            TestResults::failing(self.total, failures)
        }
    }
}

/// Run `cases` against the component registered as `name`.
///
/// An empty case list runs the single default echo case.
///
/// # Errors
///
/// Returns the registry error when `name` does not resolve.
pub fn test_component(
    registry: &Registry,
    name: &str,
    cases: &[TestCase],
) -> RegistryResult<TestReport> {
    let component = registry.try_resolve(name)?;
    let default_cases = [TestCase::default()];
    let cases = if cases.is_empty() { &default_cases[..] } else { cases };

    let results: Vec<CaseResult> = cases
        .iter()
        .enumerate()
        .map(|(i, case)| match component.run(case.input.clone()) {
            Ok(actual) => CaseResult {
                test_case: i + 1,
                input: case.input.clone(),
                expected: case.expected.clone(),
                success: actual == case.expected,
                actual: Some(actual),
                error: None,
            },
            Err(e) => CaseResult {
                test_case: i + 1,
                input: case.input.clone(),
                expected: case.expected.clone(),
                actual: None,
                success: false,
                error: Some(e.to_string()),
            },
        })
        .collect();

    let total = results.len();
    let passed = results.iter().filter(|r| r.success).count();
    let success_rate = passed as f64 / total as f64;

    tracing::info!(
        component = %name,
        passed,
        total,
        "Component test run finished"
    );

    Ok(TestReport {
        component: name.to_string(),
        success: passed == total,
        success_rate,
        passed,
        total,
        results,
    })
}
