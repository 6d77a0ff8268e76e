//! Evaluation results and the test summaries that feed them.

use serde::{Deserialize, Serialize};

/// Score below which a workflow is flagged for improvement.
pub const IMPROVEMENT_THRESHOLD: u8 = 70;

/// Per-dimension quality metrics, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub structural_completeness: f64,
    pub component_suitability: f64,
    pub error_resilience: f64,
    pub efficiency: f64,
    pub clarity: f64,
}

impl EvaluationMetrics {
    pub const STRUCTURAL_WEIGHT: f64 = 0.25;
    pub const SUITABILITY_WEIGHT: f64 = 0.30;
    pub const RESILIENCE_WEIGHT: f64 = 0.15;
    pub const EFFICIENCY_WEIGHT: f64 = 0.15;
    pub const CLARITY_WEIGHT: f64 = 0.15;

    /// Weighted sum of all metrics, in `0.0..=1.0`.
    pub fn weighted_sum(&self) -> f64 {
        Self::STRUCTURAL_WEIGHT * self.structural_completeness
            + Self::SUITABILITY_WEIGHT * self.component_suitability
            + Self::RESILIENCE_WEIGHT * self.error_resilience
            + Self::EFFICIENCY_WEIGHT * self.efficiency
            + Self::CLARITY_WEIGHT * self.clarity
    }

    /// Apply `factor` to every metric, clamping into `0.0..=1.0`.
    pub fn scaled(self, factor: f64) -> Self {
        let f = |m: f64| (m * factor).clamp(0.0, 1.0);
        Self {
            structural_completeness: f(self.structural_completeness),
            component_suitability: f(self.component_suitability),
            error_resilience: f(self.error_resilience),
            efficiency: f(self.efficiency),
            clarity: f(self.clarity),
        }
    }

    /// Integer score in `0..=100`.
    pub fn score(&self) -> u8 {
        (self.weighted_sum() * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Outcome of evaluating a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: u8,
    pub metrics: EvaluationMetrics,
    pub suggestions: Vec<String>,
    pub needs_improvement: bool,
}

impl EvaluationResult {
    /// Build a result, deriving `score` and `needs_improvement`.
    pub fn from_metrics(metrics: EvaluationMetrics, suggestions: Vec<String>) -> Self {
        let score = metrics.score();
        let needs_improvement = score < IMPROVEMENT_THRESHOLD || !suggestions.is_empty();
        Self {
            score,
            metrics,
            suggestions,
            needs_improvement,
        }
    }
}

/// Summary of running a component's test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    pub passed: bool,
    pub success_rate: f64,
    pub total_cases: usize,
    /// Failure messages in case order.
    #[serde(default)]
    pub failures: Vec<String>,
}

impl TestResults {
    pub fn passing(total_cases: usize) -> Self {
        Self {
            passed: true,
            success_rate: 1.0,
            total_cases,
            failures: Vec::new(),
        }
    }

    pub fn failing(total_cases: usize, failures: Vec<String>) -> Self {
        let failed = failures.len().min(total_cases);
        let success_rate = if total_cases == 0 {
            0.0
        } else {
            (total_cases - failed) as f64 / total_cases as f64
        };
        Self {
            passed: false,
            success_rate,
            total_cases,
            failures,
        }
    }
}
