//! Planning outcomes and capability gaps.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::component::ComponentKind;
use crate::workflow::WorkflowSpec;

/// A workflow step whose component is not available in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGap {
    pub kind: ComponentKind,
    pub name: String,
    pub description: String,
}

impl CapabilityGap {
    pub fn new(kind: ComponentKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
        }
    }

    /// Infer the kind of a missing component from its name suffix.
    pub fn infer_kind(name: &str) -> ComponentKind {
        if name.ends_with("Team") {
            ComponentKind::Team
        } else if name.ends_with("Tool") {
            ComponentKind::Tool
        } else {
            ComponentKind::Agent
        }
    }

    /// Build a gap for `name`, describing it against the goal it serves.
    pub fn for_missing(name: &str, goal: &str) -> Self {
        let kind = Self::infer_kind(name);
        Self::new(
            kind,
            name,
            format!("{kind} '{name}' required to accomplish: {goal}"),
        )
    }
}

impl fmt::Display for CapabilityGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// Which planning path produced a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStrategy {
    Oracle,
    RuleBased,
    DefaultPipeline,
}

/// A candidate workflow plus everything it still needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub workflow: WorkflowSpec,
    pub gaps: Vec<CapabilityGap>,
    pub strategy: PlanStrategy,
}

impl PlanOutcome {
    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn gap_names(&self) -> Vec<String> {
        self.gaps.iter().map(|g| g.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_kind_from_suffix() {
        assert_eq!(CapabilityGap::infer_kind("SummaryTeam"), ComponentKind::Team);
        assert_eq!(CapabilityGap::infer_kind("HashTool"), ComponentKind::Tool);
        assert_eq!(CapabilityGap::infer_kind("Summarizer"), ComponentKind::Agent);
    }

    #[test]
    fn test_gap_description_mentions_goal() {
        let gap = CapabilityGap::for_missing("Summarizer", "summarize the report");
        assert!(gap.description.contains("summarize the report"));
        assert!(gap.description.starts_with("agent 'Summarizer'"));
    }
}
