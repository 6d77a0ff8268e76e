//! # Component Contract
//!
//! Every unit of behaviour the registry can resolve (Tool, Agent or Team)
//! implements [`Component`]. The pipeline never cares which kind it is
//! holding: all three are driven through the single `run` operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ComponentError;

/// Structural classification of a component by its number of decision points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Zero decision points, pure function semantics.
    Tool,
    /// Exactly one decision point.
    Agent,
    /// Two or more decision points coordinating child components.
    Team,
}

impl ComponentKind {
    /// All kinds, in tier order.
    pub fn all() -> &'static [ComponentKind] {
        &[ComponentKind::Tool, ComponentKind::Agent, ComponentKind::Team]
    }

    /// Lowercase identifier used in records and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Tool => "tool",
            ComponentKind::Agent => "agent",
            ComponentKind::Team => "team",
        }
    }

    /// Smallest decision point count valid for this kind.
    pub fn min_decision_points(&self) -> u32 {
        match self {
            ComponentKind::Tool => 0,
            ComponentKind::Agent => 1,
            ComponentKind::Team => 2,
        }
    }

    /// Check whether `count` decision points are consistent with this kind.
    pub fn accepts_decision_points(&self, count: u32) -> bool {
        match self {
            ComponentKind::Tool => count == 0,
            ComponentKind::Agent => count == 1,
            ComponentKind::Team => count >= 2,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tool" => Ok(ComponentKind::Tool),
            "agent" => Ok(ComponentKind::Agent),
            "team" => Ok(ComponentKind::Team),
            other => Err(format!(
                "Unknown component kind '{}'. Expected tool, agent or team",
                other
            )),
        }
    }
}

/// Reusability tier derived from the decision point count.
///
/// Tools are the most reusable (A), single-decision agents sit in the middle
/// (B) and teams are the most specialised (C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReusabilityTier {
    A,
    B,
    C,
}

impl ReusabilityTier {
    /// Derive the tier from a decision point count.
    pub fn from_decision_points(count: u32) -> Self {
        match count {
            0 => ReusabilityTier::A,
            1 => ReusabilityTier::B,
            _ => ReusabilityTier::C,
        }
    }
}

impl fmt::Display for ReusabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReusabilityTier::A => f.write_str("A"),
            ReusabilityTier::B => f.write_str("B"),
            ReusabilityTier::C => f.write_str("C"),
        }
    }
}

/// Trait implemented by every runnable unit the registry can resolve.
///
/// Components receive and return opaque JSON values, usually objects. They
/// run synchronously and may block; the executor never runs two steps of
/// the same workflow concurrently.
///
/// # Example
///
/// ```rust
/// use forgeflow_core::{Component, ComponentError, ComponentKind};
/// use serde_json::{Value, json};
///
/// struct LengthTool;
///
/// impl Component for LengthTool {
///     fn name(&self) -> &str {
///         "LengthTool"
///     }
///
///     fn kind(&self) -> ComponentKind {
///         ComponentKind::Tool
///     }
///
///     fn run(&self, input: Value) -> Result<Value, ComponentError> {
///         match input.as_str() {
///             Some(text) => Ok(json!(text.chars().count())),
///             None => Err(ComponentError::invalid_input(self.name(), "expected a string")),
///         }
///     }
/// }
///
/// assert_eq!(LengthTool.run(json!("abc")).unwrap(), json!(3));
/// ```
pub trait Component: Send + Sync {
    /// Registry name of this component.
    fn name(&self) -> &str;

    /// Structural kind of this component.
    fn kind(&self) -> ComponentKind;

    /// Human-readable description used in listings.
    fn description(&self) -> &str {
        ""
    }

    /// Execute the component against one input value.
    fn run(&self, input: Value) -> Result<Value, ComponentError>;
}

/// A composite component that orchestrates named child components.
///
/// Teams expose their members so tooling can inspect them; how the members
/// are sequenced stays internal to `run`.
pub trait Team: Component {
    /// Named child instances owned by this team.
    fn members(&self) -> &BTreeMap<String, Arc<dyn Component>>;

    /// Look up a member by its team-local name.
    fn member(&self, name: &str) -> Result<&Arc<dyn Component>, ComponentError> {
        self.members()
            .get(name)
            .ok_or_else(|| ComponentError::MissingMember {
                team: self.name().to_string(),
                member: name.to_string(),
            })
    }

    /// Number of decision points, one per member.
    fn decision_points(&self) -> u32 {
        (self.members().len() as u32).max(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_decision_point_rules() {
        assert!(ComponentKind::Tool.accepts_decision_points(0));
        assert!(!ComponentKind::Tool.accepts_decision_points(1));
        assert!(ComponentKind::Agent.accepts_decision_points(1));
        assert!(!ComponentKind::Agent.accepts_decision_points(2));
        assert!(ComponentKind::Team.accepts_decision_points(2));
        assert!(ComponentKind::Team.accepts_decision_points(7));
        assert!(!ComponentKind::Team.accepts_decision_points(1));
    }

    #[test]
    fn test_kind_parsing_is_case_insensitive() {
        assert_eq!("Tool".parse::<ComponentKind>(), Ok(ComponentKind::Tool));
        assert_eq!("TEAM".parse::<ComponentKind>(), Ok(ComponentKind::Team));
        assert!("crew".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn test_tier_from_decision_points() {
        assert_eq!(ReusabilityTier::from_decision_points(0), ReusabilityTier::A);
        assert_eq!(ReusabilityTier::from_decision_points(1), ReusabilityTier::B);
        assert_eq!(ReusabilityTier::from_decision_points(4), ReusabilityTier::C);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ComponentKind::Agent).unwrap();
        assert_eq!(json, "\"agent\"");
    }
}
