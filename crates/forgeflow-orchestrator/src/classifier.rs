//! # Classifier
//!
//! Structural heuristics that label a source blob as a tool, agent or team.
//! Rules are tried in order and the first match wins:
//!
//! 1. the source imports or derives from a `Team` base and declares a type
//!    whose name ends in `Team`
//! 2. the source carries a tool marker (`@tool`, `#[tool]`, `impl Tool for`,
//!    `(Tool)`, `ComponentKind::Tool`)
//! 3. anything else is an agent
//!
//! Classification never fails. A path that cannot be read is classified
//! from the path string alone.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use forgeflow_core::{ComponentKind, ReusabilityTier};

static TEAM_BASE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:from\s+\S+\s+)?(?:import|use)\b[^\n]*\bTeam\b|impl\s+Team\s+for\s|\(\s*(?:\w+\.)?Team\s*\)",
    )
    .ok()
});

static TEAM_DECL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\b(?:class|struct)\s+([A-Za-z_]\w*Team)\b").ok());

static TOOL_MARKER: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"@tool\b|#\[tool\]|impl\s+Tool\s+for\s|\(\s*(?:\w+\.)?Tool\s*\)|ComponentKind::Tool\b",
    )
    .ok()
});

static TYPE_DECL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\b(?:class|struct)\s+([A-Za-z_]\w*)").ok());

static FN_DECL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\b(?:fn|def)\s+([A-Za-z_]\w*)").ok());

static MEMBER_ADD: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\badd_(?:agent|component|member)\s*\(|\bmembers\.insert\s*\(").ok()
});

/// What the classifier is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierInput {
    /// Raw source text, optionally with the file it came from.
    Code {
        text: String,
        origin: Option<PathBuf>,
    },
    /// A file to read.
    Path(PathBuf),
}

impl ClassifierInput {
    pub fn code(text: impl Into<String>) -> Self {
        ClassifierInput::Code {
            text: text.into(),
            origin: None,
        }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        ClassifierInput::Path(path.into())
    }
}

/// Result of classifying one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: ComponentKind,
    pub name: String,
    pub decision_point_count: u32,
    pub reusability_tier: ReusabilityTier,
}

impl Classification {
    fn new(kind: ComponentKind, name: String, decision_point_count: u32) -> Self {
        Self {
            kind,
            name,
            decision_point_count,
            reusability_tier: ReusabilityTier::from_decision_points(decision_point_count),
        }
    }
}

/// Classify a source blob or file.
pub fn classify(input: &ClassifierInput) -> Classification {
    let classification = match input {
        ClassifierInput::Code { text, origin } => classify_code(text, origin.as_deref()),
        ClassifierInput::Path(path) => match fs::read_to_string(path) {
            Ok(text) => classify_code(&text, Some(path)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Source unreadable, classifying from path"
                );
                classify_path_name(path)
            }
        },
    };
    tracing::debug!(
        kind = %classification.kind,
        name = %classification.name,
        decision_points = classification.decision_point_count,
        "Classified source"
    );
    classification
}

fn classify_code(text: &str, origin: Option<&Path>) -> Classification {
    if matches(&TEAM_BASE, text)
        && let Some(name) = first_capture(&TEAM_DECL, text)
    {
        let members = MEMBER_ADD
            .as_ref()
            .map(|re| re.find_iter(text).count() as u32)
            .unwrap_or(0);
        return Classification::new(ComponentKind::Team, name, members.max(2));
    }

    let name = first_capture(&TYPE_DECL, text)
        .or_else(|| first_capture(&FN_DECL, text))
        .or_else(|| origin.and_then(file_stem))
        .unwrap_or_else(|| "unknown".to_string());

    if matches(&TOOL_MARKER, text) {
        Classification::new(ComponentKind::Tool, name, 0)
    } else {
        Classification::new(ComponentKind::Agent, name, 1)
    }
}

fn classify_path_name(path: &Path) -> Classification {
    let lowered = path.to_string_lossy().to_lowercase();
    let name = file_stem(path).unwrap_or_else(|| "unknown".to_string());
    if lowered.contains("team") {
        Classification::new(ComponentKind::Team, name, 2)
    } else if lowered.contains("tool") {
        Classification::new(ComponentKind::Tool, name, 0)
    } else {
        Classification::new(ComponentKind::Agent, name, 1)
    }
}

fn matches(re: &Lazy<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

fn first_capture(re: &Lazy<Option<Regex>>, text: &str) -> Option<String> {
    re.as_ref()?
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PY_TEAM: &str = r#"
from tdev.core.team import Team

class ReviewTeam(Team):
    def __init__(self):
        self.add_agent("reader", ReaderAgent())
        self.add_agent("critic", CriticAgent())
        self.add_agent("editor", EditorAgent())
"#;

    const RUST_TEAM: &str = r#"
use forgeflow_core::{Component, Team};

pub struct PairTeam {
    members: BTreeMap<String, Arc<dyn Component>>,
}

impl Team for PairTeam {
    fn members(&self) -> &BTreeMap<String, Arc<dyn Component>> {
        &self.members
    }
}
"#;

    const PY_TOOL: &str = r#"
@tool
def word_count(text):
    return len(text.split())
"#;

    const RUST_AGENT: &str = r#"
pub struct Summarizer;

impl Component for Summarizer {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Agent
    }
}
"#;

    #[rstest]
    #[case(PY_TEAM, ComponentKind::Team, "ReviewTeam", 3)]
    #[case(RUST_TEAM, ComponentKind::Team, "PairTeam", 2)]
    #[case(PY_TOOL, ComponentKind::Tool, "word_count", 0)]
    #[case(RUST_AGENT, ComponentKind::Agent, "Summarizer", 1)]
    fn test_classify_code(
        #[case] code: &str,
        #[case] kind: ComponentKind,
        #[case] name: &str,
        #[case] decision_points: u32,
    ) {
        let c = classify(&ClassifierInput::code(code));
        assert_eq!(c.kind, kind);
        assert_eq!(c.name, name);
        assert_eq!(c.decision_point_count, decision_points);
        assert_eq!(
            c.reusability_tier,
            ReusabilityTier::from_decision_points(decision_points)
        );
    }

    #[test]
    fn test_team_suffix_without_base_is_not_a_team() {
        let c = classify(&ClassifierInput::code("class DreamTeam:\n    pass\n"));
        assert_eq!(c.kind, ComponentKind::Agent);
        assert_eq!(c.name, "DreamTeam");
    }

    #[test]
    fn test_name_falls_back_to_file_stem_then_unknown() {
        let with_origin = ClassifierInput::Code {
            text: "print('hi')".into(),
            origin: Some(PathBuf::from("scripts/greeter.py")),
        };
        assert_eq!(classify(&with_origin).name, "greeter");
        assert_eq!(classify(&ClassifierInput::code("print('hi')")).name, "unknown");
    }

    #[rstest]
    #[case("/nonexistent/dir/support_team.rs", ComponentKind::Team)]
    #[case("/nonexistent/dir/hash_tool.py", ComponentKind::Tool)]
    #[case("/nonexistent/dir/writer.rs", ComponentKind::Agent)]
    fn test_unreadable_path_uses_substrings(#[case] path: &str, #[case] kind: ComponentKind) {
        let c = classify(&ClassifierInput::path(path));
        assert_eq!(c.kind, kind);
        assert_ne!(c.name, "unknown");
    }

    #[test]
    fn test_reads_file_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("agent_file.py");
        fs::write(&path, PY_TOOL).unwrap();
        let c = classify(&ClassifierInput::path(&path));
        assert_eq!(c.kind, ComponentKind::Tool);
        assert_eq!(c.name, "word_count");
    }
}
