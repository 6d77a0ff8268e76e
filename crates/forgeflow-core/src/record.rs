//! # Component Records
//!
//! [`ComponentRecord`] is the metadata the registry persists for each
//! component. Records are validated on registration so that the kind,
//! decision point count and reusability tier always agree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::component::{ComponentKind, ReusabilityTier};
use crate::error::RecordError;
use crate::identifiers::IdValidator;

/// Maximum number of feedback events retained per record.
pub const FEEDBACK_LOG_CAP: usize = 100;

/// Advisory field name to type-name map.
pub type FieldSchema = BTreeMap<String, String>;

/// Metadata describing one registered component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub kind: ComponentKind,
    /// Locator resolved through the registry's factory table,
    /// e.g. `builtin.echo.EchoTool` or `generated.uppercase.Shouter`.
    pub implementation_ref: String,
    #[serde(default)]
    pub description: String,
    pub decision_point_count: u32,
    pub reusability_tier: ReusabilityTier,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub generated: bool,
    #[serde(default)]
    pub input_schema: FieldSchema,
    #[serde(default)]
    pub output_schema: FieldSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_info: Option<DeploymentInfo>,
    #[serde(default)]
    pub feedback_log: Vec<FeedbackEvent>,
    /// Goal a generated component was synthesized for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Location of the persisted generated artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<String>,
}

impl ComponentRecord {
    /// Create a record whose decision points and tier follow from `kind`.
    ///
    /// Teams start at the minimum of two decision points; use
    /// [`with_decision_points`](Self::with_decision_points) to raise it.
    pub fn new(
        name: impl Into<String>,
        kind: ComponentKind,
        implementation_ref: impl Into<String>,
    ) -> Self {
        let decision_point_count = kind.min_decision_points();
        Self {
            name: name.into(),
            kind,
            implementation_ref: implementation_ref.into(),
            description: String::new(),
            decision_point_count,
            reusability_tier: ReusabilityTier::from_decision_points(decision_point_count),
            tags: BTreeSet::new(),
            generated: false,
            input_schema: FieldSchema::new(),
            output_schema: FieldSchema::new(),
            deployment_info: None,
            feedback_log: Vec::new(),
            goal: None,
            artifact_path: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the decision point count and re-derive the tier.
    pub fn with_decision_points(mut self, count: u32) -> Self {
        self.decision_point_count = count;
        self.reusability_tier = ReusabilityTier::from_decision_points(count);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_input_field(mut self, field: impl Into<String>, ty: impl Into<String>) -> Self {
        self.input_schema.insert(field.into(), ty.into());
        self
    }

    pub fn with_output_field(mut self, field: impl Into<String>, ty: impl Into<String>) -> Self {
        self.output_schema.insert(field.into(), ty.into());
        self
    }

    /// Mark the record as synthesized for `goal`.
    pub fn generated_for(mut self, goal: impl Into<String>) -> Self {
        self.generated = true;
        self.goal = Some(goal.into());
        self.tags.insert("generated".to_string());
        self
    }

    /// Check the record's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] when the name is not a valid component name,
    /// the implementation reference is empty, the decision point count does
    /// not match the kind, or the tier disagrees with the decision points.
    pub fn validate(&self) -> Result<(), RecordError> {
        IdValidator::validate(&self.name).map_err(|source| RecordError::InvalidName {
            name: self.name.clone(),
            source,
        })?;

        if self.implementation_ref.trim().is_empty() {
            return Err(RecordError::MissingImplementation {
                name: self.name.clone(),
            });
        }

        if !self.kind.accepts_decision_points(self.decision_point_count) {
            return Err(RecordError::DecisionPointMismatch {
                name: self.name.clone(),
                kind: self.kind,
                count: self.decision_point_count,
            });
        }

        let expected = ReusabilityTier::from_decision_points(self.decision_point_count);
        if self.reusability_tier != expected {
            return Err(RecordError::TierMismatch {
                name: self.name.clone(),
                expected,
                actual: self.reusability_tier,
            });
        }

        Ok(())
    }

    /// Append a feedback event, dropping the oldest beyond [`FEEDBACK_LOG_CAP`].
    pub fn push_feedback(&mut self, event: FeedbackEvent) {
        self.feedback_log.push(event);
        if self.feedback_log.len() > FEEDBACK_LOG_CAP {
            let excess = self.feedback_log.len() - FEEDBACK_LOG_CAP;
            self.feedback_log.drain(..excess);
        }
    }

    /// Mean rating over the retained feedback log.
    pub fn average_rating(&self) -> Option<f64> {
        if self.feedback_log.is_empty() {
            return None;
        }
        let total: u32 = self.feedback_log.iter().map(|e| u32::from(e.rating)).sum();
        Some(f64::from(total) / self.feedback_log.len() as f64)
    }
}

/// One rating event attached to a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default = "default_feedback_source")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

fn default_feedback_source() -> String {
    "user".to_string()
}

impl FeedbackEvent {
    /// Build a timestamped event, rejecting ratings outside 1..=5.
    pub fn new(
        rating: u8,
        comment: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, RecordError> {
        if !(1..=5).contains(&rating) {
            return Err(RecordError::InvalidRating { rating });
        }
        Ok(Self {
            rating,
            comment: comment.into(),
            source: source.into(),
            user_id: None,
            timestamp: Utc::now(),
        })
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Ratings of two or below are flagged for follow-up.
    pub fn is_low_rating(&self) -> bool {
        self.rating <= 2
    }
}

/// Opaque endpoint descriptor written by deployment collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    /// Deployment target family, e.g. `container` or `function`.
    pub kind: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
    pub updated_at: DateTime<Utc>,
}

impl DeploymentInfo {
    pub fn new(kind: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            endpoint: endpoint.into(),
            region: None,
            extra: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}
