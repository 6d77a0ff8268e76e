//! Feedback collection on top of [`Registry::update_with`].

use serde::Serialize;

use forgeflow_core::{ComponentRecord, FeedbackEvent, RegistryError, RegistryResult};

use crate::registry::Registry;

/// Append a rating event to a component's feedback log.
///
/// Ratings of two or below are logged as warnings so low-quality generated
/// components surface quickly.
///
/// # Errors
///
/// Fails for unknown components, ratings outside 1..=5, or when the
/// registry cannot persist the change.
pub fn record_feedback(
    registry: &Registry,
    name: &str,
    rating: u8,
    comment: &str,
    source: &str,
) -> RegistryResult<FeedbackEvent> {
    let event = FeedbackEvent::new(rating, comment, source).map_err(RegistryError::from)?;
    let stored = event.clone();
    registry.update_with(name, move |record| record.push_feedback(stored))?;

    if event.is_low_rating() {
        tracing::warn!(
            component = %name,
            rating,
            comment = %comment,
            source = %source,
            "Low rating received"
        );
    } else {
        tracing::info!(component = %name, rating, source = %source, "Feedback recorded");
    }
    Ok(event)
}

/// Aggregate view over a component's retained feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSummary {
    pub component: String,
    pub count: usize,
    pub average_rating: Option<f64>,
    pub low_ratings: usize,
    pub latest_comment: Option<String>,
}

pub fn summarize_feedback(record: &ComponentRecord) -> FeedbackSummary {
    FeedbackSummary {
        component: record.name.clone(),
        count: record.feedback_log.len(),
        average_rating: record.average_rating(),
        low_ratings: record
            .feedback_log
            .iter()
            .filter(|e| e.is_low_rating())
            .count(),
        latest_comment: record
            .feedback_log
            .iter()
            .rev()
            .find(|e| !e.comment.is_empty())
            .map(|e| e.comment.clone()),
    }
}
