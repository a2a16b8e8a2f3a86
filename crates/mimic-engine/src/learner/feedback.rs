use chrono::{DateTime, Utc};
use mimic_common::Recording;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EMERGENT_WEIGHT: f64 = 1.0;
const ADAPTATION_WEIGHT: f64 = 0.1;

/// Outcome report for a task that was executed outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFeedback {
    pub task_id: String,
    pub success: bool,
    #[serde(default)]
    pub emergent_patterns: Vec<String>,
    #[serde(default)]
    pub adaptations: Vec<String>,
    /// Recording of the run, when the caller captured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<Recording>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl TaskFeedback {
    pub fn new(task_id: impl Into<String>, success: bool) -> Self {
        Self {
            task_id: task_id.into(),
            success,
            emergent_patterns: Vec::new(),
            adaptations: Vec::new(),
            recording: None,
            notes: None,
            received_at: Utc::now(),
        }
    }
}

/// Folds feedback into the knowledge map. Weights only grow; nothing reads them
/// back into ranking yet.
#[derive(Debug, Default)]
pub struct FeedbackLearner {
    history: Vec<TaskFeedback>,
    knowledge: BTreeMap<String, f64>,
}

impl FeedbackLearner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, feedback: TaskFeedback) {
        if feedback.success {
            for name in &feedback.emergent_patterns {
                *self.knowledge.entry(name.clone()).or_default() += EMERGENT_WEIGHT;
            }
            for name in &feedback.adaptations {
                *self.knowledge.entry(name.clone()).or_default() += ADAPTATION_WEIGHT;
            }
        }
        tracing::debug!(
            "Feedback for task {} (success={})",
            feedback.task_id,
            feedback.success
        );
        self.history.push(feedback);
    }

    pub fn history(&self) -> &[TaskFeedback] {
        &self.history
    }

    pub fn knowledge(&self) -> &BTreeMap<String, f64> {
        &self.knowledge
    }

    pub fn weight(&self, name: &str) -> f64 {
        self.knowledge.get(name).copied().unwrap_or(0.0)
    }
}
