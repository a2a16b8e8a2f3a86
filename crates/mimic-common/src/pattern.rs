use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessMetrics {
    pub completion_rate: f64,
    /// Milliseconds between first and last action of the source recording.
    pub execution_time: f64,
    pub error_rate: f64,
    pub user_satisfaction: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextFeatures {
    pub environment_tags: BTreeSet<String>,
    pub element_types: BTreeSet<String>,
    /// Resource metrics summed over every action of the source recording.
    pub system_state: BTreeMap<String, f64>,
}

/// Reusable distillation of a successful recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: String,
    /// `"type:subtype"` tokens in capture order.
    pub action_sequence: Vec<String>,
    pub success_metrics: SuccessMetrics,
    pub context_features: ContextFeatures,
    #[serde(default)]
    pub emergent_behaviors: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_recording: Option<String>,
}

impl Pattern {
    /// Case-insensitive substring match of `platform` against the environment tags.
    pub fn matches_platform(&self, platform: &str) -> bool {
        let needle = platform.to_lowercase();
        self.context_features
            .environment_tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&needle))
    }
}
