use super::detectors;
use crate::config::ExtractionConfig;
use mimic_common::{Action, ActionEvent, ContextFeatures, Pattern, Recording, SuccessMetrics};
use std::collections::BTreeMap;

/// Scores of the three qualification predicates for one recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    pub completed: bool,
    /// `optimal / total`; infinite when every action shares one timestamp.
    pub efficiency: f64,
    /// `1 - redundant / count`.
    pub cleanliness: f64,
    pub qualifies: bool,
}

/// Decides which recordings count as successful and distills them into patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor {
    config: ExtractionConfig,
}

impl PatternExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// No action reports an error.
    pub fn completion(actions: &[Action]) -> bool {
        !actions.iter().any(Action::indicates_error)
    }

    pub fn efficiency(&self, actions: &[Action]) -> f64 {
        if actions.is_empty() {
            return 0.0;
        }
        let optimal = actions.len() as f64 * self.config.per_action_cost_ms as f64;
        let total = total_time(actions);
        if total == 0 {
            return f64::INFINITY;
        }
        optimal / total as f64
    }

    /// Share of actions that are not an exact repeat of their predecessor.
    pub fn cleanliness(actions: &[Action]) -> f64 {
        if actions.is_empty() {
            return 0.0;
        }
        let redundant = actions
            .windows(2)
            .filter(|pair| pair[1].event.same_payload(&pair[0].event))
            .count();
        1.0 - redundant as f64 / actions.len() as f64
    }

    pub fn evaluate(&self, recording: &Recording) -> QualityReport {
        let actions = &recording.actions;
        let completed = Self::completion(actions);
        let efficiency = self.efficiency(actions);
        let cleanliness = Self::cleanliness(actions);
        let qualifies = !actions.is_empty()
            && completed
            && efficiency >= self.config.min_efficiency
            && cleanliness >= self.config.min_cleanliness;
        QualityReport {
            completed,
            efficiency,
            cleanliness,
            qualifies,
        }
    }

    /// Pattern for `recording` when all three predicates hold.
    pub fn extract(&self, recording: &Recording) -> Option<Pattern> {
        let report = self.evaluate(recording);
        if !report.qualifies {
            tracing::debug!(
                "Recording {} does not qualify (completed={}, efficiency={:.2}, cleanliness={:.2})",
                recording.id,
                report.completed,
                report.efficiency,
                report.cleanliness
            );
            return None;
        }
        Some(self.distill(recording, &report))
    }

    fn distill(&self, recording: &Recording, report: &QualityReport) -> Pattern {
        let actions = &recording.actions;
        Pattern {
            id: uuid::Uuid::new_v4().to_string(),
            action_sequence: actions.iter().map(Action::token).collect(),
            success_metrics: SuccessMetrics {
                completion_rate: 1.0,
                execution_time: total_time(actions) as f64,
                error_rate: 0.0,
                user_satisfaction: report.efficiency.min(1.0) * report.cleanliness,
            },
            context_features: context_features(recording),
            emergent_behaviors: detectors::detect(actions),
            source_recording: Some(recording.id.clone()),
        }
    }
}

fn total_time(actions: &[Action]) -> u64 {
    let min = actions.iter().map(Action::timestamp).min().unwrap_or(0);
    let max = actions.iter().map(Action::timestamp).max().unwrap_or(0);
    max - min
}

fn context_features(recording: &Recording) -> ContextFeatures {
    let mut features = ContextFeatures::default();
    features
        .environment_tags
        .extend(recording.environment.tags());

    let mut system_state: BTreeMap<String, f64> = BTreeMap::new();
    for action in &recording.actions {
        let context = &action.context;
        features.environment_tags.extend(context.environment.tags());
        if let Some(app) = &context.active_application {
            features.environment_tags.insert(format!("app:{}", app));
        }

        features.element_types.extend(
            context
                .gui_state
                .elements
                .iter()
                .map(|e| e.element_type.clone()),
        );
        if let ActionEvent::Mouse(mouse) = &action.event {
            if let Some(role) = mouse.target.as_ref().and_then(|t| t.role.clone()) {
                features.element_types.insert(role);
            }
        }

        for (name, value) in context.resources.named() {
            *system_state.entry(name.to_string()).or_default() += value;
        }
    }
    features.system_state = system_state;
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_common::{Coordinates, MouseEvent, MouseSubtype};

    fn click(id: &str, x: f64, ts: u64) -> Action {
        Action::new(
            id,
            ActionEvent::Mouse(MouseEvent {
                subtype: MouseSubtype::Click,
                coordinates: Coordinates::at(x, 0.0),
                target: None,
                button: None,
                pressure: None,
                timestamp: ts,
            }),
        )
    }

    #[test]
    fn repeats_lower_cleanliness() {
        let actions = vec![
            click("1", 1.0, 0),
            click("2", 1.0, 10),
            click("3", 2.0, 20),
            click("4", 3.0, 30),
        ];
        assert_eq!(PatternExtractor::cleanliness(&actions), 0.75);
    }

    #[test]
    fn simultaneous_actions_are_maximally_efficient() {
        let extractor = PatternExtractor::default();
        let actions = vec![click("1", 1.0, 5), click("2", 2.0, 5)];
        assert!(extractor.efficiency(&actions).is_infinite());
        assert_eq!(extractor.efficiency(&[]), 0.0);
    }
}
