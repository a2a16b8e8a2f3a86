//! Reassembles ranked patterns into a new synthetic recording.

use super::pattern_store::PatternStore;
use crate::config::SynthesisConfig;
use chrono::Utc;
use mimic_common::{
    Action, ActionContext, ActionEvent, ActionKind, Coordinates, Display, Environment,
    KeyboardEvent, KeyboardSubtype, Modifiers, MouseButton, MouseEvent, MouseSubtype, Pattern,
    Recording, SuccessMetrics, SystemCall, SystemEvent, SystemSubtype, WindowInfo,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const GENERATED_TAG: &str = "generated";
pub const ABSOLUTE_ZERO_TAG: &str = "absolute-zero";

/// Caller-supplied hints; set fields win over the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextHints {
    pub platform: Option<String>,
    pub os_version: Option<String>,
    pub display: Option<Display>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
}

impl ContextHints {
    pub fn platform(platform: impl Into<String>) -> Self {
        Self {
            platform: Some(platform.into()),
            ..Default::default()
        }
    }
}

/// Weighted success score used for ranking.
pub fn score(metrics: &SuccessMetrics) -> f64 {
    0.4 * metrics.completion_rate
        + 0.3 * (1.0 / metrics.execution_time.max(1.0))
        + 0.2 * (1.0 - metrics.error_rate)
        + 0.1 * metrics.user_satisfaction
}

/// `max(1, ceil(complexity * relevant))`, never more than are available.
pub fn selection_count(complexity: f64, relevant: usize) -> usize {
    if relevant == 0 {
        return 0;
    }
    let complexity = clamp_complexity(complexity);
    let wanted = (complexity * relevant as f64).ceil() as usize;
    wanted.clamp(1, relevant)
}

fn clamp_complexity(complexity: f64) -> f64 {
    if complexity.is_nan() {
        0.0
    } else {
        complexity.clamp(0.0, 1.0)
    }
}

pub fn complexity_bucket(complexity: f64) -> &'static str {
    let complexity = clamp_complexity(complexity);
    if complexity < 1.0 / 3.0 {
        "simple"
    } else if complexity < 2.0 / 3.0 {
        "moderate"
    } else {
        "complex"
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskSynthesizer {
    config: SynthesisConfig,
}

impl TaskSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Patterns whose environment tags mention the hinted platform; all of them
    /// when no platform is hinted.
    pub fn relevant<'a>(&self, store: &'a PatternStore, hints: &ContextHints) -> Vec<&'a Pattern> {
        match hints.platform.as_deref() {
            None => store.iter().collect(),
            Some(platform) => store
                .iter()
                .filter(|p| p.matches_platform(platform))
                .collect(),
        }
    }

    /// Best first; equal scores fall back to pattern id.
    pub fn rank<'a>(&self, mut patterns: Vec<&'a Pattern>) -> Vec<&'a Pattern> {
        patterns.sort_by(|a, b| {
            score(&b.success_metrics)
                .total_cmp(&score(&a.success_metrics))
                .then_with(|| a.id.cmp(&b.id))
        });
        patterns
    }

    pub fn synthesize(
        &self,
        store: &PatternStore,
        hints: &ContextHints,
        complexity: f64,
    ) -> Recording {
        if !store.is_initialized() {
            tracing::warn!(
                "Pattern store not initialized; synthesizing from {} patterns",
                store.len()
            );
        }

        let ranked = self.rank(self.relevant(store, hints));
        let count = selection_count(complexity, ranked.len());
        let selected = &ranked[..count];
        let environment = self.environment(hints);

        let mut events = Vec::new();
        let mut clock: u64 = 0;
        for pattern in selected {
            for event in reconstruct(pattern) {
                let mut event = event;
                event.set_timestamp(clock);
                clock += 1;
                events.push(event);
            }
        }
        let actions = self.optimize(events, &environment);

        let percent = (clamp_complexity(complexity) * 100.0).round() as u32;
        let tags: BTreeSet<String> = [
            GENERATED_TAG.to_string(),
            ABSOLUTE_ZERO_TAG.to_string(),
            format!("complexity-{}", complexity_bucket(complexity)),
        ]
        .into_iter()
        .collect();

        tracing::info!(
            "Synthesized task with {} actions from {} patterns at {}% complexity",
            actions.len(),
            selected.len(),
            percent
        );

        Recording {
            id: uuid::Uuid::new_v4().to_string(),
            name: format!("Synthetic task ({}% complexity)", percent),
            description: format!(
                "Generated from {} patterns at {}% complexity",
                selected.len(),
                percent
            ),
            actions,
            environment,
            tags,
            created_at: Utc::now(),
        }
    }

    /// Drops adjacent repeats, then re-spaces timestamps and renumbers ids.
    fn optimize(&self, events: Vec<ActionEvent>, environment: &Environment) -> Vec<Action> {
        let mut kept: Vec<ActionEvent> = Vec::with_capacity(events.len());
        for event in events {
            if kept.last().is_some_and(|prev| prev.same_payload(&event)) {
                continue;
            }
            kept.push(event);
        }

        kept.into_iter()
            .enumerate()
            .map(|(index, mut event)| {
                event.set_timestamp(index as u64 * self.config.action_spacing_ms);
                if let ActionEvent::System(sys) = &mut event {
                    if let Some(call) = sys.system_call.as_mut() {
                        call.timestamp = sys.timestamp;
                    }
                }
                Action::new(format!("syn-{}", index), event).with_context(ActionContext {
                    environment: environment.clone(),
                    ..Default::default()
                })
            })
            .collect()
    }

    fn environment(&self, hints: &ContextHints) -> Environment {
        let mut env = self.config.default_environment();
        if let Some(platform) = &hints.platform {
            env.platform = platform.clone();
        }
        if let Some(os) = &hints.os_version {
            env.os_version = Some(os.clone());
        }
        if let Some(display) = &hints.display {
            env.displays = vec![display.clone()];
        }
        if let Some(locale) = &hints.locale {
            env.locale = locale.clone();
        }
        if let Some(timezone) = &hints.timezone {
            env.timezone = timezone.clone();
        }
        env
    }
}

/// Expands a pattern's tokens into concrete events. Payloads depend only on each
/// token's position in the pattern; timestamps are assigned by the caller.
pub fn reconstruct(pattern: &Pattern) -> Vec<ActionEvent> {
    pattern
        .action_sequence
        .iter()
        .enumerate()
        .filter_map(|(index, token)| {
            let event = synthesize_event(token, index);
            if event.is_none() {
                tracing::debug!(
                    "Skipping unrecognized token {:?} in pattern {}",
                    token,
                    pattern.id
                );
            }
            event
        })
        .collect()
}

fn synthesize_event(token: &str, index: usize) -> Option<ActionEvent> {
    let (kind, subtype) = token.split_once(':')?;
    let step = index as f64;

    let event = match ActionKind::parse(kind)? {
        ActionKind::Mouse => {
            let subtype = MouseSubtype::parse(subtype).unwrap_or(MouseSubtype::Click);
            let button = match subtype {
                MouseSubtype::RightClick => Some(MouseButton::Right),
                MouseSubtype::Move | MouseSubtype::Scroll => None,
                _ => Some(MouseButton::Left),
            };
            ActionEvent::Mouse(MouseEvent {
                subtype,
                coordinates: Coordinates::at(100.0 + 25.0 * step, 100.0 + 15.0 * step),
                target: None,
                button,
                pressure: None,
                timestamp: 0,
            })
        }
        ActionKind::Keyboard => {
            let subtype = KeyboardSubtype::parse(subtype).unwrap_or(KeyboardSubtype::KeyPress);
            let letter = (b'a' + (index % 26) as u8) as char;
            ActionEvent::Keyboard(KeyboardEvent {
                subtype,
                key: letter.to_string(),
                key_code: Some(letter.to_ascii_uppercase() as u32),
                modifiers: Modifiers::default(),
                repeat: None,
                timestamp: 0,
            })
        }
        ActionKind::System => {
            let subtype = SystemSubtype::parse(subtype).unwrap_or(SystemSubtype::Unknown);
            let mut event = SystemEvent::new(subtype, 0);
            match subtype {
                SystemSubtype::SystemCall => {
                    event.system_call = Some(SystemCall {
                        call_type: "process".to_string(),
                        module: "synthetic".to_string(),
                        function: format!("step_{}", index),
                        parameters: None,
                        result: None,
                        error: None,
                        timestamp: 0,
                    });
                }
                SystemSubtype::WindowChange => {
                    event.window = Some(WindowInfo {
                        title: format!("Window {}", index + 1),
                        ..Default::default()
                    });
                }
                _ => {}
            }
            ActionEvent::System(event)
        }
    };
    Some(event)
}
