//! Perturbation and merging of existing recordings.

use crate::config::VariationConfig;
use chrono::Utc;
use mimic_common::{ActionEvent, Recording};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use thiserror::Error;

pub const SYNTHETIC_TAG: &str = "synthetic";
pub const VARIATION_TAG: &str = "variation";
pub const MERGED_TAG: &str = "merged";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariationError {
    #[error("No source recordings to merge")]
    NoSources,
}

/// Randomness is injected so a fixed seed reproduces the same output.
pub struct VariationGenerator<R: Rng = StdRng> {
    config: VariationConfig,
    rng: R,
}

impl VariationGenerator<StdRng> {
    pub fn seeded(config: VariationConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(config: VariationConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> VariationGenerator<R> {
    pub fn with_rng(config: VariationConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Same actions in the same order with noisy numeric fields.
    pub fn create_variation(&mut self, task: &Recording) -> Recording {
        let mut actions = task.actions.clone();
        let coordinate = self.config.coordinate_jitter.abs();
        let time = self.config.timestamp_jitter_ms as i64;
        let resource = self.config.resource_jitter.abs();

        for index in 0..actions.len() {
            let floor = if index == 0 {
                0
            } else {
                actions[index - 1].timestamp()
            };
            let ceiling = actions
                .get(index + 1)
                .map(|next| next.timestamp())
                .unwrap_or(u64::MAX);

            let action = &mut actions[index];
            match &mut action.event {
                ActionEvent::Mouse(mouse) => {
                    let dx = self.rng.random_range(-coordinate..=coordinate);
                    let dy = self.rng.random_range(-coordinate..=coordinate);
                    mouse.coordinates.x = (mouse.coordinates.x + dx).max(0.0);
                    mouse.coordinates.y = (mouse.coordinates.y + dy).max(0.0);
                }
                ActionEvent::Keyboard(key) => {
                    let delta = self.rng.random_range(-time..=time);
                    let shifted = key.timestamp.saturating_add_signed(delta);
                    // Stay between the neighbours so the recording remains chronological.
                    let floor = floor.min(key.timestamp);
                    let ceiling = ceiling.max(key.timestamp);
                    key.timestamp = shifted.clamp(floor, ceiling);
                }
                ActionEvent::System(_) => {
                    let rng = &mut self.rng;
                    action.context.resources = action.context.resources.map(|value| {
                        let noise = rng.random_range(-resource..=resource);
                        (value * (1.0 + noise)).max(0.0)
                    });
                }
            }
        }

        let mut environment = task.environment.clone();
        let scale = self.config.scale_jitter.abs();
        for display in &mut environment.displays {
            let delta = self.rng.random_range(-scale..=scale);
            display.scale_factor = (display.scale_factor + delta).max(0.1);
        }

        let mut tags = task.tags.clone();
        tags.insert(SYNTHETIC_TAG.to_string());
        tags.insert(VARIATION_TAG.to_string());

        Recording {
            id: uuid::Uuid::new_v4().to_string(),
            name: format!("{} (variation)", task.name),
            description: task.description.clone(),
            actions,
            environment,
            tags,
            created_at: Utc::now(),
        }
    }

    /// Stitches a random contiguous slice of every source into one recording.
    pub fn merge_tasks(&mut self, tasks: &[Recording]) -> Result<Recording, VariationError> {
        let first = tasks.first().ok_or(VariationError::NoSources)?;
        let spacing = self.config.merge_spacing_ms;

        let mut merged = Vec::new();
        let mut cursor: u64 = 0;
        for task in tasks {
            let total = task.actions.len();
            if total == 0 {
                tracing::debug!("Skipping empty recording {} in merge", task.id);
                continue;
            }
            let len = self.rng.random_range(1..=total);
            let offset = self.rng.random_range(0..=total - len);

            for action in &task.actions[offset..offset + len] {
                let mut action = action.clone();
                action.event.set_timestamp(cursor);
                if let ActionEvent::System(sys) = &mut action.event {
                    if let Some(call) = sys.system_call.as_mut() {
                        call.timestamp = cursor;
                    }
                }
                merged.push(action);
                cursor += spacing;
            }
        }

        // Stable, so equal timestamps keep their merge order.
        merged.sort_by_key(|a| a.timestamp());
        for (index, action) in merged.iter_mut().enumerate() {
            action.id = format!("{}-m{}", action.id, index);
        }

        let mut tags: BTreeSet<String> = tasks
            .iter()
            .flat_map(|t| t.tags.iter().cloned())
            .collect();
        tags.insert(SYNTHETIC_TAG.to_string());
        tags.insert(MERGED_TAG.to_string());

        tracing::info!(
            "Merged {} recordings into {} actions",
            tasks.len(),
            merged.len()
        );

        Ok(Recording {
            id: uuid::Uuid::new_v4().to_string(),
            name: format!("Merged task ({} sources)", tasks.len()),
            description: tasks
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(" + "),
            actions: merged,
            environment: first.environment.clone(),
            tags,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_common::{Action, KeyboardEvent, KeyboardSubtype, Modifiers, NewRecording};

    fn key(id: &str, ts: u64) -> Action {
        Action::new(
            id,
            ActionEvent::Keyboard(KeyboardEvent {
                subtype: KeyboardSubtype::Input,
                key: "x".to_string(),
                key_code: None,
                modifiers: Modifiers::default(),
                repeat: None,
                timestamp: ts,
            }),
        )
    }

    #[test]
    fn dense_keystrokes_stay_ordered() {
        let actions = (0..10).map(|i| key(&i.to_string(), i * 2)).collect();
        let task = Recording::from_draft(NewRecording::new("typing", actions));
        let mut generator = VariationGenerator::seeded(VariationConfig::default(), 42);
        let varied = generator.create_variation(&task);
        assert!(varied.is_chronological());
        assert_eq!(varied.actions.len(), 10);
        assert!(varied.has_tag(VARIATION_TAG));
    }
}
