use crate::action::Action;
use crate::environment::Environment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An ordered, named, tagged collection of actions. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Recording {
    /// Wraps `draft` with a fresh id and the current time.
    pub fn from_draft(draft: NewRecording) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            description: draft.description,
            actions: draft.actions,
            environment: draft.environment,
            tags: draft.tags,
            created_at: Utc::now(),
        }
    }

    /// Span between the earliest and latest action timestamp.
    pub fn duration_ms(&self) -> u64 {
        let min = self.actions.iter().map(Action::timestamp).min();
        let max = self.actions.iter().map(Action::timestamp).max();
        match (min, max) {
            (Some(min), Some(max)) => max - min,
            _ => 0,
        }
    }

    /// Timestamps never decrease in capture order.
    pub fn is_chronological(&self) -> bool {
        self.actions
            .windows(2)
            .all(|pair| pair[0].timestamp() <= pair[1].timestamp())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Everything the persistence collaborator needs to create a [`Recording`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRecording {
    pub name: String,
    pub description: String,
    pub actions: Vec<Action>,
    pub environment: Environment,
    pub tags: BTreeSet<String>,
}

impl NewRecording {
    pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            actions,
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}
