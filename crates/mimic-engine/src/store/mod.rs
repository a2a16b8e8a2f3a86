//! Persistence collaborator contract and two implementations.

pub mod json_dir;
pub mod memory;

use async_trait::async_trait;
pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;
pub use mimic_common::StoreError;
use mimic_common::{ActionEvent, NewRecording, Recording};
use std::collections::BTreeSet;

#[async_trait]
pub trait RecordingStore: Send + Sync {
    /// Persist a new recording and return its id.
    async fn save(&self, draft: NewRecording) -> Result<String, StoreError>;

    /// Persist an already-built recording (synthetic output) under its own id.
    async fn insert(&self, recording: Recording) -> Result<String, StoreError>;

    async fn get(&self, id: &str) -> Result<Recording, StoreError>;

    /// Every stored recording, oldest first.
    async fn list(&self) -> Result<Vec<Recording>, StoreError>;

    /// Case-insensitive substring match over name, description and tags.
    /// An empty query matches everything.
    async fn search(&self, text: &str) -> Result<Vec<Recording>, StoreError> {
        let all = self.list().await?;
        Ok(all.into_iter().filter(|r| matches_text(r, text)).collect())
    }

    async fn filter_by_active_app(&self, name: &str) -> Result<Vec<Recording>, StoreError> {
        let all = self.list().await?;
        Ok(all.into_iter().filter(|r| uses_app(r, name)).collect())
    }

    async fn filter_by_system_call_type(
        &self,
        call_type: &str,
    ) -> Result<Vec<Recording>, StoreError> {
        let all = self.list().await?;
        Ok(all
            .into_iter()
            .filter(|r| uses_system_call(r, call_type))
            .collect())
    }

    /// Recordings sharing the most tags with `id`, best first. Recordings with no
    /// shared tag are left out.
    async fn similar_by_tags(&self, id: &str, limit: usize) -> Result<Vec<Recording>, StoreError> {
        let probe = self.get(id).await?;
        let mut scored: Vec<(f64, Recording)> = self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.id != probe.id)
            .map(|r| (tag_similarity(&probe.tags, &r.tags), r))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        Ok(scored.into_iter().take(limit).map(|(_, r)| r).collect())
    }
}

pub fn matches_text(recording: &Recording, text: &str) -> bool {
    let needle = text.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    recording.name.to_lowercase().contains(&needle)
        || recording.description.to_lowercase().contains(&needle)
        || recording
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(&needle))
}

fn uses_app(recording: &Recording, name: &str) -> bool {
    recording.actions.iter().any(|a| {
        a.context
            .active_application
            .as_deref()
            .is_some_and(|app| app.eq_ignore_ascii_case(name))
    })
}

fn uses_system_call(recording: &Recording, call_type: &str) -> bool {
    recording.actions.iter().any(|a| match &a.event {
        ActionEvent::System(sys) => sys
            .system_call
            .as_ref()
            .is_some_and(|c| c.call_type.eq_ignore_ascii_case(call_type)),
        _ => false,
    })
}

/// Jaccard index of two tag sets.
pub fn tag_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn sort_oldest_first(recordings: &mut [Recording]) {
    recordings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
