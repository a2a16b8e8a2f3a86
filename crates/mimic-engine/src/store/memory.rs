use super::{RecordingStore, StoreError, sort_oldest_first};
use async_trait::async_trait;
use mimic_common::{NewRecording, Recording};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    recordings: Arc<RwLock<HashMap<String, Recording>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.recordings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.recordings.read().await.is_empty()
    }
}

#[async_trait]
impl RecordingStore for MemoryStore {
    async fn save(&self, draft: NewRecording) -> Result<String, StoreError> {
        self.insert(Recording::from_draft(draft)).await
    }

    async fn insert(&self, recording: Recording) -> Result<String, StoreError> {
        let id = recording.id.clone();
        self.recordings.write().await.insert(id.clone(), recording);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Recording, StoreError> {
        self.recordings
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Recording>, StoreError> {
        let mut all: Vec<Recording> = self.recordings.read().await.values().cloned().collect();
        sort_oldest_first(&mut all);
        Ok(all)
    }
}
