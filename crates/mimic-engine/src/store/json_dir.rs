use super::{RecordingStore, StoreError, sort_oldest_first};
use async_trait::async_trait;
use mimic_common::{NewRecording, Recording};
use std::path::{Path, PathBuf};
use tokio::fs;

/// One pretty-printed `<id>.json` document per recording under `root`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') || id.contains("..") {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl RecordingStore for JsonDirStore {
    async fn save(&self, draft: NewRecording) -> Result<String, StoreError> {
        self.insert(Recording::from_draft(draft)).await
    }

    async fn insert(&self, recording: Recording) -> Result<String, StoreError> {
        let path = self.path_for(&recording.id)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, recording.to_json()?).await?;
        tracing::debug!("Stored recording {} at {:?}", recording.id, path);
        Ok(recording.id)
    }

    async fn get(&self, id: &str) -> Result<Recording, StoreError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path).await?;
        Ok(Recording::from_json(&content)?)
    }

    /// Documents that cannot be read or parsed are skipped with a warning.
    async fn list(&self) -> Result<Vec<Recording>, StoreError> {
        let mut recordings = Vec::new();
        if !self.root.exists() {
            return Ok(recordings);
        }

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping unreadable recording {:?}: {}", path, e);
                    continue;
                }
            };
            match Recording::from_json(&content) {
                Ok(recording) => recordings.push(recording),
                Err(e) => tracing::warn!("Skipping malformed recording {:?}: {}", path, e),
            }
        }

        sort_oldest_first(&mut recordings);
        Ok(recordings)
    }
}
