use super::extractor::PatternExtractor;
use crate::store::RecordingStore;
use mimic_common::Pattern;
use std::collections::HashMap;

/// Patterns keyed by their generated id. Never shrinks.
#[derive(Debug, Default)]
pub struct PatternStore {
    patterns: HashMap<String, Pattern>,
    initialized: bool,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// False until a cold start completed. Synthesis still works on whatever is held.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.values()
    }

    pub fn insert(&mut self, pattern: Pattern) -> String {
        let id = pattern.id.clone();
        self.patterns.insert(id.clone(), pattern);
        id
    }

    /// Scans every stored recording and keeps the qualifying ones as patterns.
    ///
    /// A failing store is logged and leaves the pattern store empty; startup goes on.
    pub async fn cold_start(
        &mut self,
        store: &dyn RecordingStore,
        extractor: &PatternExtractor,
    ) -> usize {
        let recordings = match store.search("").await {
            Ok(recordings) => recordings,
            Err(e) => {
                tracing::warn!("Pattern cold start failed, continuing with no patterns: {}", e);
                return 0;
            }
        };

        let scanned = recordings.len();
        let mut added = 0;
        for recording in &recordings {
            if let Some(pattern) = extractor.extract(recording) {
                self.insert(pattern);
                added += 1;
            }
        }

        self.initialized = true;
        tracing::info!(
            "Pattern cold start: {} of {} recordings qualified",
            added,
            scanned
        );
        added
    }
}
