pub mod detectors;
pub mod extractor;
pub mod feedback;
pub mod pattern_store;
pub mod synthesizer;
pub mod variation;

pub use extractor::{PatternExtractor, QualityReport};
pub use feedback::{FeedbackLearner, TaskFeedback};
pub use pattern_store::PatternStore;
pub use synthesizer::{ContextHints, TaskSynthesizer};
pub use variation::{VariationError, VariationGenerator};

use crate::config::{ExtractionConfig, SynthesisConfig};
use crate::store::RecordingStore;
use mimic_common::Recording;
use std::collections::BTreeMap;

/// Pattern learning and task synthesis over a shared pattern store.
#[derive(Debug, Default)]
pub struct AbsoluteZero {
    patterns: PatternStore,
    extractor: PatternExtractor,
    synthesizer: TaskSynthesizer,
    feedback: FeedbackLearner,
}

impl AbsoluteZero {
    pub fn new(extraction: ExtractionConfig, synthesis: SynthesisConfig) -> Self {
        Self {
            patterns: PatternStore::new(),
            extractor: PatternExtractor::new(extraction),
            synthesizer: TaskSynthesizer::new(synthesis),
            feedback: FeedbackLearner::new(),
        }
    }

    /// Cold start from every stored recording. Returns the number of patterns added.
    pub async fn initialize(&mut self, store: &dyn RecordingStore) -> usize {
        self.patterns.cold_start(store, &self.extractor).await
    }

    pub fn generate_future_task(&self, hints: &ContextHints, complexity: f64) -> Recording {
        self.synthesizer.synthesize(&self.patterns, hints, complexity)
    }

    /// Logs the feedback, and learns a pattern from an attached recording of a
    /// successful run when that recording qualifies.
    pub fn record_feedback(&mut self, feedback: TaskFeedback) -> Option<String> {
        let learned = match (&feedback.recording, feedback.success) {
            (Some(recording), true) => self
                .extractor
                .extract(recording)
                .map(|pattern| self.patterns.insert(pattern)),
            _ => None,
        };
        if let Some(id) = &learned {
            tracing::info!("Learned pattern {} from task {}", id, feedback.task_id);
        }
        self.feedback.record(feedback);
        learned
    }

    pub fn knowledge(&self) -> &BTreeMap<String, f64> {
        self.feedback.knowledge()
    }

    pub fn history(&self) -> &[TaskFeedback] {
        self.feedback.history()
    }

    pub fn patterns(&self) -> &PatternStore {
        &self.patterns
    }

    pub fn extractor(&self) -> &PatternExtractor {
        &self.extractor
    }
}
