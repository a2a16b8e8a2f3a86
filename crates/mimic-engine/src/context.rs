//! Explicitly wired application services with a start/shutdown lifecycle.

use crate::capture::{EnvironmentProbe, GuiScraper};
use crate::config::MimicConfig;
use crate::learner::{AbsoluteZero, ContextHints, TaskFeedback};
use crate::recorder::Recorder;
use crate::replay::ReplayEngine;
use crate::store::RecordingStore;
use crate::translator::Translator;
use mimic_common::Recording;
use std::sync::Arc;

pub struct MimicContext {
    config: MimicConfig,
    store: Arc<dyn RecordingStore>,
    pub recorder: Recorder,
    pub replay: ReplayEngine,
    pub translator: Translator,
    pub learner: AbsoluteZero,
    started: bool,
}

impl MimicContext {
    pub fn new(
        config: MimicConfig,
        store: Arc<dyn RecordingStore>,
        env: Arc<dyn EnvironmentProbe>,
        scraper: Box<dyn GuiScraper>,
    ) -> Self {
        Self {
            recorder: Recorder::new(config.recorder.clone(), env, scraper),
            replay: ReplayEngine::new(),
            translator: Translator::new(),
            learner: AbsoluteZero::new(config.extraction.clone(), config.synthesis.clone()),
            store,
            config,
            started: false,
        }
    }

    pub fn config(&self) -> &MimicConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn RecordingStore {
        self.store.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Runs the pattern cold start. A second call is a no-op.
    pub async fn start(&mut self) -> usize {
        if self.started {
            return self.learner.patterns().len();
        }
        let added = self.learner.initialize(self.store.as_ref()).await;
        self.started = true;
        tracing::info!("Context started with {} patterns", added);
        added
    }

    pub fn generate_future_task(&self, hints: &ContextHints, complexity: f64) -> Recording {
        self.learner.generate_future_task(hints, complexity)
    }

    pub fn record_feedback(&mut self, feedback: TaskFeedback) -> Option<String> {
        self.learner.record_feedback(feedback)
    }

    /// Stops playback and disposes the recorder.
    pub async fn shutdown(&mut self) {
        self.replay.stop();
        self.recorder.dispose().await;
        self.started = false;
        tracing::info!("Context shut down");
    }
}
