//! Turns live input and system signals into an ordered action sequence.
//!
//! `Idle --start--> Recording --stop--> Idle`. Starting while already recording
//! re-arms the session: the buffer is cleared and the clock reset. Direct input
//! and background probes share one append path, so the buffer keeps arrival order.

mod context;
mod probes;
mod session;
pub mod signal;

use crate::capture::{EnvironmentProbe, GuiScraper};
use crate::config::RecorderConfig;
use crate::store::{RecordingStore, StoreError};
use context::{ContextBuilder, GuiHandle};
use mimic_common::{Action, MouseSubtype, NewRecording};
use probes::ProbeSet;
pub use session::RecorderState;
use session::SessionSink;
pub use signal::{InputSignal, KeyboardInput, MouseInput, SystemInput};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Recorder has been disposed")]
    Disposed,
    #[error("Recorder is being disposed")]
    Disposing,
    #[error("Failed to persist recording: {0}")]
    Store(#[from] StoreError),
}

pub struct Recorder {
    config: RecorderConfig,
    sink: SessionSink,
    gui: GuiHandle,
    probes: Option<ProbeSet>,
}

impl Recorder {
    pub fn new(
        config: RecorderConfig,
        env: Arc<dyn EnvironmentProbe>,
        scraper: Box<dyn GuiScraper>,
    ) -> Self {
        let gui = GuiHandle::new(scraper);
        let context_gui = config.capture_gui.then(|| gui.clone());
        Self {
            sink: SessionSink::new(ContextBuilder::new(env, context_gui)),
            gui,
            probes: None,
            config,
        }
    }

    pub async fn state(&self) -> RecorderState {
        self.sink.session.lock().await.state
    }

    pub async fn is_recording(&self) -> bool {
        self.state().await == RecorderState::Recording
    }

    /// Number of background probe tasks currently running.
    pub fn probe_count(&self) -> usize {
        self.probes.as_ref().map_or(0, ProbeSet::len)
    }

    /// Clears the buffer, resets the reference clock and begins capturing.
    pub async fn start(&mut self) -> Result<(), RecorderError> {
        let environment = self.sink.context.environment().await;
        {
            let mut session = self.sink.session.lock().await;
            match session.state {
                RecorderState::Disposed => return Err(RecorderError::Disposed),
                RecorderState::Disposing => return Err(RecorderError::Disposing),
                RecorderState::Recording => tracing::info!("Re-arming active recording session"),
                RecorderState::Idle => {}
            }
            session.buffer.clear();
            session.started_at = Some(Instant::now());
            session.epoch += 1;
            session.environment = environment;
            session.state = RecorderState::Recording;
        }

        if self.config.capture_gui {
            if let Err(e) = self.gui.refresh().await {
                tracing::warn!("Initial GUI capture unavailable, continuing without it: {}", e);
            }
        }

        if self.probes.is_none() {
            let gui = self.config.capture_gui.then(|| self.gui.clone());
            self.probes = Some(ProbeSet::spawn(&self.config, self.sink.clone(), gui));
        }

        tracing::info!("Recording started");
        Ok(())
    }

    /// Feeds one signal. Returns the id of the appended action, or `None` when the
    /// recorder is idle or the signal does not qualify.
    pub async fn record(&self, signal: InputSignal) -> Result<Option<String>, RecorderError> {
        match self.state().await {
            RecorderState::Disposed => return Err(RecorderError::Disposed),
            RecorderState::Disposing => return Err(RecorderError::Disposing),
            RecorderState::Idle => return Ok(None),
            RecorderState::Recording => {}
        }
        if !self.qualifies(&signal) {
            return Ok(None);
        }
        Ok(self.sink.capture(signal.into_event()).await)
    }

    fn qualifies(&self, signal: &InputSignal) -> bool {
        match signal {
            InputSignal::Mouse(m) => {
                m.subtype != MouseSubtype::Move || self.config.capture_mouse_moves
            }
            InputSignal::Keyboard(_) | InputSignal::System(_) => true,
        }
    }

    /// Stops capturing and returns the captured actions.
    pub async fn stop(&mut self) -> Vec<Action> {
        // Probes go first so nothing lands after the snapshot.
        self.probes = None;
        let mut session = self.sink.session.lock().await;
        if session.state == RecorderState::Recording {
            session.state = RecorderState::Idle;
            tracing::info!("Recording stopped with {} actions", session.buffer.len());
        }
        session.buffer.clone()
    }

    /// Current buffer contents without changing state.
    pub async fn snapshot(&self) -> Vec<Action> {
        self.sink.session.lock().await.buffer.clone()
    }

    /// Persists the current buffer together with the environment captured at `start`.
    pub async fn save(
        &self,
        store: &dyn RecordingStore,
        name: &str,
        description: &str,
        tags: &[String],
    ) -> Result<String, RecorderError> {
        let draft = {
            let session = self.sink.session.lock().await;
            NewRecording::new(name, session.buffer.clone())
                .description(description)
                .environment(session.environment.clone())
                .tags(tags.iter().cloned())
        };
        let id = store.save(draft).await?;
        tracing::info!("Saved recording {} as {}", name, id);
        Ok(id)
    }

    /// Releases probes and the GUI scraper. Safe to call more than once.
    pub async fn dispose(&mut self) {
        {
            let mut session = self.sink.session.lock().await;
            if matches!(
                session.state,
                RecorderState::Disposed | RecorderState::Disposing
            ) {
                return;
            }
            session.state = RecorderState::Disposing;
        }

        self.probes = None;
        self.gui.dispose().await;

        self.sink.session.lock().await.state = RecorderState::Disposed;
        tracing::info!("Recorder disposed");
    }
}
