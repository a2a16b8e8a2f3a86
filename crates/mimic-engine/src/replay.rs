//! Deterministic re-dispatch of a recorded action sequence.
//!
//! Actions are dispatched strictly one at a time. Between two actions the engine
//! sleeps for the gap between their timestamps. Stopping is cooperative and only
//! observed between actions; a dispatch in flight always completes.

use crate::dispatcher::{DispatchError, Dispatcher, SystemCallKind};
use mimic_common::{Action, ActionEvent, Recording, SystemSubtype};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Replay target not found for action {action_id}: {target}")]
    TargetNotFound { action_id: String, target: String },

    #[error("Dispatch failed for action {action_id}: {reason}")]
    DispatchFailed { action_id: String, reason: String },

    #[error("Unknown system call '{call_type}' in action {action_id}")]
    UnknownSystemCall { action_id: String, call_type: String },
}

impl ReplayError {
    fn from_dispatch(action_id: &str, err: DispatchError) -> Self {
        match err {
            DispatchError::TargetNotFound(target) => ReplayError::TargetNotFound {
                action_id: action_id.to_string(),
                target,
            },
            other => ReplayError::DispatchFailed {
                action_id: action_id.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Non-fatal errors are reported and skipped; everything else aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ReplayError::UnknownSystemCall { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    /// Actions handed to the dispatcher, skipped ones included.
    pub dispatched: usize,
    /// Ids of actions skipped as unknown system calls.
    pub skipped: Vec<String>,
    /// The run ended early because of `stop`.
    pub stopped: bool,
    /// `play` was called while another run was active, or with nothing loaded.
    pub no_op: bool,
}

/// Cloneable handle that requests a running playback to stop.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Cloneable, read-only view of playback progress.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    cursor: Arc<AtomicUsize>,
    length: Arc<AtomicUsize>,
}

impl ProgressHandle {
    /// `cursor / length` as a percentage; 0 when nothing is loaded.
    pub fn percent(&self) -> f64 {
        progress(
            self.cursor.load(Ordering::SeqCst),
            self.length.load(Ordering::SeqCst),
        )
    }
}

fn progress(cursor: usize, length: usize) -> f64 {
    if length == 0 {
        0.0
    } else {
        cursor as f64 / length as f64 * 100.0
    }
}

/// Clears the playing flag on every exit path of `play`.
struct PlayingGuard<'a>(&'a AtomicBool);

impl Drop for PlayingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct ReplayEngine {
    actions: Vec<Action>,
    cursor: Arc<AtomicUsize>,
    length: Arc<AtomicUsize>,
    playing: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
}

impl ReplayEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the loaded sequence and rewinds. Allowed in any state.
    pub fn load(&mut self, recording: &Recording) {
        self.load_actions(recording.actions.clone());
    }

    pub fn load_actions(&mut self, actions: Vec<Action>) {
        self.length.store(actions.len(), Ordering::SeqCst);
        self.cursor.store(0, Ordering::SeqCst);
        self.actions = actions;
        tracing::debug!("Loaded {} actions for replay", self.actions.len());
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.cancel.clone())
    }

    pub fn progress_handle(&self) -> ProgressHandle {
        ProgressHandle {
            cursor: self.cursor.clone(),
            length: self.length.clone(),
        }
    }

    pub fn progress(&self) -> f64 {
        progress(self.cursor.load(Ordering::SeqCst), self.actions.len())
    }

    /// Plays from the cursor to the end. A finished sequence restarts from the top.
    ///
    /// The first fatal dispatch error aborts the run and is returned; the cursor
    /// stays on the failing action.
    pub async fn play<D: Dispatcher + ?Sized>(
        &mut self,
        dispatcher: &mut D,
    ) -> Result<ReplaySummary, ReplayError> {
        if self.actions.is_empty() || self.playing.swap(true, Ordering::SeqCst) {
            return Ok(ReplaySummary {
                no_op: true,
                ..Default::default()
            });
        }
        let _guard = PlayingGuard(&self.playing);
        self.cancel.store(false, Ordering::SeqCst);

        let len = self.actions.len();
        let mut start = self.cursor.load(Ordering::SeqCst);
        if start >= len {
            start = 0;
            self.cursor.store(0, Ordering::SeqCst);
        }

        tracing::info!("Replaying {} actions from index {}", len - start, start);
        let mut summary = ReplaySummary::default();

        for index in start..len {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::info!("Replay stopped at index {}", index);
                summary.stopped = true;
                break;
            }

            let action = &self.actions[index];
            match dispatch(dispatcher, action).await {
                Ok(()) => {}
                Err(e) if !e.is_fatal() => {
                    tracing::warn!("Skipping action: {}", e);
                    summary.skipped.push(action.id.clone());
                }
                Err(e) => {
                    tracing::error!("Replay aborted: {}", e);
                    return Err(e);
                }
            }
            summary.dispatched += 1;
            self.cursor.store(index + 1, Ordering::SeqCst);

            if let Some(next) = self.actions.get(index + 1) {
                let delay = next.timestamp().saturating_sub(action.timestamp());
                if delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }

        Ok(summary)
    }
}

async fn dispatch<D: Dispatcher + ?Sized>(
    dispatcher: &mut D,
    action: &Action,
) -> Result<(), ReplayError> {
    let result = match &action.event {
        ActionEvent::Mouse(event) => dispatcher.mouse(event).await,
        ActionEvent::Keyboard(event) => dispatcher.keyboard(event).await,
        ActionEvent::System(event) => {
            if let Some(call) = &event.system_call {
                let Some(kind) = SystemCallKind::parse(&call.call_type) else {
                    return Err(ReplayError::UnknownSystemCall {
                        action_id: action.id.clone(),
                        call_type: call.call_type.clone(),
                    });
                };
                dispatcher.system_call(kind, call).await
            } else {
                match (event.subtype, &event.window) {
                    (SystemSubtype::WindowChange, Some(window)) => {
                        dispatcher.focus_window(window).await
                    }
                    (SystemSubtype::Unknown, _) => {
                        return Err(ReplayError::UnknownSystemCall {
                            action_id: action.id.clone(),
                            call_type: event.subtype.as_str().to_string(),
                        });
                    }
                    // Observations (process/service/resource samples) have nothing to re-issue.
                    _ => Ok(()),
                }
            }
        }
    };
    result.map_err(|e| ReplayError::from_dispatch(&action.id, e))
}
