use super::context::ContextBuilder;
use mimic_common::{Action, ActionContext, ActionEvent, Environment};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Disposing,
    Disposed,
}

pub(crate) struct Session {
    pub state: RecorderState,
    /// Bumped on every `start`, so late signals from a previous session are dropped.
    pub epoch: u64,
    pub started_at: Option<Instant>,
    pub buffer: Vec<Action>,
    pub environment: Environment,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            epoch: 0,
            started_at: None,
            buffer: Vec::new(),
            environment: Environment::default(),
        }
    }
}

/// Shared append path for direct input and background probes.
#[derive(Clone)]
pub(crate) struct SessionSink {
    pub session: Arc<Mutex<Session>>,
    pub context: ContextBuilder,
}

impl SessionSink {
    pub fn new(context: ContextBuilder) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            context,
        }
    }

    /// Appends `event` in arrival order and returns its id, or `None` when no
    /// session is recording.
    ///
    /// The slot and timestamp are taken under the lock before any collaborator is
    /// consulted; context and mouse target are filled in afterwards.
    pub async fn capture(&self, event: ActionEvent) -> Option<String> {
        let point = match &event {
            ActionEvent::Mouse(mouse) if mouse.target.is_none() => {
                Some((mouse.coordinates.x, mouse.coordinates.y))
            }
            _ => None,
        };
        let slot = self.reserve(event).await?;

        let context = self.context.snapshot().await;
        let target = match point {
            Some((x, y)) => self.context.target_at(x, y).await,
            None => None,
        };

        let mut session = self.session.lock().await;
        if session.epoch != slot.epoch {
            tracing::debug!("Dropping context for {} from a previous session", slot.id);
            return None;
        }
        if let Some(action) = session
            .buffer
            .get_mut(slot.index)
            .filter(|a| a.id == slot.id)
        {
            action.context = context;
            if let (ActionEvent::Mouse(mouse), Some(target)) = (&mut action.event, target) {
                mouse.target = Some(target);
            }
        }
        Some(slot.id)
    }

    async fn reserve(&self, mut event: ActionEvent) -> Option<Slot> {
        let mut session = self.session.lock().await;
        if session.state != RecorderState::Recording {
            return None;
        }

        let timestamp = session
            .started_at
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or(0);
        event.set_timestamp(timestamp);
        if let ActionEvent::System(sys) = &mut event {
            if let Some(call) = sys.system_call.as_mut() {
                call.timestamp = timestamp;
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("Captured {} as {} at {}ms", event.token(), id, timestamp);
        let index = session.buffer.len();
        session.buffer.push(Action {
            id: id.clone(),
            event,
            context: ActionContext::default(),
        });
        Some(Slot {
            epoch: session.epoch,
            index,
            id,
        })
    }
}

struct Slot {
    epoch: u64,
    index: usize,
    id: String,
}
