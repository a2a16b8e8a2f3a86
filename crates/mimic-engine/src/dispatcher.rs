use async_trait::async_trait;
pub use mimic_common::DispatchError;
use mimic_common::{KeyboardEvent, MouseEvent, SystemCall, WindowInfo};

/// Known families of system calls a dispatcher can route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemCallKind {
    File,
    Process,
    Network,
    Registry,
    Clipboard,
    Window,
}

impl SystemCallKind {
    pub fn parse(call_type: &str) -> Option<Self> {
        match call_type.to_ascii_lowercase().as_str() {
            "file" | "filesystem" | "fs" => Some(SystemCallKind::File),
            "process" => Some(SystemCallKind::Process),
            "network" | "net" => Some(SystemCallKind::Network),
            "registry" => Some(SystemCallKind::Registry),
            "clipboard" => Some(SystemCallKind::Clipboard),
            "window" => Some(SystemCallKind::Window),
            _ => None,
        }
    }
}

/// The abstract target the replay engine drives. Implementations decide what a
/// dispatched action means (OS injection, a test spy, a log line).
#[async_trait]
pub trait Dispatcher: Send {
    /// Deliver a mouse event.
    async fn mouse(&mut self, event: &MouseEvent) -> Result<(), DispatchError>;

    /// Deliver a keyboard event.
    async fn keyboard(&mut self, event: &KeyboardEvent) -> Result<(), DispatchError>;

    /// Bring a window to the foreground.
    async fn focus_window(&mut self, window: &WindowInfo) -> Result<(), DispatchError> {
        Err(DispatchError::NotSupported(format!(
            "focus_window({})",
            window.title
        )))
    }

    /// Re-issue a recorded system call.
    async fn system_call(
        &mut self,
        kind: SystemCallKind,
        call: &SystemCall,
    ) -> Result<(), DispatchError> {
        let _ = kind;
        Err(DispatchError::NotSupported(format!(
            "system_call({}.{})",
            call.module, call.function
        )))
    }
}

/// Dispatcher that only logs what it would do.
#[derive(Debug, Default)]
pub struct LogDispatcher {
    pub dispatched: usize,
}

#[async_trait]
impl Dispatcher for LogDispatcher {
    async fn mouse(&mut self, event: &MouseEvent) -> Result<(), DispatchError> {
        self.dispatched += 1;
        tracing::info!(
            "mouse {} at ({}, {})",
            event.subtype.as_str(),
            event.coordinates.x,
            event.coordinates.y
        );
        Ok(())
    }

    async fn keyboard(&mut self, event: &KeyboardEvent) -> Result<(), DispatchError> {
        self.dispatched += 1;
        tracing::info!("keyboard {} {:?}", event.subtype.as_str(), event.key);
        Ok(())
    }

    async fn focus_window(&mut self, window: &WindowInfo) -> Result<(), DispatchError> {
        self.dispatched += 1;
        tracing::info!("focus window {:?}", window.title);
        Ok(())
    }

    async fn system_call(
        &mut self,
        kind: SystemCallKind,
        call: &SystemCall,
    ) -> Result<(), DispatchError> {
        self.dispatched += 1;
        tracing::info!("system call {:?} {}.{}", kind, call.module, call.function);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_call_families_case_insensitively() {
        assert_eq!(SystemCallKind::parse("FS"), Some(SystemCallKind::File));
        assert_eq!(SystemCallKind::parse("process"), Some(SystemCallKind::Process));
        assert_eq!(SystemCallKind::parse("kernel_module"), None);
    }
}
