use thiserror::Error;

/// Failures reported by the persistence collaborator. Propagated unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Recording not found: {0}")]
    NotFound(String),
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A capture source (background probe, GUI scrape) could not deliver.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Capture unavailable: {0}")]
    Unavailable(String),
    #[error("Capture source already disposed")]
    Disposed,
}

/// Errors raised by a replay dispatcher for a single action.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Target not found: {0}")]
    TargetNotFound(String),
    #[error("Dispatch failed: {0}")]
    Failed(String),
    #[error("Operation not supported: {0}")]
    NotSupported(String),
}
