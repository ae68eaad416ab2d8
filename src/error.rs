//! Error types shared by the drain machinery

use thiserror::Error;

/// Errors surfaced to shutdown completion callbacks.
///
/// Cloneable so a single listener-close outcome can be handed to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrainError {
    /// The listener was already closed, or its accept loop is gone
    #[error("listener is not running")]
    NotRunning,

    /// The listener reported a failure while closing
    #[error("failed to close listener: {0}")]
    ListenerClose(String),

    /// The drain event loop has stopped and can no longer take events
    #[error("drain event loop has stopped")]
    EventLoopClosed,
}

pub type Result<T> = std::result::Result<T, DrainError>;
