//! Messages handled by the drain event loop

use tokio::sync::oneshot;

use crate::{
    error::Result,
    state::{ConnectionId, DrainStatus},
};

/// Callback run once a shutdown request has finished closing the listener
pub type OnComplete = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// One discrete event for the coordinator.
///
/// Each lifecycle event maps to exactly one registry or coordinator method.
pub enum DrainEvent<C> {
    ConnectionOpened {
        handle: C,
        reply: oneshot::Sender<ConnectionId>,
    },
    RequestStarted(ConnectionId),
    RequestFinished(ConnectionId),
    ConnectionClosed(ConnectionId),
    Shutdown {
        force: bool,
        on_complete: Option<OnComplete>,
    },
    ListenerClosed(Result<()>),
    Status(oneshot::Sender<DrainStatus>),
}

impl<C> DrainEvent<C> {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            DrainEvent::ConnectionOpened { .. } => "connection_opened",
            DrainEvent::RequestStarted(_) => "request_started",
            DrainEvent::RequestFinished(_) => "request_finished",
            DrainEvent::ConnectionClosed(_) => "connection_closed",
            DrainEvent::Shutdown { .. } => "shutdown",
            DrainEvent::ListenerClosed(_) => "listener_closed",
            DrainEvent::Status(_) => "status",
        }
    }
}
