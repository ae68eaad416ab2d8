//! Cloneable front door to the drain event loop

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::{
    coordinator::defer,
    events::{DrainEvent, OnComplete},
};
use crate::{
    config::DrainConfig,
    error::{DrainError, Result},
    state::{ConnectionId, DrainStatus},
};

/// Handle used by the server and the signal bridge to talk to the coordinator.
///
/// Every method only enqueues an event; the coordinator applies them in order
/// on its own task.
pub struct DrainHandle<C> {
    events: mpsc::UnboundedSender<DrainEvent<C>>,
    config: DrainConfig,
}

impl<C> Clone for DrainHandle<C> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
            config: self.config,
        }
    }
}

impl<C: Send + 'static> DrainHandle<C> {
    pub fn new(events: mpsc::UnboundedSender<DrainEvent<C>>, config: DrainConfig) -> Self {
        Self { events, config }
    }

    pub fn config(&self) -> &DrainConfig {
        &self.config
    }

    /// Register a freshly accepted connection and get its id
    pub async fn connection_opened(&self, handle: C) -> Result<ConnectionId> {
        let (reply, rx) = oneshot::channel();
        self.events
            .send(DrainEvent::ConnectionOpened { handle, reply })
            .map_err(|_| DrainError::EventLoopClosed)?;
        rx.await.map_err(|_| DrainError::EventLoopClosed)
    }

    pub fn request_started(&self, id: ConnectionId) {
        self.send(DrainEvent::RequestStarted(id));
    }

    pub fn request_finished(&self, id: ConnectionId) {
        self.send(DrainEvent::RequestFinished(id));
    }

    pub fn connection_closed(&self, id: ConnectionId) {
        self.send(DrainEvent::ConnectionClosed(id));
    }

    /// Graceful shutdown: idle connections now, busy ones when they finish
    pub fn shutdown<F>(&self, on_complete: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.request_shutdown(false, Some(Box::new(on_complete)));
    }

    /// Destroy every connection immediately
    pub fn force_shutdown<F>(&self, on_complete: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.request_shutdown(true, Some(Box::new(on_complete)));
    }

    pub async fn shutdown_and_wait(&self) -> Result<()> {
        self.wait_for_shutdown(false).await
    }

    pub async fn force_shutdown_and_wait(&self) -> Result<()> {
        self.wait_for_shutdown(true).await
    }

    /// Send a shutdown request. A missing event loop still completes the
    /// callback, with [`DrainError::EventLoopClosed`].
    pub fn request_shutdown(&self, force: bool, on_complete: Option<OnComplete>) {
        let event = DrainEvent::Shutdown { force, on_complete };
        if let Err(mpsc::error::SendError(event)) = self.events.send(event) {
            if let DrainEvent::Shutdown { on_complete: Some(callback), .. } = event {
                defer(callback, Err(DrainError::EventLoopClosed));
            }
        }
    }

    pub async fn status(&self) -> Result<DrainStatus> {
        let (reply, rx) = oneshot::channel();
        self.events
            .send(DrainEvent::Status(reply))
            .map_err(|_| DrainError::EventLoopClosed)?;
        rx.await.map_err(|_| DrainError::EventLoopClosed)
    }

    async fn wait_for_shutdown(&self, force: bool) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.request_shutdown(
            force,
            Some(Box::new(move |result| {
                let _ = done.send(result);
            })),
        );
        rx.await.map_err(|_| DrainError::EventLoopClosed)?
    }

    fn send(&self, event: DrainEvent<C>) {
        if let Err(mpsc::error::SendError(event)) = self.events.send(event) {
            debug!(event = event.kind(), "Drain event loop has stopped, dropping event");
        }
    }
}
