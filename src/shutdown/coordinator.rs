//! Shutdown coordinator: drives the listener close and decides which
//! connections to destroy.

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::events::{DrainEvent, OnComplete};
use crate::{
    error::Result,
    state::{Connection, ConnectionId, ConnectionRegistry, DrainStatus, ShutdownState},
};

/// The listener side of the wrapped server.
///
/// `close` stops accepting new connections. The returned future resolves once
/// the listener has fully closed.
pub trait Listener: Send + 'static {
    fn close(&mut self) -> BoxFuture<'static, Result<()>>;
}

/// Owns the shutdown state machine and the connection registry.
///
/// All methods run on the drain event loop, one event at a time.
pub struct ShutdownCoordinator<C, L> {
    state: ShutdownState,
    registry: ConnectionRegistry<C>,
    listener: L,
    events: mpsc::WeakUnboundedSender<DrainEvent<C>>,
    pending: Vec<OnComplete>,
    close_result: Option<Result<()>>,
}

impl<C: Connection, L: Listener> ShutdownCoordinator<C, L> {
    pub fn new(listener: L, events: mpsc::WeakUnboundedSender<DrainEvent<C>>) -> Self {
        Self {
            state: ShutdownState::Active,
            registry: ConnectionRegistry::new(),
            listener,
            events,
            pending: Vec::new(),
            close_result: None,
        }
    }

    pub fn state(&self) -> ShutdownState {
        self.state
    }

    pub fn registry(&self) -> &ConnectionRegistry<C> {
        &self.registry
    }

    pub fn status(&self) -> DrainStatus {
        DrainStatus {
            state: self.state,
            connections: self.registry.len(),
            idle: self.registry.idle_count(),
            busy: self.registry.busy_count(),
        }
    }

    /// Apply one event from the loop
    pub fn handle(&mut self, event: DrainEvent<C>) {
        match event {
            DrainEvent::ConnectionOpened { handle, reply } => {
                let id = self.connection_opened(handle);
                if reply.send(id).is_err() {
                    // Nobody is left to serve the connection
                    self.registry.destroy_eligible(id, true);
                }
            }
            DrainEvent::RequestStarted(id) => self.registry.mark_busy(id),
            DrainEvent::RequestFinished(id) => self.request_finished(id),
            DrainEvent::ConnectionClosed(id) => self.registry.remove_connection(id),
            DrainEvent::Shutdown { force, on_complete } => self.shutdown(force, on_complete),
            DrainEvent::ListenerClosed(result) => self.listener_closed(result),
            DrainEvent::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    pub fn connection_opened(&mut self, handle: C) -> ConnectionId {
        let id = self.registry.register_connection(handle);
        debug!(id = %id, open = self.registry.len(), "Connection opened");

        // Accepted before the listener stopped but seen after the sweep
        if !self.state.is_active() && self.registry.destroy_eligible(id, false) {
            debug!(id = %id, state = %self.state, "Reclaimed connection opened during shutdown");
        }
        id
    }

    /// Mark the connection idle and reclaim it if a shutdown is waiting on it
    pub fn request_finished(&mut self, id: ConnectionId) {
        self.registry.mark_idle(id);
        if self.registry.destroy_eligible(id, false) {
            debug!(id = %id, "Reclaimed connection after its request finished");
        }
    }

    /// Stop accepting connections and destroy every eligible one.
    ///
    /// Only the call that moves the state out of `Active` closes the listener.
    /// Every call sweeps the registry once and gets its own completion.
    pub fn shutdown(&mut self, force: bool, on_complete: Option<OnComplete>) {
        let first = self.state.begin_draining();
        self.registry.begin_draining();

        if first {
            info!(force, open = self.registry.len(), "Closing listener and draining connections");
            self.close_listener();
        } else {
            debug!(force, state = %self.state, "Shutdown already in progress");
        }

        if let Some(callback) = on_complete {
            match &self.close_result {
                Some(result) => defer(callback, result.clone()),
                None => self.pending.push(callback),
            }
        }

        let destroyed = self.sweep(force);
        info!(destroyed, remaining = self.registry.len(), "Swept connections");
    }

    /// Record the listener close outcome and release waiting callbacks
    pub fn listener_closed(&mut self, result: Result<()>) {
        match &result {
            Ok(()) => info!("Listener closed"),
            Err(e) => warn!(error = %e, "Listener close reported an error"),
        }
        self.state.terminate();

        for callback in self.pending.drain(..) {
            defer(callback, result.clone());
        }
        self.close_result = Some(result);
    }

    fn close_listener(&mut self) {
        let close = self.listener.close();
        let events = self.events.upgrade();
        tokio::spawn(async move {
            let result = close.await;
            if let Some(events) = events {
                if events.send(DrainEvent::ListenerClosed(result)).is_err() {
                    debug!("Drain event loop stopped before the listener closed");
                }
            }
        });
    }

    fn sweep(&mut self, force: bool) -> usize {
        self.registry
            .snapshot_ids()
            .into_iter()
            .filter(|&id| self.registry.destroy_eligible(id, force))
            .count()
    }
}

/// Run a completion callback on a later scheduling turn
pub(crate) fn defer(callback: OnComplete, result: Result<()>) {
    tokio::spawn(async move {
        callback(result);
    });
}
