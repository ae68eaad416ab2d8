//! Drain event loop background task

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::{
    config::DrainConfig,
    shutdown::{DrainEvent, DrainHandle, Listener, ShutdownCoordinator},
    state::Connection,
};

/// Start the coordinator on its own task and return a handle to it
pub fn spawn_drain<C, L>(listener: L, config: DrainConfig) -> DrainHandle<C>
where
    C: Connection,
    L: Listener,
{
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let coordinator = ShutdownCoordinator::new(listener, events_tx.downgrade());

    tokio::spawn(drain_event_loop(coordinator, events_rx));

    DrainHandle::new(events_tx, config)
}

/// Apply events to the coordinator one at a time until every handle is gone
pub async fn drain_event_loop<C, L>(
    mut coordinator: ShutdownCoordinator<C, L>,
    mut events: mpsc::UnboundedReceiver<DrainEvent<C>>,
) where
    C: Connection,
    L: Listener,
{
    info!("Starting drain event loop");

    while let Some(event) = events.recv().await {
        trace!(event = event.kind(), "Handling drain event");
        coordinator.handle(event);
    }

    debug!(state = %coordinator.state(), "Drain event loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::DrainError,
        shutdown::coordinator::tests::FakeListener,
        state::{registry::tests::CountingConnection, ShutdownState},
    };
    use std::time::Duration;

    fn config() -> DrainConfig {
        DrainConfig::new(Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_lifecycle_events_update_status() {
        let drain = spawn_drain(FakeListener::new(Ok(())), config());

        let a = drain.connection_opened(CountingConnection::default()).await.unwrap();
        let b = drain.connection_opened(CountingConnection::default()).await.unwrap();
        drain.request_started(b);

        let status = drain.status().await.unwrap();
        assert_eq!(status.state, ShutdownState::Active);
        assert_eq!((status.connections, status.idle, status.busy), (2, 1, 1));

        drain.connection_closed(a);
        drain.request_finished(b);

        let status = drain.status().await.unwrap();
        assert_eq!((status.connections, status.idle, status.busy), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_shutdown_and_wait_drains_busy_connection() {
        let listener = FakeListener::new(Ok(()));
        let drain = spawn_drain(listener.clone(), config());
        let busy = CountingConnection::default();
        let id = drain.connection_opened(busy.clone()).await.unwrap();
        drain.request_started(id);

        let waiter = {
            let drain = drain.clone();
            tokio::spawn(async move { drain.shutdown_and_wait().await })
        };
        tokio::task::yield_now().await;

        let status = drain.status().await.unwrap();
        assert_eq!(status.busy, 1);
        assert_eq!(busy.destroyed(), 0);

        drain.request_finished(id);
        assert_eq!(waiter.await.unwrap(), Ok(()));

        let status = drain.status().await.unwrap();
        assert_eq!(status.state, ShutdownState::Terminated);
        assert_eq!(status.connections, 0);
        assert_eq!(busy.destroyed(), 1);
        assert_eq!(listener.closes(), 1);
    }

    #[tokio::test]
    async fn test_connection_registered_after_shutdown_is_reclaimed() {
        let drain = spawn_drain(FakeListener::new(Ok(())), config());
        assert_eq!(drain.shutdown_and_wait().await, Ok(()));

        let late = CountingConnection::default();
        drain.connection_opened(late.clone()).await.unwrap();

        let status = drain.status().await.unwrap();
        assert_eq!(status.connections, 0);
        assert_eq!(late.destroyed(), 1);
    }

    #[tokio::test]
    async fn test_force_shutdown_and_wait() {
        let drain = spawn_drain(FakeListener::new(Ok(())), config());
        let busy = CountingConnection::default();
        let id = drain.connection_opened(busy.clone()).await.unwrap();
        drain.request_started(id);

        assert_eq!(drain.force_shutdown_and_wait().await, Ok(()));
        assert_eq!(busy.destroyed(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_shutdowns_each_complete_once() {
        let listener = FakeListener::new(Ok(()));
        let drain: DrainHandle<CountingConnection> = spawn_drain(listener.clone(), config());

        let (first, second) = tokio::join!(drain.shutdown_and_wait(), drain.force_shutdown_and_wait());

        assert_eq!(first, Ok(()));
        assert_eq!(second, Ok(()));
        assert_eq!(listener.closes(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_after_loop_stopped_reports_error() {
        let (events_tx, events_rx) = mpsc::unbounded_channel::<DrainEvent<CountingConnection>>();
        drop(events_rx);
        let drain = DrainHandle::new(events_tx, config());

        assert_eq!(drain.shutdown_and_wait().await, Err(DrainError::EventLoopClosed));
        assert_eq!(drain.status().await, Err(DrainError::EventLoopClosed));
    }
}
