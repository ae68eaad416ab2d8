//! Close control for the accept loop

use futures::{future::BoxFuture, FutureExt};
use tokio::sync::oneshot;

use crate::{
    error::{DrainError, Result},
    shutdown::Listener,
};

/// Sent to the accept loop; answered once every connection task has ended
type CloseAck = oneshot::Sender<Result<()>>;

/// Coordinator-side half: asks the accept loop to stop
#[derive(Debug)]
pub struct ListenerCloser {
    stop: Option<oneshot::Sender<CloseAck>>,
}

/// Accept-loop half: resolves when a close was requested
#[derive(Debug)]
pub struct CloseRequest {
    stop: oneshot::Receiver<CloseAck>,
}

/// Create a linked closer / request pair
pub fn close_channel() -> (ListenerCloser, CloseRequest) {
    let (tx, rx) = oneshot::channel();
    (ListenerCloser { stop: Some(tx) }, CloseRequest { stop: rx })
}

impl Listener for ListenerCloser {
    fn close(&mut self) -> BoxFuture<'static, Result<()>> {
        let Some(stop) = self.stop.take() else {
            return futures::future::ready(Err(DrainError::NotRunning)).boxed();
        };

        let (ack, done) = oneshot::channel();
        if stop.send(ack).is_err() {
            return futures::future::ready(Err(DrainError::NotRunning)).boxed();
        }

        async move { done.await.unwrap_or(Err(DrainError::NotRunning)) }.boxed()
    }
}

impl CloseRequest {
    /// Wait for a close. `None` means the closer was dropped without asking.
    pub async fn requested(&mut self) -> Option<CloseAck> {
        (&mut self.stop).await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_waits_for_ack() {
        let (mut closer, mut request) = close_channel();

        let close = closer.close();
        let ack = request.requested().await.unwrap();
        ack.send(Ok(())).unwrap();

        assert_eq!(close.await, Ok(()));
    }

    #[tokio::test]
    async fn test_second_close_is_not_running() {
        let (mut closer, _request) = close_channel();

        let _first = closer.close();
        assert_eq!(closer.close().await, Err(DrainError::NotRunning));
    }

    #[tokio::test]
    async fn test_close_after_accept_loop_gone() {
        let (mut closer, request) = close_channel();
        drop(request);

        assert_eq!(closer.close().await, Err(DrainError::NotRunning));
    }

    #[tokio::test]
    async fn test_dropped_ack_is_not_running() {
        let (mut closer, mut request) = close_channel();

        let close = closer.close();
        drop(request.requested().await);

        assert_eq!(close.await, Err(DrainError::NotRunning));
    }
}
