//! Per-connection serving and lifecycle reporting

use std::{convert::Infallible, sync::Arc};

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use futures::stream::StreamExt;
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use tokio::{net::TcpStream, sync::Notify};
use tower::ServiceExt;
use tracing::debug;

use crate::{
    shutdown::DrainHandle,
    state::{Connection, ConnectionId},
};

/// Destroy handle for a connection task: tripping it drops the socket
#[derive(Debug, Clone, Default)]
pub struct KillSwitch {
    notify: Arc<Notify>,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once the switch has been tripped
    pub async fn killed(&self) {
        self.notify.notified().await;
    }
}

impl Connection for KillSwitch {
    fn destroy(&self) {
        // notify_one keeps a permit, so a kill before the task waits is not lost
        self.notify.notify_one();
    }
}

/// Reports `connection_closed` however the task ends, including when killed
struct ConnectionGuard {
    id: ConnectionId,
    drain: DrainHandle<KillSwitch>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.drain.connection_closed(self.id);
    }
}

/// Reports `request_finished` when dropped.
///
/// It rides inside the response body, so it is dropped once hyper is done
/// writing the response, or when the request is abandoned.
struct RequestGuard {
    id: ConnectionId,
    drain: DrainHandle<KillSwitch>,
}

impl RequestGuard {
    fn start(id: ConnectionId, drain: DrainHandle<KillSwitch>) -> Self {
        drain.request_started(id);
        Self { id, drain }
    }

    fn attach(self, response: Response<Body>) -> Response<Body> {
        let (parts, body) = response.into_parts();
        let stream = body.into_data_stream().map(move |chunk| {
            let _guard = &self;
            chunk
        });
        Response::from_parts(parts, Body::from_stream(stream))
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.drain.request_finished(self.id);
    }
}

/// Serve HTTP/1 requests on one connection until the peer leaves or the
/// kill switch is tripped.
pub async fn serve_connection(
    stream: TcpStream,
    id: ConnectionId,
    kill: KillSwitch,
    router: Router,
    drain: DrainHandle<KillSwitch>,
) {
    let _closed = ConnectionGuard { id, drain: drain.clone() };

    let service = service_fn(move |request: Request<Incoming>| {
        let router = router.clone();
        let guard = RequestGuard::start(id, drain.clone());
        async move {
            let response = router.oneshot(request).await?;
            Ok::<_, Infallible>(guard.attach(response))
        }
    });

    let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);

    tokio::select! {
        result = connection => {
            if let Err(e) = result {
                debug!(id = %id, error = %e, "Connection ended with an error");
            }
        }
        _ = kill.killed() => {
            debug!(id = %id, "Connection destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_kill_before_wait_is_remembered() {
        let kill = KillSwitch::new();
        kill.destroy();

        let result = tokio::time::timeout(Duration::from_millis(100), kill.killed()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_the_switch() {
        let kill = KillSwitch::new();
        let handle = kill.clone();

        let waiter = tokio::spawn(async move { kill.killed().await });
        handle.destroy();

        let result = tokio::time::timeout(Duration::from_millis(100), waiter).await;
        assert!(result.is_ok());
    }
}
