//! HTTP server module
//!
//! This module contains the accept loop that reports connection lifecycle
//! events to the drain coordinator and honours its listener close.

pub mod connection;
pub mod listener;

use std::{io, net::SocketAddr, time::Duration};

use axum::Router;
use tokio::{
    net::TcpListener,
    task::{JoinError, JoinHandle, JoinSet},
};
use tracing::{debug, info, warn};

use crate::{config::DrainConfig, shutdown::DrainHandle, tasks::spawn_drain};

pub use connection::{serve_connection, KillSwitch};
pub use listener::{close_channel, CloseRequest, ListenerCloser};

/// A server started by [`start`]
pub struct RunningServer {
    pub drain: DrainHandle<KillSwitch>,
    pub local_addr: SocketAddr,
    pub task: JoinHandle<()>,
}

/// Wire a bound listener to a fresh drain coordinator and start serving
pub fn start(listener: TcpListener, router: Router, config: DrainConfig) -> io::Result<RunningServer> {
    let local_addr = listener.local_addr()?;
    let (closer, close) = close_channel();
    let drain = spawn_drain(closer, config);
    let task = tokio::spawn(serve(listener, router, drain.clone(), close));

    Ok(RunningServer { drain, local_addr, task })
}

/// Accept connections until a close is requested, then wait for every open
/// connection to end before acknowledging the close.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    drain: DrainHandle<KillSwitch>,
    mut close: CloseRequest,
) {
    let mut connections = JoinSet::new();

    let ack = loop {
        tokio::select! {
            ack = close.requested() => break ack,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let kill = KillSwitch::new();
                    let id = match drain.connection_opened(kill.clone()).await {
                        Ok(id) => id,
                        Err(e) => {
                            warn!(peer = %peer, error = %e, "Dropping connection, drain coordinator is gone");
                            continue;
                        }
                    };
                    debug!(id = %id, peer = %peer, "Accepted connection");
                    connections.spawn(serve_connection(stream, id, kill, router.clone(), drain.clone()));
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            },
            Some(result) = connections.join_next(), if !connections.is_empty() => {
                reap_connection(result);
            }
        }
    };

    drop(listener);
    info!(open = connections.len(), "Stopped accepting, waiting for open connections to end");

    while let Some(result) = connections.join_next().await {
        reap_connection(result);
    }

    match ack {
        Some(ack) => {
            let _ = ack.send(Ok(()));
        }
        None => debug!("Listener closer dropped without a close request"),
    }
}

/// Log a finished connection task. Returns false if the task panicked or was
/// cancelled.
fn reap_connection(result: Result<(), JoinError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Connection task failed");
            false
        }
    }
}
