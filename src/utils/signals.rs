//! Signal handling for graceful shutdown

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use futures::stream::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::{debug, error, info, warn};

use crate::{shutdown::DrainHandle, state::Connection};

/// Terminates the process. Swapped out in tests.
pub trait Exit: Send + Sync + 'static {
    fn exit(&self, code: i32);
}

/// Exits the real process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl Exit for ProcessExit {
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Lets only the first exit request through.
///
/// The force timer and the graceful completion both race to exit; with a real
/// process the loser never runs, but the latch makes the outcome explicit.
#[derive(Clone)]
struct ExitLatch {
    exited: Arc<AtomicBool>,
    requested: Arc<Mutex<Vec<i32>>>,
    exit: Arc<dyn Exit>,
}

impl ExitLatch {
    fn new(exit: Arc<dyn Exit>) -> Self {
        Self {
            exited: Arc::new(AtomicBool::new(false)),
            requested: Arc::new(Mutex::new(Vec::new())),
            exit,
        }
    }

    /// Every exit code asked for, including the ones the latch held back
    fn requested(&self) -> Vec<i32> {
        self.requested.lock().map(|codes| codes.clone()).unwrap_or_default()
    }

    fn exit(&self, code: i32) {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(code);
        }
        if !self.exited.swap(true, Ordering::SeqCst) {
            self.exit.exit(code);
        } else {
            debug!(code, "Process exit already requested");
        }
    }
}

/// Turns termination signals into exactly one graceful shutdown with a hard
/// deadline.
pub struct SignalBridge<C> {
    drain: DrainHandle<C>,
    force_timeout: Duration,
    development: bool,
    triggered: bool,
    latch: ExitLatch,
}

impl<C: Connection> SignalBridge<C> {
    pub fn new(drain: DrainHandle<C>) -> Self {
        let force_timeout = drain.config().force_timeout;
        Self {
            drain,
            force_timeout,
            development: false,
            triggered: false,
            latch: ExitLatch::new(Arc::new(ProcessExit)),
        }
    }

    /// Skip the grace period and exit as soon as a signal arrives
    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn with_exit(mut self, exit: impl Exit) -> Self {
        self.latch = ExitLatch::new(Arc::new(exit));
        self
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Exit codes requested so far by the force timer, the graceful path or
    /// the development fast path, in order
    pub fn exit_requests(&self) -> Vec<i32> {
        self.latch.requested()
    }

    /// React to one delivered signal
    pub fn on_signal(&mut self, signal: i32) {
        if self.development {
            warn!(signal = signal_name(signal), "Development mode, exiting without draining");
            self.latch.exit(1);
            return;
        }

        if self.triggered {
            debug!(signal = signal_name(signal), "Shutdown already in progress, ignoring signal");
            return;
        }
        self.triggered = true;

        warn!(signal = signal_name(signal), "Received kill signal, shutting down");

        let timeout = self.force_timeout;
        let timer_latch = self.latch.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            error!(
                timeout_ms = timeout.as_millis() as u64,
                "Could not close connections in time, forcefully shutting down"
            );
            timer_latch.exit(1);
        })
        .abort_handle();

        let latch = self.latch.clone();
        self.drain.shutdown(move |result| {
            timer.abort();
            match result {
                Ok(()) => info!("Closed out remaining connections"),
                Err(e) => warn!(error = %e, "Closed out remaining connections, listener reported an error"),
            }
            latch.exit(0);
        });
    }

    /// Wait for SIGTERM and SIGINT and feed each one to [`Self::on_signal`]
    pub async fn run(mut self) -> io::Result<()> {
        let mut signals = Signals::new([SIGTERM, SIGINT])?;
        info!("Listening for SIGTERM and SIGINT");

        while let Some(signal) = signals.next().await {
            self.on_signal(signal);
        }

        Ok(())
    }
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGTERM => "SIGTERM",
        SIGINT => "SIGINT",
        _ => "unknown",
    }
}
