//! drain-guard - graceful connection draining for an HTTP server
//!
//! This library tracks which connections are idle or busy, closes the
//! listener on shutdown, reclaims connections as they go idle and bounds
//! how long the whole process may take to exit.

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::{Config, DrainConfig};
pub use error::DrainError;
pub use shutdown::{DrainHandle, Listener, ShutdownCoordinator};
pub use state::{Connection, ConnectionId, ConnectionRegistry, DrainStatus, ShutdownState};
pub use tasks::spawn_drain;
pub use utils::signals::SignalBridge;
