//! State management module
//!
//! This module contains the connection registry and the shutdown state machine.

pub mod connection;
pub mod registry;
pub mod shutdown_state;

// Re-export main types
pub use connection::{Connection, ConnectionId};
pub use registry::{ConnectionRecord, ConnectionRegistry};
pub use shutdown_state::{DrainStatus, ShutdownState};
