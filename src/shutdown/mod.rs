//! Shutdown coordination module
//!
//! This module contains the coordinator state machine, the events it consumes
//! and the handle other tasks use to reach it.

pub mod coordinator;
pub mod events;
pub mod handle;

// Re-export main types
pub use coordinator::{Listener, ShutdownCoordinator};
pub use events::{DrainEvent, OnComplete};
pub use handle::DrainHandle;
