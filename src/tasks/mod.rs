//! Background tasks module
//!
//! This module contains the task that owns the shutdown coordinator.

pub mod event_loop;

// Re-export main functions
pub use event_loop::{drain_event_loop, spawn_drain};
