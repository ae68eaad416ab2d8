//! Utility functions module
//!
//! This module contains process-level signal handling.

pub mod signals;

// Re-export main types
pub use signals::{Exit, ProcessExit, SignalBridge};
