//! Shutdown state machine and status snapshot

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the server is in its shutdown lifecycle.
///
/// Transitions only move forward: `Active -> Draining -> Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownState {
    #[default]
    Active,
    Draining,
    Terminated,
}

impl ShutdownState {
    /// Enter `Draining`. Returns true only for the caller that crossed the
    /// `Active -> Draining` edge.
    pub fn begin_draining(&mut self) -> bool {
        match self {
            ShutdownState::Active => {
                *self = ShutdownState::Draining;
                true
            }
            _ => false,
        }
    }

    /// Enter `Terminated` once the listener has finished closing
    pub fn terminate(&mut self) {
        *self = ShutdownState::Terminated;
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ShutdownState::Active)
    }
}

impl fmt::Display for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownState::Active => "active",
            ShutdownState::Draining => "draining",
            ShutdownState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Snapshot of the drain state reported by the event loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainStatus {
    pub state: ShutdownState,
    pub connections: usize,
    pub idle: usize,
    pub busy: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_transition_wins() {
        let mut state = ShutdownState::default();
        assert!(state.is_active());

        assert!(state.begin_draining());
        assert!(!state.begin_draining());
        assert_eq!(state, ShutdownState::Draining);
    }

    #[test]
    fn test_never_returns_to_active() {
        let mut state = ShutdownState::Active;
        state.begin_draining();
        state.terminate();

        assert!(!state.begin_draining());
        assert_eq!(state, ShutdownState::Terminated);
        assert_eq!(state.to_string(), "terminated");
    }
}
