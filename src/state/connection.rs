//! Connection identity and the destroy capability the registry relies on

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque connection identifier, assigned in increasing order at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A non-owning handle to a connection owned by the server.
///
/// The registry never opens or frees connections itself; it only asks the
/// owner to tear one down.
pub trait Connection: Send + 'static {
    /// Abortively close the underlying connection
    fn destroy(&self);
}
