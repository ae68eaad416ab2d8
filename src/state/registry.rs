//! Live connection bookkeeping

use std::collections::HashMap;

use tracing::debug;

use super::{Connection, ConnectionId};

/// A tracked connection and whether a request is in flight on it
#[derive(Debug)]
pub struct ConnectionRecord<C> {
    pub id: ConnectionId,
    pub handle: C,
    pub idle: bool,
}

/// Registry of every open connection.
///
/// A record exists exactly while its connection is open and has not been
/// destroyed through [`ConnectionRegistry::destroy_eligible`].
#[derive(Debug)]
pub struct ConnectionRegistry<C> {
    connections: HashMap<ConnectionId, ConnectionRecord<C>>,
    next_id: u64,
    draining: bool,
}

impl<C: Connection> ConnectionRegistry<C> {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_id: 0,
            draining: false,
        }
    }

    /// Track a newly opened connection. New connections start idle.
    pub fn register_connection(&mut self, handle: C) -> ConnectionId {
        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        self.connections.insert(id, ConnectionRecord { id, handle, idle: true });
        id
    }

    pub fn mark_busy(&mut self, id: ConnectionId) {
        if let Some(record) = self.connections.get_mut(&id) {
            record.idle = false;
        }
    }

    pub fn mark_idle(&mut self, id: ConnectionId) {
        if let Some(record) = self.connections.get_mut(&id) {
            record.idle = true;
        }
    }

    /// Forget a connection that was closed by its owner or peer
    pub fn remove_connection(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    /// Visit every record present when the call starts
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&ConnectionRecord<C>),
    {
        for id in self.snapshot_ids() {
            if let Some(record) = self.connections.get(&id) {
                visit(record);
            }
        }
    }

    /// Point-in-time copy of the tracked ids
    pub fn snapshot_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    pub fn begin_draining(&mut self) {
        self.draining = true;
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    /// A connection may be destroyed when forced, or when it is idle and a
    /// shutdown is in progress.
    pub fn is_eligible(&self, id: ConnectionId, force: bool) -> bool {
        match self.connections.get(&id) {
            Some(record) => force || (record.idle && self.draining),
            None => false,
        }
    }

    /// Destroy the connection if it is eligible and stop tracking it.
    ///
    /// Every destroy goes through here. Because the record is removed on
    /// success, a connection is destroyed at most once.
    pub fn destroy_eligible(&mut self, id: ConnectionId, force: bool) -> bool {
        if !self.is_eligible(id, force) {
            return false;
        }

        match self.connections.remove(&id) {
            Some(record) => {
                debug!(id = %id, force, idle = record.idle, "Destroying connection");
                record.handle.destroy();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Idle flag of a tracked connection, `None` once it is gone
    pub fn is_idle(&self, id: ConnectionId) -> Option<bool> {
        self.connections.get(&id).map(|record| record.idle)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn idle_count(&self) -> usize {
        self.connections.values().filter(|record| record.idle).count()
    }

    pub fn busy_count(&self) -> usize {
        self.len() - self.idle_count()
    }
}

impl<C: Connection> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
