//! Per-user connection entry
//!
//! This module defines the per-user state stored in the registry.

use std::collections::HashMap;
use std::time::Instant;

use super::handle::{ConnectionHandle, ConnectionId};

/// Live connections of a single user
#[derive(Debug)]
pub struct UserConnections {
    /// Connection id -> handle
    handles: HashMap<ConnectionId, ConnectionHandle>,

    /// When the last connection went away (None while online)
    pub offline_since: Option<Instant>,

    /// When the entry was created
    pub created_at: Instant,
}

impl UserConnections {
    pub(super) fn new() -> Self {
        Self {
            handles: HashMap::new(),
            offline_since: None,
            created_at: Instant::now(),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.handles.len()
    }

    pub fn is_online(&self) -> bool {
        !self.handles.is_empty()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.handles.contains_key(&id)
    }

    /// Insert a handle
    ///
    /// Returns true if the user had no connection before.
    pub(super) fn insert(&mut self, handle: ConnectionHandle) -> bool {
        let was_offline = self.handles.is_empty();
        self.handles.insert(handle.id(), handle);
        self.offline_since = None;
        was_offline
    }

    /// Remove a handle; absent handles are ignored
    ///
    /// Returns true if this removed the user's last connection.
    pub(super) fn remove(&mut self, id: ConnectionId) -> bool {
        if self.handles.remove(&id).is_none() {
            return false;
        }
        if self.handles.is_empty() {
            self.offline_since = Some(Instant::now());
            true
        } else {
            false
        }
    }

    /// Copy of the current handles
    pub(super) fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.handles.values().cloned().collect()
    }
}
