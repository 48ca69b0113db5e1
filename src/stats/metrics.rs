//! Statistics for the connection registry and notification dispatch

use std::sync::atomic::{AtomicU64, Ordering};

/// Registry-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Users with an entry in the registry, online or not yet cleaned up
    pub tracked_users: u64,
    /// Users with at least one live connection
    pub online_users: u64,
    /// Live connections across all users
    pub connections: u64,
}

/// Dispatcher statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Broadcast calls
    pub broadcasts: u64,
    /// Messages queued on a connection
    pub messages_sent: u64,
    /// Recipients without any live connection
    pub offline_recipients: u64,
    /// Sends that failed because the connection was gone
    pub dead_handles: u64,
}

/// Lock-free counters behind [`DispatchStats`]
#[derive(Debug, Default)]
pub struct DispatchCounters {
    broadcasts: AtomicU64,
    messages_sent: AtomicU64,
    offline_recipients: AtomicU64,
    dead_handles: AtomicU64,
}

impl DispatchCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one broadcast
    pub fn record(&self, sent: u64, offline: u64, dead: u64) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.messages_sent.fetch_add(sent, Ordering::Relaxed);
        self.offline_recipients.fetch_add(offline, Ordering::Relaxed);
        self.dead_handles.fetch_add(dead, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            offline_recipients: self.offline_recipients.load(Ordering::Relaxed),
            dead_handles: self.dead_handles.load(Ordering::Relaxed),
        }
    }
}
