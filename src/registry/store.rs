//! Connection registry implementation
//!
//! The central map from user identity to that user's live connections.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::event::UserId;
use crate::stats::RegistryStats;

use super::config::RegistryConfig;
use super::entry::UserConnections;
use super::error::RegistryError;
use super::handle::{ConnectionHandle, ConnectionId};

/// Central registry for all live connections
///
/// Thread-safe via `RwLock`. The outer map is write-locked only when a user
/// without an entry connects or during cleanup; everything else takes the
/// map read lock plus the lock of the one user it touches, so traffic for
/// different users does not serialize.
///
/// Every access to a user entry happens while the map lock is held, which
/// keeps cleanup from dropping an entry another task is about to modify.
///
/// A connection belongs to at most one user. The owner index is locked
/// last, after the map and the user entry.
pub struct ConnectionRegistry {
    /// Map of user id to that user's connections
    users: RwLock<HashMap<UserId, Arc<RwLock<UserConnections>>>>,

    /// Owner of every registered connection
    owners: RwLock<HashMap<ConnectionId, UserId>>,

    /// Configuration
    config: RegistryConfig,
}

impl ConnectionRegistry {
    /// Create a new, empty registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new, empty registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a live connection for a user
    ///
    /// Returns true if the user went from zero to one live connection.
    /// Re-adding a handle that is already registered is a no-op. A handle
    /// registered under another user is rejected.
    pub async fn add(
        &self,
        user_id: UserId,
        handle: ConnectionHandle,
    ) -> Result<bool, RegistryError> {
        {
            let users = self.users.read().await;
            if let Some(entry_arc) = users.get(&user_id) {
                let mut entry = entry_arc.write().await;
                return self.insert_handle(user_id, &mut entry, handle).await;
            }
        }

        let mut users = self.users.write().await;
        let entry_arc = Arc::clone(
            users
                .entry(user_id)
                .or_insert_with(|| Arc::new(RwLock::new(UserConnections::new()))),
        );
        let mut entry = entry_arc.write().await;
        self.insert_handle(user_id, &mut entry, handle).await
    }

    async fn insert_handle(
        &self,
        user_id: UserId,
        entry: &mut UserConnections,
        handle: ConnectionHandle,
    ) -> Result<bool, RegistryError> {
        let limit = self.config.max_connections_per_user;
        if limit > 0 && !entry.contains(handle.id()) && entry.connection_count() >= limit {
            tracing::warn!(
                user_id = user_id,
                connection_id = %handle.id(),
                limit = limit,
                "Connection rejected: per-user limit reached"
            );
            return Err(RegistryError::TooManyConnections { user_id, limit });
        }

        let connection_id = handle.id();

        let mut owners = self.owners.write().await;
        match owners.get(&connection_id).copied() {
            Some(owner_id) if owner_id != user_id => {
                tracing::warn!(
                    user_id = user_id,
                    owner_id = owner_id,
                    connection_id = %connection_id,
                    "Connection rejected: registered under another user"
                );
                return Err(RegistryError::ConnectionOwnedByOtherUser {
                    connection_id,
                    owner_id,
                    user_id,
                });
            }
            Some(_) => {}
            None => {
                owners.insert(connection_id, user_id);
            }
        }
        drop(owners);

        let came_online = entry.insert(handle);

        tracing::info!(
            user_id = user_id,
            connection_id = %connection_id,
            connections = entry.connection_count(),
            came_online = came_online,
            "Connection registered"
        );

        Ok(came_online)
    }

    /// Unregister a connection
    ///
    /// Absent users or handles are ignored, since a close can race with an
    /// earlier removal. Returns true if this removed the user's last
    /// connection. Once this returns, the handle is in no later snapshot.
    pub async fn remove(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        let users = self.users.read().await;

        let Some(entry_arc) = users.get(&user_id) else {
            tracing::debug!(
                user_id = user_id,
                connection_id = %connection_id,
                "Connection already unregistered"
            );
            return false;
        };

        let mut entry = entry_arc.write().await;
        if entry.contains(connection_id) {
            self.owners.write().await.remove(&connection_id);
        }
        let went_offline = entry.remove(connection_id);

        tracing::info!(
            user_id = user_id,
            connection_id = %connection_id,
            connections = entry.connection_count(),
            went_offline = went_offline,
            "Connection unregistered"
        );

        went_offline
    }

    /// Point-in-time copy of a user's live connections
    ///
    /// The copy is safe to send on without holding any registry lock.
    pub async fn snapshot(&self, user_id: UserId) -> Vec<ConnectionHandle> {
        let users = self.users.read().await;

        if let Some(entry_arc) = users.get(&user_id) {
            let entry = entry_arc.read().await;
            entry.snapshot()
        } else {
            Vec::new()
        }
    }

    /// Check if a user has at least one live connection
    pub async fn is_online(&self, user_id: UserId) -> bool {
        let users = self.users.read().await;

        if let Some(entry_arc) = users.get(&user_id) {
            let entry = entry_arc.read().await;
            entry.is_online()
        } else {
            false
        }
    }

    /// Number of live connections of a user
    pub async fn connection_count(&self, user_id: UserId) -> usize {
        let users = self.users.read().await;

        if let Some(entry_arc) = users.get(&user_id) {
            let entry = entry_arc.read().await;
            entry.connection_count()
        } else {
            0
        }
    }

    /// Ids of all users with at least one live connection
    pub async fn online_users(&self) -> Vec<UserId> {
        let users = self.users.read().await;
        let mut online = Vec::new();

        for (user_id, entry_arc) in users.iter() {
            if entry_arc.read().await.is_online() {
                online.push(*user_id);
            }
        }

        online.sort_unstable();
        online
    }

    /// Get registry statistics
    pub async fn stats(&self) -> RegistryStats {
        let users = self.users.read().await;
        let mut stats = RegistryStats {
            tracked_users: users.len() as u64,
            ..RegistryStats::default()
        };

        for entry_arc in users.values() {
            let entry = entry_arc.read().await;
            if entry.is_online() {
                stats.online_users += 1;
                stats.connections += entry.connection_count() as u64;
            }
        }

        stats
    }

    /// Run cleanup once
    ///
    /// Drops entries of users that currently have no connection.
    pub async fn cleanup(&self) -> usize {
        let mut users = self.users.write().await;
        let before = users.len();

        // No other task can hold a user lock while the map is write-locked.
        users.retain(|_, entry_arc| match entry_arc.try_read() {
            Ok(entry) => entry.is_online(),
            Err(_) => true,
        });

        let removed = before - users.len();
        if removed > 0 {
            tracing::debug!(removed = removed, "Offline users removed by cleanup");
        }
        removed
    }

    /// Spawn background cleanup task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.cleanup().await;
            }
        })
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
