//! Registry error types

use crate::event::UserId;

use super::handle::ConnectionId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// User already holds the configured maximum of live connections
    TooManyConnections { user_id: UserId, limit: usize },
    /// Connection is already registered under another user
    ConnectionOwnedByOtherUser {
        connection_id: ConnectionId,
        owner_id: UserId,
        user_id: UserId,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::TooManyConnections { user_id, limit } => write!(
                f,
                "User {} reached the connection limit of {}",
                user_id, limit
            ),
            RegistryError::ConnectionOwnedByOtherUser {
                connection_id,
                owner_id,
                user_id,
            } => write!(
                f,
                "Connection {} belongs to user {}, cannot register it for user {}",
                connection_id, owner_id, user_id
            ),
        }
    }
}

impl std::error::Error for RegistryError {}
