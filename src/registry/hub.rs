//! Connection lifecycle entry points for the transport layer
//!
//! The transport calls [`ConnectionHub::open`] once an authenticated client
//! connects and [`ConnectionHub::close`] when the connection ends or errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::event::{UserId, UserRef};

use super::error::RegistryError;
use super::handle::{ConnectionHandle, ConnectionId, ConnectionReceiver};
use super::store::ConnectionRegistry;

/// A freshly registered connection
#[derive(Debug)]
pub struct OpenedConnection {
    pub user_id: UserId,
    pub handle: ConnectionHandle,
    /// Messages for this connection, in send order
    pub receiver: ConnectionReceiver,
    /// Whether this is the user's only live connection
    pub came_online: bool,
}

/// Allocates connection ids and feeds lifecycle events into the registry
pub struct ConnectionHub {
    registry: Arc<ConnectionRegistry>,
    next_connection_id: AtomicU64,
}

impl ConnectionHub {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Get a reference to the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Register a new connection for an authenticated user
    ///
    /// The first message on the returned receiver is a greeting.
    pub async fn open(&self, user: &UserRef) -> Result<OpenedConnection, RegistryError> {
        let id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let (handle, receiver) = ConnectionHandle::channel(id);

        // Queued before registration so no broadcast can overtake it
        let greeting = format!("User {} established a connection", user.name);
        if handle.send(Bytes::from(greeting)).is_err() {
            tracing::debug!(connection_id = %id, "Greeting not delivered");
        }

        let came_online = self.registry.add(user.id, handle.clone()).await?;

        Ok(OpenedConnection {
            user_id: user.id,
            handle,
            receiver,
            came_online,
        })
    }

    /// Unregister a connection after close or error
    ///
    /// Returns true if the user has no live connection left.
    pub async fn close(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        self.registry.remove(user_id, connection_id).await
    }
}
