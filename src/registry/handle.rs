//! Connection handles
//!
//! A handle is the registry's view of one live bidirectional connection. The
//! transport layer keeps the receiving half and writes whatever arrives to
//! the socket; the dispatcher pushes onto the sending half.

use std::hash::{Hash, Hasher};

use bytes::Bytes;
use tokio::sync::mpsc;

/// Unique identifier of a live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Receiving half of a connection, drained by the transport layer
pub type ConnectionReceiver = mpsc::UnboundedReceiver<Bytes>;

/// Error returned when the transport side of a connection is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionClosed(pub ConnectionId);

impl std::fmt::Display for ConnectionClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Connection closed: {}", self.0)
    }
}

impl std::error::Error for ConnectionClosed {}

/// Sending side of one live connection
///
/// Handles compare and hash by id only. Sending never blocks: messages are
/// queued in order on an unbounded channel, so two sends to the same handle
/// arrive in call order.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ConnectionHandle {
    /// Create a handle and the matching receiver
    pub fn channel(id: ConnectionId) -> (Self, ConnectionReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a payload for delivery
    pub fn send(&self, payload: Bytes) -> Result<(), ConnectionClosed> {
        self.tx.send(payload).map_err(|_| ConnectionClosed(self.id))
    }

    /// Check whether the receiving side has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl Hash for ConnectionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_preserves_order() {
        let (handle, mut rx) = ConnectionHandle::channel(ConnectionId(1));

        handle.send(Bytes::from_static(b"first")).unwrap();
        handle.send(Bytes::from_static(b"second")).unwrap();

        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"first"));
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"second"));
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (handle, rx) = ConnectionHandle::channel(ConnectionId(2));
        drop(rx);

        assert!(handle.is_closed());
        assert_eq!(
            handle.send(Bytes::from_static(b"lost")),
            Err(ConnectionClosed(ConnectionId(2)))
        );
    }

    #[test]
    fn test_equality_by_id() {
        let (a, _rx_a) = ConnectionHandle::channel(ConnectionId(3));
        let (b, _rx_b) = ConnectionHandle::channel(ConnectionId(3));
        let (c, _rx_c) = ConnectionHandle::channel(ConnectionId(4));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
