//! Notification fan-out to live connections

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::event::UserId;
use crate::registry::{ConnectionHandle, ConnectionRegistry};
use crate::stats::{DispatchCounters, DispatchStats};

use super::error::DispatchError;
use super::recipients::Recipients;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Unregister connections whose receiving side is gone right after the
    /// broadcast that found them
    pub prune_dead_handles: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            prune_dead_handles: true,
        }
    }
}

impl DispatcherConfig {
    /// Keep dead handles registered until the transport closes them
    pub fn keep_dead_handles(mut self) -> Self {
        self.prune_dead_handles = false;
        self
    }
}

/// Pushes serialized messages to every live connection of a recipient set
///
/// The dispatcher does not inspect message content. Each message is encoded
/// once and the same buffer is queued on every connection. Queuing never
/// blocks, and no registry lock is held while sending.
pub struct NotificationDispatcher {
    registry: Arc<ConnectionRegistry>,
    config: DispatcherConfig,
    counters: DispatchCounters,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self::with_config(registry, DispatcherConfig::default())
    }

    pub fn with_config(registry: Arc<ConnectionRegistry>, config: DispatcherConfig) -> Self {
        Self {
            registry,
            config,
            counters: DispatchCounters::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Serialize `message` as JSON and deliver it to every online recipient
    ///
    /// Returns the recipients that had no live connection, for the caller to
    /// reach by mail instead. A recipient whose every connection turned out
    /// to be dead counts as offline.
    pub async fn broadcast<M>(
        &self,
        recipients: &Recipients,
        message: &M,
    ) -> Result<BTreeSet<UserId>, DispatchError>
    where
        M: Serialize + ?Sized,
    {
        let payload = Bytes::from(serde_json::to_vec(message)?);
        Ok(self.broadcast_payload(recipients, payload).await)
    }

    /// Deliver an already encoded payload to every online recipient
    pub async fn broadcast_payload(
        &self,
        recipients: &Recipients,
        payload: Bytes,
    ) -> BTreeSet<UserId> {
        let mut offline = BTreeSet::new();
        let mut dead: Vec<(UserId, ConnectionHandle)> = Vec::new();
        let mut sent = 0u64;

        for user_id in recipients.iter() {
            let handles = self.registry.snapshot(user_id).await;
            if handles.is_empty() {
                offline.insert(user_id);
                continue;
            }

            let mut delivered = 0u64;
            for handle in handles {
                match handle.send(payload.clone()) {
                    Ok(()) => delivered += 1,
                    Err(_) => dead.push((user_id, handle)),
                }
            }

            // Every connection of this user turned out dead
            if delivered == 0 {
                offline.insert(user_id);
            }
            sent += delivered;
        }

        tracing::debug!(
            recipients = recipients.len(),
            sent = sent,
            offline = offline.len(),
            dead = dead.len(),
            bytes = payload.len(),
            "Notification broadcast"
        );

        self.counters.record(sent, offline.len() as u64, dead.len() as u64);

        for (user_id, handle) in dead {
            tracing::debug!(
                user_id = user_id,
                connection_id = %handle.id(),
                "Dead connection found during broadcast"
            );
            if self.config.prune_dead_handles {
                self.registry.remove(user_id, handle.id()).await;
            }
        }

        offline
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::notify::{ChangeType, EventNotification};
    use crate::registry::{ConnectionId, ConnectionReceiver};

    async fn connect(
        registry: &ConnectionRegistry,
        user_id: UserId,
        id: u64,
    ) -> ConnectionReceiver {
        let (handle, rx) = ConnectionHandle::channel(ConnectionId(id));
        registry.add(user_id, handle).await.unwrap();
        rx
    }

    #[tokio::test]
    async fn test_multi_device_and_offline_recipient() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
        let (alice, bob) = (1, 2);

        let mut phone = connect(&registry, alice, 10).await;
        let mut laptop = connect(&registry, alice, 11).await;

        let recipients: Recipients = [alice, bob].into_iter().collect();
        let msg = EventNotification::event_changed(ChangeType::Modify, 42);

        let offline = dispatcher.broadcast(&recipients, &msg).await.unwrap();
        assert_eq!(offline, BTreeSet::from([bob]));

        let expected = serde_json::to_vec(&msg).unwrap();
        assert_eq!(phone.recv().await.unwrap(), expected);
        assert_eq!(laptop.recv().await.unwrap(), expected);

        // Exactly once per connection
        assert!(phone.try_recv().is_err());
        assert!(laptop.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_messages_arrive_in_call_order() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
        let mut rx = connect(&registry, 1, 10).await;
        let recipients: Recipients = [1].into_iter().collect();

        for location_id in 0..5 {
            let msg = EventNotification::location_changed(ChangeType::Add, 42, location_id);
            dispatcher.broadcast(&recipients, &msg).await.unwrap();
        }

        for location_id in 0..5 {
            let raw = rx.recv().await.unwrap();
            let msg: EventNotification = serde_json::from_slice(&raw).unwrap();
            assert_eq!(
                msg,
                EventNotification::location_changed(ChangeType::Add, 42, location_id)
            );
        }
    }

    #[tokio::test]
    async fn test_dead_handle_does_not_block_others() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));

        let dropped = connect(&registry, 1, 10).await;
        let mut alive = connect(&registry, 1, 11).await;
        drop(dropped);

        let recipients: Recipients = [1].into_iter().collect();
        let offline = dispatcher
            .broadcast(&recipients, &json!({ "ping": true }))
            .await
            .unwrap();

        assert!(offline.is_empty());
        assert!(alive.recv().await.is_some());

        // The dead handle was unregistered
        assert_eq!(registry.connection_count(1).await, 1);
        assert_eq!(dispatcher.stats().dead_handles, 1);
        assert_eq!(dispatcher.stats().messages_sent, 1);
    }

    #[tokio::test]
    async fn test_keep_dead_handles() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = NotificationDispatcher::with_config(
            Arc::clone(&registry),
            DispatcherConfig::default().keep_dead_handles(),
        );

        drop(connect(&registry, 1, 10).await);

        let recipients: Recipients = [1].into_iter().collect();
        dispatcher.broadcast(&recipients, &json!({})).await.unwrap();

        assert_eq!(registry.connection_count(1).await, 1);
    }

    #[tokio::test]
    async fn test_all_connections_dead_counts_as_offline() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));

        drop(connect(&registry, 1, 10).await);

        let recipients: Recipients = [1].into_iter().collect();
        let offline = dispatcher.broadcast(&recipients, &json!({})).await.unwrap();

        assert_eq!(offline, BTreeSet::from([1]));
        assert!(!registry.is_online(1).await);
    }

    #[tokio::test]
    async fn test_empty_recipient_set() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = NotificationDispatcher::new(registry);

        let offline = dispatcher
            .broadcast(&Recipients::new(), &json!({}))
            .await
            .unwrap();

        assert!(offline.is_empty());
        assert_eq!(dispatcher.stats().broadcasts, 1);
    }
}
