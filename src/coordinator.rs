//! Mutation flows tying ledgers, registry and dispatcher together
//!
//! A REST-style mutation in the outer application calls one method here
//! after it has persisted its own changes. Each method updates vote state
//! where needed, notifies every recipient derived from event membership, and
//! returns the recipients that were offline so the caller can fall back to
//! mail.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::error::Result;
use crate::event::{EventRecord, LocationId, UserId, UserRef};
use crate::ledger::{LedgerConfig, LedgerError, VoteLedgerStore, VoteOutcome};
use crate::notify::{
    ChangeType, DispatcherConfig, EventNotification, NotificationDispatcher, Recipients,
};
use crate::registry::{
    ConnectionHub, ConnectionId, ConnectionRegistry, OpenedConnection, RegistryConfig,
};

/// Configuration for all coordinator components
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub registry: RegistryConfig,
    pub ledger: LedgerConfig,
    pub dispatcher: DispatcherConfig,
}

impl EngineConfig {
    pub fn registry(mut self, config: RegistryConfig) -> Self {
        self.registry = config;
        self
    }

    pub fn ledger(mut self, config: LedgerConfig) -> Self {
        self.ledger = config;
        self
    }

    pub fn dispatcher(mut self, config: DispatcherConfig) -> Self {
        self.dispatcher = config;
        self
    }
}

/// Entry point for event, member, location and vote mutations
pub struct EventCoordinator {
    ledgers: VoteLedgerStore,
    hub: ConnectionHub,
    dispatcher: NotificationDispatcher,
}

impl EventCoordinator {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::with_config(config.registry));

        Self {
            ledgers: VoteLedgerStore::with_config(config.ledger),
            hub: ConnectionHub::new(Arc::clone(&registry)),
            dispatcher: NotificationDispatcher::with_config(registry, config.dispatcher),
        }
    }

    pub fn ledgers(&self) -> &VoteLedgerStore {
        &self.ledgers
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.hub.registry()
    }

    pub fn hub(&self) -> &ConnectionHub {
        &self.hub
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Register a live connection for an authenticated user
    pub async fn connect(&self, user: &UserRef) -> Result<OpenedConnection> {
        Ok(self.hub.open(user).await?)
    }

    /// Unregister a connection; returns true if the user went offline
    pub async fn disconnect(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        self.hub.close(user_id, connection_id).await
    }

    /// Vote for (or withdraw a vote from) an event location at time `now`
    ///
    /// When the voter set changes, online event members get a location
    /// modify notification. Vote notifications have no mail fallback.
    pub async fn vote(
        &self,
        event: &EventRecord,
        location_id: LocationId,
        voter: &UserRef,
        want_vote: bool,
        now: i64,
    ) -> Result<VoteOutcome> {
        let outcome = self
            .ledgers
            .vote(event, location_id, voter, want_vote, now)
            .await?;

        if let VoteOutcome::Recorded { changed: true, .. } = outcome {
            let msg = EventNotification::location_changed(ChangeType::Modify, event.id, location_id);
            self.notify(Recipients::for_event(event), &msg).await?;
        }

        Ok(outcome)
    }

    /// Vote using the current wall-clock time
    pub async fn vote_now(
        &self,
        event: &EventRecord,
        location_id: LocationId,
        voter: &UserRef,
        want_vote: bool,
    ) -> Result<VoteOutcome> {
        self.vote(event, location_id, voter, want_vote, Utc::now().timestamp())
            .await
    }

    /// An event was created, modified or is about to be removed
    ///
    /// On removal the members are notified first, then the event's ledgers
    /// are dropped.
    pub async fn event_changed(
        &self,
        event: &EventRecord,
        change_type: ChangeType,
    ) -> Result<BTreeSet<UserId>> {
        let msg = EventNotification::event_changed(change_type, event.id);
        let offline = self.notify(Recipients::for_event(event), &msg).await?;

        if change_type == ChangeType::Remove {
            self.ledgers.remove_event(event.id).await;
        }

        Ok(offline)
    }

    /// A location was added to, modified in or removed from an event
    ///
    /// `event` must still list the location, also on removal. Removal drops
    /// all ledgers of the location.
    pub async fn location_changed(
        &self,
        event: &EventRecord,
        location_id: LocationId,
        change_type: ChangeType,
    ) -> Result<BTreeSet<UserId>> {
        if change_type == ChangeType::Remove {
            self.ledgers.remove_location(event, location_id).await?;
        } else if event.location(location_id).is_none() {
            return Err(LedgerError::LocationNotMember {
                event_id: event.id,
                location_id,
            }
            .into());
        }

        let msg = EventNotification::location_changed(change_type, event.id, location_id);
        self.notify(Recipients::for_event(event), &msg).await
    }

    /// A member joined an event
    pub async fn member_added(
        &self,
        event: &EventRecord,
        member_id: UserId,
    ) -> Result<BTreeSet<UserId>> {
        let msg = EventNotification::member_changed(ChangeType::Add, event.id, member_id);
        let recipients = Recipients::for_event(event).with_relative(member_id);
        self.notify(recipients, &msg).await
    }

    /// A member left or was removed from an event
    ///
    /// The removed member is notified too, even though `event` no longer
    /// lists them.
    pub async fn member_removed(
        &self,
        event: &EventRecord,
        member_id: UserId,
    ) -> Result<BTreeSet<UserId>> {
        let msg = EventNotification::member_changed(ChangeType::Remove, event.id, member_id);
        let recipients = Recipients::for_event(event).with_relative(member_id);
        self.notify(recipients, &msg).await
    }

    /// Send a free-form message from one participant to all other participants
    pub async fn buzz(
        &self,
        event: &EventRecord,
        sender: &UserRef,
        payload: Value,
    ) -> Result<BTreeSet<UserId>> {
        let msg = EventNotification::Buzz {
            event_id: event.id,
            sender_id: sender.id,
            sender_name: sender.name.clone(),
            payload,
        };
        let recipients = Recipients::for_event(event).without(sender.id);
        self.notify(recipients, &msg).await
    }

    async fn notify(
        &self,
        recipients: Recipients,
        msg: &EventNotification,
    ) -> Result<BTreeSet<UserId>> {
        let offline = self.dispatcher.broadcast(&recipients, msg).await?;

        if !offline.is_empty() {
            tracing::debug!(
                event_id = msg.event_id(),
                offline = offline.len(),
                "Recipients offline"
            );
        }

        Ok(offline)
    }
}

impl Default for EventCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;
    use tokio_test::assert_ok;

    use super::*;
    use crate::error::Error;
    use crate::registry::ConnectionReceiver;
    use crate::schedule::{EventSchedule, WeekdayMask};

    const OWNER: UserId = 100;
    const ALICE: UserId = 101;
    const BOB: UserId = 102;

    fn utc(d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 1, d, h, min, 0).unwrap().timestamp()
    }

    fn event() -> EventRecord {
        let schedule = EventSchedule::weekly(WeekdayMask::WEDNESDAY, 64_800, 3_600).unwrap();
        EventRecord::new(1, OWNER, schedule)
            .with_member(ALICE)
            .with_member(BOB)
            .with_location(10, "Pizza Place")
    }

    /// Open a connection and drop the greeting
    async fn connect(coordinator: &EventCoordinator, id: UserId) -> ConnectionReceiver {
        let mut conn = coordinator
            .connect(&UserRef::new(id, format!("user{}", id)))
            .await
            .unwrap();
        conn.receiver.recv().await.unwrap();
        conn.receiver
    }

    async fn next_message(rx: &mut ConnectionReceiver) -> EventNotification {
        let raw = rx.recv().await.unwrap();
        serde_json::from_slice(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_vote_notifies_members() {
        let coordinator = EventCoordinator::new();
        let mut owner_rx = connect(&coordinator, OWNER).await;
        let event = event();

        let outcome = assert_ok!(
            coordinator
                .vote(&event, 10, &UserRef::new(ALICE, "alice"), true, utc(3, 17, 30))
                .await
        );
        assert!(outcome.is_recorded());

        assert_eq!(
            next_message(&mut owner_rx).await,
            EventNotification::location_changed(ChangeType::Modify, 1, 10)
        );
    }

    #[tokio::test]
    async fn test_unchanged_vote_is_silent() {
        let coordinator = EventCoordinator::new();
        let mut owner_rx = connect(&coordinator, OWNER).await;
        let event = event();
        let alice = UserRef::new(ALICE, "alice");

        coordinator.vote(&event, 10, &alice, true, utc(3, 17, 30)).await.unwrap();
        next_message(&mut owner_rx).await;

        coordinator.vote(&event, 10, &alice, true, utc(3, 17, 31)).await.unwrap();
        assert!(owner_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_vote_outside_window_is_not_an_error() {
        let coordinator = EventCoordinator::new();
        let mut owner_rx = connect(&coordinator, OWNER).await;

        let outcome = coordinator
            .vote(&event(), 10, &UserRef::new(ALICE, "alice"), true, utc(3, 19, 0))
            .await
            .unwrap();

        assert!(matches!(outcome, VoteOutcome::NotVotable));
        assert!(owner_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_member_removed_notifies_removed_member() {
        let coordinator = EventCoordinator::new();
        let mut bob_rx = connect(&coordinator, BOB).await;

        let mut event = event();
        event.members.remove(&BOB);

        let offline = coordinator.member_removed(&event, BOB).await.unwrap();

        assert_eq!(offline, BTreeSet::from([OWNER, ALICE]));
        assert_eq!(
            next_message(&mut bob_rx).await,
            EventNotification::member_changed(ChangeType::Remove, 1, BOB)
        );
    }

    #[tokio::test]
    async fn test_location_removed_drops_ledgers() {
        let coordinator = EventCoordinator::new();
        let event = event();

        coordinator
            .vote(&event, 10, &UserRef::new(ALICE, "alice"), true, utc(3, 17, 30))
            .await
            .unwrap();
        assert_eq!(coordinator.ledgers().ledger_count().await, 1);

        let offline = coordinator
            .location_changed(&event, 10, ChangeType::Remove)
            .await
            .unwrap();

        assert_eq!(offline.len(), 3);
        assert_eq!(coordinator.ledgers().ledger_count().await, 0);
    }

    #[tokio::test]
    async fn test_location_change_for_foreign_location() {
        let coordinator = EventCoordinator::new();

        let result = coordinator
            .location_changed(&event(), 99, ChangeType::Modify)
            .await;
        assert!(matches!(
            result,
            Err(Error::Ledger(LedgerError::LocationNotMember { location_id: 99, .. }))
        ));

        let result = coordinator
            .location_changed(&event(), 99, ChangeType::Remove)
            .await;
        assert!(matches!(
            result,
            Err(Error::Ledger(LedgerError::LocationNotMember { .. }))
        ));
    }

    #[tokio::test]
    async fn test_event_removed_drops_ledgers_after_notifying() {
        let coordinator = EventCoordinator::new();
        let mut alice_rx = connect(&coordinator, ALICE).await;
        let event = event();

        coordinator
            .vote(&event, 10, &UserRef::new(BOB, "bob"), true, utc(3, 17, 30))
            .await
            .unwrap();
        next_message(&mut alice_rx).await;

        coordinator
            .event_changed(&event, ChangeType::Remove)
            .await
            .unwrap();

        assert_eq!(
            next_message(&mut alice_rx).await,
            EventNotification::event_changed(ChangeType::Remove, 1)
        );
        assert_eq!(coordinator.ledgers().ledger_count().await, 0);
    }

    #[tokio::test]
    async fn test_buzz_skips_sender() {
        let coordinator = EventCoordinator::new();
        let mut owner_rx = connect(&coordinator, OWNER).await;
        let mut alice_rx = connect(&coordinator, ALICE).await;

        let offline = coordinator
            .buzz(&event(), &UserRef::new(ALICE, "alice"), json!({ "text": "hungry?" }))
            .await
            .unwrap();

        assert_eq!(offline, BTreeSet::from([BOB]));
        assert!(matches!(
            next_message(&mut owner_rx).await,
            EventNotification::Buzz { sender_id: ALICE, .. }
        ));
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_makes_user_offline() {
        let coordinator = EventCoordinator::new();
        let conn = coordinator
            .connect(&UserRef::new(ALICE, "alice"))
            .await
            .unwrap();

        assert!(coordinator.disconnect(ALICE, conn.handle.id()).await);

        let offline = coordinator
            .event_changed(&event(), ChangeType::Modify)
            .await
            .unwrap();
        assert!(offline.contains(&ALICE));
    }
}
