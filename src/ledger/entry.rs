//! Ledger entry and handle types
//!
//! This module defines the per-(location, window) state kept by the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::event::{EventId, LocationId, UserId, UserRef};
use crate::schedule::VoteWindow;

/// Identity of a ledger: one location during one voting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerKey {
    pub location_id: LocationId,
    pub window: VoteWindow,
}

impl LedgerKey {
    pub fn new(location_id: LocationId, window: VoteWindow) -> Self {
        Self {
            location_id,
            window,
        }
    }
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "location {} {}", self.location_id, self.window)
    }
}

/// Voters of one location during one voting window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationVoteLedger {
    event_id: EventId,
    location_id: LocationId,
    location_name: String,
    window: VoteWindow,
    /// Voter id -> display name; the id is the identity
    voters: BTreeMap<UserId, String>,
    created_at: i64,
    /// Set once the ledger has been dropped from the store
    retired: bool,
}

impl LocationVoteLedger {
    pub(super) fn new(
        event_id: EventId,
        location_id: LocationId,
        location_name: String,
        window: VoteWindow,
        created_at: i64,
    ) -> Self {
        Self {
            event_id,
            location_id,
            location_name,
            window,
            voters: BTreeMap::new(),
            created_at,
            retired: false,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    pub fn window(&self) -> VoteWindow {
        self.window
    }

    /// Creation time in seconds since epoch
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(self.location_id, self.window)
    }

    /// Voters ordered by user id
    pub fn voters(&self) -> impl Iterator<Item = (UserId, &str)> {
        self.voters.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn has_voter(&self, user_id: UserId) -> bool {
        self.voters.contains_key(&user_id)
    }

    /// Whether the location or event of this ledger has been removed
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub(super) fn retire(&mut self) {
        self.retired = true;
    }

    /// Add a voter, refreshing the stored name if it changed
    ///
    /// Returns true if the voter set changed.
    pub(super) fn add_voter(&mut self, voter: &UserRef) -> bool {
        self.voters.insert(voter.id, voter.name.clone()).is_none()
    }

    /// Remove a voter; absent voters are ignored
    ///
    /// Returns true if the voter set changed.
    pub(super) fn remove_voter(&mut self, user_id: UserId) -> bool {
        self.voters.remove(&user_id).is_some()
    }
}

/// Shared handle to a ledger held by the store
///
/// Cloning is cheap. The voter set is only mutable through
/// [`VoteLedgerStore::apply_vote`](super::VoteLedgerStore::apply_vote); callers
/// read it via [`LedgerHandle::snapshot`].
#[derive(Clone)]
pub struct LedgerHandle {
    key: LedgerKey,
    event_id: EventId,
    inner: Arc<RwLock<LocationVoteLedger>>,
}

impl LedgerHandle {
    pub(super) fn new(ledger: LocationVoteLedger) -> Self {
        Self {
            key: ledger.key(),
            event_id: ledger.event_id(),
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn key(&self) -> LedgerKey {
        self.key
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Point-in-time copy of the ledger
    pub async fn snapshot(&self) -> LocationVoteLedger {
        self.inner.read().await.clone()
    }

    /// Check whether both handles refer to the same ledger
    pub fn same_ledger(&self, other: &LedgerHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(super) fn inner(&self) -> &RwLock<LocationVoteLedger> {
        &self.inner
    }
}

impl std::fmt::Debug for LedgerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerHandle")
            .field("key", &self.key)
            .field("event_id", &self.event_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> LocationVoteLedger {
        LocationVoteLedger::new(1, 10, "Pizza Place".into(), VoteWindow::new(100, 200), 50)
    }

    #[test]
    fn test_add_voter_idempotent() {
        let mut ledger = ledger();
        let alice = UserRef::new(7, "alice");

        assert!(ledger.add_voter(&alice));
        assert!(!ledger.add_voter(&alice));
        assert_eq!(ledger.voter_count(), 1);
    }

    #[test]
    fn test_add_voter_refreshes_name() {
        let mut ledger = ledger();

        ledger.add_voter(&UserRef::new(7, "alice"));
        ledger.add_voter(&UserRef::new(7, "alice b."));

        let voters: Vec<_> = ledger.voters().collect();
        assert_eq!(voters, vec![(7, "alice b.")]);
    }

    #[test]
    fn test_remove_absent_voter() {
        let mut ledger = ledger();

        assert!(!ledger.remove_voter(99));
        assert_eq!(ledger.voter_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_identity() {
        let handle = LedgerHandle::new(ledger());
        let clone = handle.clone();
        let other = LedgerHandle::new(ledger());

        assert!(handle.same_ledger(&clone));
        assert!(!handle.same_ledger(&other));
        assert_eq!(handle.key(), other.key());
        assert_eq!(handle.snapshot().await, ledger());
    }
}
