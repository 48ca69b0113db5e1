//! Vote ledger store implementation
//!
//! Keyed store of per-(location, window) vote ledgers. Ledger creation is
//! race-free: concurrent first votes for the same key observe one ledger.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::event::{EventId, EventRecord, LocationId, UserRef};
use crate::schedule::{compute_window, VoteWindow};

use super::config::LedgerConfig;
use super::entry::{LedgerHandle, LedgerKey, LocationVoteLedger};
use super::error::LedgerError;

/// Result of a vote attempt
#[derive(Debug, Clone)]
pub enum VoteOutcome {
    /// The vote was applied to the ledger of the current window
    Recorded {
        ledger: LedgerHandle,
        /// Whether the voter set changed
        changed: bool,
    },
    /// The event does not accept votes right now
    NotVotable,
}

impl VoteOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, VoteOutcome::Recorded { .. })
    }

    pub fn ledger(&self) -> Option<&LedgerHandle> {
        match self {
            VoteOutcome::Recorded { ledger, .. } => Some(ledger),
            VoteOutcome::NotVotable => None,
        }
    }
}

/// Store for all location vote ledgers
///
/// Thread-safe via `RwLock`. The map lock is held for writing only while a
/// ledger is created or removed; voting locks just the affected ledger.
pub struct VoteLedgerStore {
    ledgers: RwLock<HashMap<LedgerKey, LedgerHandle>>,
    config: LedgerConfig,
}

impl VoteLedgerStore {
    /// Create a new store with default configuration
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Create a new store with custom configuration
    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            ledgers: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Get the ledger for a location and window, creating it if absent
    ///
    /// The ledger is in the store before this returns. Concurrent callers
    /// for the same key all receive the same ledger.
    pub async fn get_or_create(
        &self,
        event_id: EventId,
        location_id: LocationId,
        location_name: &str,
        window: VoteWindow,
    ) -> LedgerHandle {
        let key = LedgerKey::new(location_id, window);

        if let Some(handle) = self.ledgers.read().await.get(&key) {
            return handle.clone();
        }

        let mut ledgers = self.ledgers.write().await;
        ledgers
            .entry(key)
            .or_insert_with(|| {
                let name = truncate_chars(location_name, self.config.max_location_name_len);
                let ledger = LocationVoteLedger::new(
                    event_id,
                    location_id,
                    name,
                    window,
                    Utc::now().timestamp(),
                );

                tracing::info!(
                    event_id = event_id,
                    location_id = location_id,
                    window = %window,
                    "Vote ledger created"
                );

                LedgerHandle::new(ledger)
            })
            .clone()
    }

    /// Add or remove a voter
    ///
    /// Both directions are idempotent. Returns whether the voter set changed,
    /// or `None` if the ledger was removed from the store in the meantime.
    pub async fn apply_vote(
        &self,
        ledger: &LedgerHandle,
        voter: &UserRef,
        want_vote: bool,
    ) -> Option<bool> {
        let mut entry = ledger.inner().write().await;
        if entry.is_retired() {
            tracing::debug!(
                ledger = %ledger.key(),
                user_id = voter.id,
                "Vote on removed ledger ignored"
            );
            return None;
        }

        let changed = if want_vote {
            entry.add_voter(voter)
        } else {
            entry.remove_voter(voter.id)
        };

        tracing::debug!(
            ledger = %ledger.key(),
            user_id = voter.id,
            vote = want_vote,
            changed = changed,
            voters = entry.voter_count(),
            "Vote applied"
        );

        Some(changed)
    }

    /// Vote for (or withdraw a vote from) a location of an event at time `now`
    ///
    /// Outside the voting window this returns [`VoteOutcome::NotVotable`];
    /// that is a normal outcome, not an error. So does a vote that races with
    /// the removal of its ledger.
    pub async fn vote(
        &self,
        event: &EventRecord,
        location_id: LocationId,
        voter: &UserRef,
        want_vote: bool,
        now: i64,
    ) -> Result<VoteOutcome, LedgerError> {
        let location = event
            .location(location_id)
            .ok_or(LedgerError::LocationNotMember {
                event_id: event.id,
                location_id,
            })?;

        let Some(window) = compute_window(&event.schedule, now) else {
            tracing::debug!(
                event_id = event.id,
                location_id = location_id,
                now = now,
                "Vote outside voting window"
            );
            return Ok(VoteOutcome::NotVotable);
        };

        let ledger = self
            .get_or_create(event.id, location_id, &location.name, window)
            .await;
        match self.apply_vote(&ledger, voter, want_vote).await {
            Some(changed) => Ok(VoteOutcome::Recorded { ledger, changed }),
            None => Ok(VoteOutcome::NotVotable),
        }
    }

    /// Vote using the current wall-clock time
    pub async fn vote_now(
        &self,
        event: &EventRecord,
        location_id: LocationId,
        voter: &UserRef,
        want_vote: bool,
    ) -> Result<VoteOutcome, LedgerError> {
        self.vote(event, location_id, voter, want_vote, Utc::now().timestamp())
            .await
    }

    /// Remove every ledger of a location
    ///
    /// Fails with [`LedgerError::LocationNotMember`] if the location is not
    /// attached to the event. Returns the number of ledgers removed.
    pub async fn remove_location(
        &self,
        event: &EventRecord,
        location_id: LocationId,
    ) -> Result<usize, LedgerError> {
        if event.location(location_id).is_none() {
            return Err(LedgerError::LocationNotMember {
                event_id: event.id,
                location_id,
            });
        }

        let removed = self
            .retire_where(|key, handle| {
                key.location_id == location_id && handle.event_id() == event.id
            })
            .await;

        tracing::info!(
            event_id = event.id,
            location_id = location_id,
            removed = removed,
            "Location ledgers removed"
        );

        Ok(removed)
    }

    /// Remove every ledger of an event
    pub async fn remove_event(&self, event_id: EventId) -> usize {
        let removed = self
            .retire_where(|_, handle| handle.event_id() == event_id)
            .await;

        tracing::info!(event_id = event_id, removed = removed, "Event ledgers removed");

        removed
    }

    /// Drop matching ledgers from the store and mark them retired
    ///
    /// Retiring happens under the map write lock, so a vote that already holds
    /// a dropped handle sees the mark when it takes the ledger lock.
    async fn retire_where<F>(&self, matches: F) -> usize
    where
        F: Fn(&LedgerKey, &LedgerHandle) -> bool,
    {
        let mut ledgers = self.ledgers.write().await;
        let keys: Vec<LedgerKey> = ledgers
            .iter()
            .filter(|(key, handle)| matches(key, handle))
            .map(|(key, _)| *key)
            .collect();

        for key in &keys {
            if let Some(handle) = ledgers.remove(key) {
                handle.inner().write().await.retire();
            }
        }

        keys.len()
    }

    /// Ledgers of an event whose windows lie within `[begin, end]`
    ///
    /// Ordered by window, then location. At most
    /// [`LedgerConfig::max_query_results`] entries are returned.
    pub async fn votes_in_window(
        &self,
        event_id: EventId,
        begin: i64,
        end: i64,
    ) -> Vec<LocationVoteLedger> {
        let mut handles: Vec<LedgerHandle> = {
            let ledgers = self.ledgers.read().await;
            ledgers
                .values()
                .filter(|h| h.event_id() == event_id && h.key().window.within(begin, end))
                .cloned()
                .collect()
        };
        handles.sort_by_key(|h| (h.key().window, h.key().location_id));
        handles.truncate(self.config.max_query_results);

        let mut result = Vec::with_capacity(handles.len());
        for handle in handles {
            result.push(handle.snapshot().await);
        }
        result
    }

    /// Ledgers of the window that is open at `now`, empty if none is open
    pub async fn current_votes(&self, event: &EventRecord, now: i64) -> Vec<LocationVoteLedger> {
        match compute_window(&event.schedule, now) {
            Some(window) => self.votes_in_window(event.id, window.begin, window.end).await,
            None => Vec::new(),
        }
    }

    /// Look up a ledger by key
    pub async fn ledger(&self, key: &LedgerKey) -> Option<LedgerHandle> {
        self.ledgers.read().await.get(key).cloned()
    }

    /// Get total number of ledgers
    pub async fn ledger_count(&self) -> usize {
        self.ledgers.read().await.len()
    }

    /// Sanity check that every ledger is filed under its own key
    ///
    /// A ledger stored under a foreign key would leave its real slot empty,
    /// and the next vote for that key would create a second ledger.
    pub async fn verify_unique(&self) -> Result<(), LedgerError> {
        let ledgers = self.ledgers.read().await;

        for (slot, handle) in ledgers.iter() {
            let key = handle.inner().read().await.key();
            if key != *slot || handle.key() != *slot {
                tracing::error!(ledger = %key, slot = %slot, "Misfiled vote ledger detected");
                return Err(LedgerError::DuplicateLedgerKey(key));
            }
        }

        Ok(())
    }
}

impl Default for VoteLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
