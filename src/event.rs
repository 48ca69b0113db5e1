//! Plain event records
//!
//! The persistence layer owns events, locations and memberships. It hands
//! them in as these records; nothing here is written back except through the
//! return values of the ledger store and dispatcher.

use std::collections::{BTreeMap, BTreeSet};

use crate::schedule::EventSchedule;

pub type UserId = u64;
pub type EventId = u64;
pub type LocationId = u64;

/// A user identity together with its display name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
}

impl UserRef {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A location attached to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLocation {
    pub id: LocationId,
    pub name: String,
}

/// Snapshot of an event as stored by the persistence layer
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub id: EventId,
    pub owner_id: UserId,
    pub members: BTreeSet<UserId>,
    pub locations: BTreeMap<LocationId, EventLocation>,
    pub schedule: EventSchedule,
}

impl EventRecord {
    pub fn new(id: EventId, owner_id: UserId, schedule: EventSchedule) -> Self {
        Self {
            id,
            owner_id,
            members: BTreeSet::new(),
            locations: BTreeMap::new(),
            schedule,
        }
    }

    pub fn with_member(mut self, user_id: UserId) -> Self {
        self.members.insert(user_id);
        self
    }

    pub fn with_location(mut self, id: LocationId, name: impl Into<String>) -> Self {
        self.locations.insert(
            id,
            EventLocation {
                id,
                name: name.into(),
            },
        );
        self
    }

    pub fn location(&self, id: LocationId) -> Option<&EventLocation> {
        self.locations.get(&id)
    }
}
