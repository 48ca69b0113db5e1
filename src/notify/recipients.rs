//! Recipient sets derived from event membership

use std::collections::BTreeSet;

use crate::event::{EventRecord, UserId};

/// Users that should receive a notification
///
/// A set, so an owner who is also listed as member is notified once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients(BTreeSet<UserId>);

impl Recipients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner and members of an event
    pub fn for_event(event: &EventRecord) -> Self {
        let mut users = event.members.clone();
        users.insert(event.owner_id);
        Self(users)
    }

    /// Add a user related to the change who is not (or no longer) a member,
    /// such as a member being removed
    pub fn with_relative(mut self, user_id: UserId) -> Self {
        self.0.insert(user_id);
        self
    }

    pub fn without(mut self, user_id: UserId) -> Self {
        self.0.remove(&user_id);
        self
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.0.contains(&user_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<UserId> for Recipients {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
