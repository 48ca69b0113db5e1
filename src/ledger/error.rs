//! Ledger error types

use crate::event::{EventId, LocationId};

use super::entry::LedgerKey;

/// Error type for ledger store operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Location is not attached to the event
    LocationNotMember {
        event_id: EventId,
        location_id: LocationId,
    },
    /// A ledger is filed under a key other than its own, so a second ledger
    /// for its location and window could be created
    DuplicateLedgerKey(LedgerKey),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::LocationNotMember {
                event_id,
                location_id,
            } => write!(
                f,
                "Location {} is not part of event {}",
                location_id, event_id
            ),
            LedgerError::DuplicateLedgerKey(key) => {
                write!(f, "Duplicate vote ledger: {}", key)
            }
        }
    }
}

impl std::error::Error for LedgerError {}
