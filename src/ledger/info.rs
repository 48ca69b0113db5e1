//! Client-facing export of a ledger

use serde::{Deserialize, Serialize};

use super::entry::LocationVoteLedger;

/// Vote summary for one location and window, as sent to clients
///
/// Ids are rendered as strings to keep them safe for JavaScript clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationVoteInfo {
    pub event_id: String,
    pub location_id: String,
    pub location_name: String,
    pub vote_time_begin: i64,
    pub vote_time_end: i64,
    pub user_ids: Vec<String>,
    pub user_names: Vec<String>,
    pub creation_time: i64,
}

impl From<&LocationVoteLedger> for LocationVoteInfo {
    fn from(ledger: &LocationVoteLedger) -> Self {
        let (user_ids, user_names) = ledger
            .voters()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .unzip();

        Self {
            event_id: ledger.event_id().to_string(),
            location_id: ledger.location_id().to_string(),
            location_name: ledger.location_name().to_string(),
            vote_time_begin: ledger.window().begin,
            vote_time_end: ledger.window().end,
            user_ids,
            user_names,
            creation_time: ledger.created_at(),
        }
    }
}
