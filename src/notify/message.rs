//! Notification messages
//!
//! Change notifications use a stable JSON schema shared with clients:
//!
//! ```text
//! { "changeType": "add"|"modify"|"remove", "eventId": "<id>",
//!   "locationId": "<id>", "memberId": "<id>" }
//! ```
//!
//! `locationId` and `memberId` only appear on location and member changes.
//! A buzz carries `"type": "buzz"` and never a `changeType`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{EventId, LocationId, UserId};

/// Kind of change that happened to an event, member or location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Add,
    Modify,
    Remove,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Add => write!(f, "add"),
            ChangeType::Modify => write!(f, "modify"),
            ChangeType::Remove => write!(f, "remove"),
        }
    }
}

/// A notification pushed to the live connections of event recipients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireNotification", try_from = "WireNotification")]
pub enum EventNotification {
    EventChanged {
        change_type: ChangeType,
        event_id: EventId,
    },
    MemberChanged {
        change_type: ChangeType,
        event_id: EventId,
        member_id: UserId,
    },
    LocationChanged {
        change_type: ChangeType,
        event_id: EventId,
        location_id: LocationId,
    },
    /// Free-form message from one member to all others
    Buzz {
        event_id: EventId,
        sender_id: UserId,
        sender_name: String,
        payload: Value,
    },
}

impl EventNotification {
    pub fn event_changed(change_type: ChangeType, event_id: EventId) -> Self {
        EventNotification::EventChanged {
            change_type,
            event_id,
        }
    }

    pub fn member_changed(change_type: ChangeType, event_id: EventId, member_id: UserId) -> Self {
        EventNotification::MemberChanged {
            change_type,
            event_id,
            member_id,
        }
    }

    pub fn location_changed(
        change_type: ChangeType,
        event_id: EventId,
        location_id: LocationId,
    ) -> Self {
        EventNotification::LocationChanged {
            change_type,
            event_id,
            location_id,
        }
    }

    pub fn event_id(&self) -> EventId {
        match self {
            EventNotification::EventChanged { event_id, .. }
            | EventNotification::MemberChanged { event_id, .. }
            | EventNotification::LocationChanged { event_id, .. }
            | EventNotification::Buzz { event_id, .. } => *event_id,
        }
    }

    pub fn change_type(&self) -> Option<ChangeType> {
        match self {
            EventNotification::EventChanged { change_type, .. }
            | EventNotification::MemberChanged { change_type, .. }
            | EventNotification::LocationChanged { change_type, .. } => Some(*change_type),
            EventNotification::Buzz { .. } => None,
        }
    }
}

const BUZZ_TYPE: &str = "buzz";

/// Flat wire form of [`EventNotification`]
///
/// Ids travel as strings.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNotification {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeType>,
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl From<EventNotification> for WireNotification {
    fn from(notification: EventNotification) -> Self {
        match notification {
            EventNotification::EventChanged {
                change_type,
                event_id,
            } => WireNotification {
                change_type: Some(change_type),
                event_id: event_id.to_string(),
                ..Default::default()
            },
            EventNotification::MemberChanged {
                change_type,
                event_id,
                member_id,
            } => WireNotification {
                change_type: Some(change_type),
                event_id: event_id.to_string(),
                member_id: Some(member_id.to_string()),
                ..Default::default()
            },
            EventNotification::LocationChanged {
                change_type,
                event_id,
                location_id,
            } => WireNotification {
                change_type: Some(change_type),
                event_id: event_id.to_string(),
                location_id: Some(location_id.to_string()),
                ..Default::default()
            },
            EventNotification::Buzz {
                event_id,
                sender_id,
                sender_name,
                payload,
            } => WireNotification {
                kind: Some(BUZZ_TYPE.to_string()),
                event_id: event_id.to_string(),
                sender_id: Some(sender_id.to_string()),
                sender_name: Some(sender_name),
                payload: Some(payload),
                ..Default::default()
            },
        }
    }
}

/// Error for wire messages that do not form a valid notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedNotification(pub String);

impl std::fmt::Display for MalformedNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Malformed notification: {}", self.0)
    }
}

impl std::error::Error for MalformedNotification {}

fn parse_id(field: &str, value: &str) -> Result<u64, MalformedNotification> {
    value
        .parse()
        .map_err(|_| MalformedNotification(format!("{} is not an id: {:?}", field, value)))
}

impl TryFrom<WireNotification> for EventNotification {
    type Error = MalformedNotification;

    fn try_from(wire: WireNotification) -> Result<Self, Self::Error> {
        let event_id = parse_id("eventId", &wire.event_id)?;

        match wire.kind.as_deref() {
            Some(BUZZ_TYPE) => {
                let sender_id = wire
                    .sender_id
                    .ok_or_else(|| MalformedNotification("buzz without senderId".into()))?;
                return Ok(EventNotification::Buzz {
                    event_id,
                    sender_id: parse_id("senderId", &sender_id)?,
                    sender_name: wire.sender_name.unwrap_or_default(),
                    payload: wire.payload.unwrap_or(Value::Null),
                });
            }
            Some(other) => {
                return Err(MalformedNotification(format!(
                    "unknown type {:?}",
                    other
                )))
            }
            None => {}
        }

        let change_type = wire
            .change_type
            .ok_or_else(|| MalformedNotification("missing changeType".into()))?;

        match (wire.member_id, wire.location_id) {
            (None, None) => Ok(EventNotification::EventChanged {
                change_type,
                event_id,
            }),
            (Some(member_id), None) => Ok(EventNotification::MemberChanged {
                change_type,
                event_id,
                member_id: parse_id("memberId", &member_id)?,
            }),
            (None, Some(location_id)) => Ok(EventNotification::LocationChanged {
                change_type,
                event_id,
                location_id: parse_id("locationId", &location_id)?,
            }),
            (Some(_), Some(_)) => Err(MalformedNotification(
                "both memberId and locationId present".into(),
            )),
        }
    }
}
