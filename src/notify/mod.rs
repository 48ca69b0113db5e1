//! Change notifications and their fan-out
//!
//! Callers build an [`EventNotification`] and a [`Recipients`] set from event
//! membership, then hand both to the [`NotificationDispatcher`]. Recipients
//! without a live connection come back as the offline set, which the caller
//! forwards to mail.

pub mod dispatcher;
pub mod error;
pub mod message;
pub mod recipients;

pub use dispatcher::{DispatcherConfig, NotificationDispatcher};
pub use error::DispatchError;
pub use message::{ChangeType, EventNotification, MalformedNotification, WireNotification};
pub use recipients::Recipients;
