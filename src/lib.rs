//! Location voting windows and live notification fan-out
//!
//! Events have a set of candidate locations. During a short window before an
//! event starts, its owner and members vote for the locations they prefer.
//! Every change to an event, its members, its locations or its votes is
//! pushed as a small JSON message to each live connection of the affected
//! users; users without a live connection are reported back to the caller.
//!
//! # Example
//!
//! ```no_run
//! use eventvote::{EventCoordinator, EventRecord, EventSchedule, UserRef, WeekdayMask};
//!
//! # async fn run() -> eventvote::Result<()> {
//! let coordinator = EventCoordinator::new();
//! let _cleanup = coordinator.registry().spawn_cleanup_task();
//!
//! // Lunch every weekday at 12:00 UTC, voting opens one hour before
//! let schedule = EventSchedule::weekly(WeekdayMask::ALL, 12 * 3600, 3600)?;
//! let event = EventRecord::new(1, 100, schedule)
//!     .with_member(101)
//!     .with_location(10, "Noodle Bar");
//!
//! let mut conn = coordinator.connect(&UserRef::new(100, "owner")).await?;
//! coordinator
//!     .vote_now(&event, 10, &UserRef::new(101, "alice"), true)
//!     .await?;
//! let _greeting = conn.receiver.recv().await;
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod error;
pub mod event;
pub mod ledger;
pub mod notify;
pub mod registry;
pub mod schedule;
pub mod stats;

pub use coordinator::{EngineConfig, EventCoordinator};
pub use error::{Error, Result};
pub use event::{EventId, EventLocation, EventRecord, LocationId, UserId, UserRef};
pub use ledger::{LedgerConfig, LocationVoteInfo, VoteLedgerStore, VoteOutcome};
pub use notify::{ChangeType, EventNotification, NotificationDispatcher, Recipients};
pub use registry::{ConnectionHub, ConnectionId, ConnectionRegistry, RegistryConfig};
pub use schedule::{compute_window, EventSchedule, VoteWindow, WeekdayMask};
