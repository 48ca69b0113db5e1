//! Location vote ledgers
//!
//! A ledger aggregates the voters for one location during one voting window.
//! Ledgers are created lazily on the first vote inside a window and are kept
//! until their location or event is removed; old windows are never expired
//! here.
//!
//! # Architecture
//!
//! ```text
//!                        VoteLedgerStore
//!               ┌──────────────────────────────────┐
//!               │ ledgers: HashMap<LedgerKey,      │
//!               │   LedgerHandle {                 │
//!               │     Arc<RwLock<Ledger>>          │
//!               │   }                              │
//!               │ >                                │
//!               └────────────────┬─────────────────┘
//!                                │
//!      vote() ──► compute_window() ──► get_or_create() ──► apply_vote()
//! ```
//!
//! The outer map lock is only taken for writing when a ledger is created or
//! removed. Voter changes lock the single ledger they touch.

pub mod config;
pub mod entry;
pub mod error;
pub mod info;
pub mod store;

pub use config::LedgerConfig;
pub use entry::{LedgerHandle, LedgerKey, LocationVoteLedger};
pub use error::LedgerError;
pub use info::LocationVoteInfo;
pub use store::{VoteLedgerStore, VoteOutcome};
