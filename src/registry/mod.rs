//! Live connection registry
//!
//! The registry tracks which users currently hold a live connection, possibly
//! several at once (one per device). It is the only process-wide mutable
//! state of the crate, starts empty and is shared behind an `Arc`.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ConnectionRegistry>
//!                  ┌──────────────────────────────┐
//!                  │ users: HashMap<UserId,       │
//!                  │   UserConnections {          │
//!                  │     handles: {id -> tx},     │
//!                  │   }                          │
//!                  │ >                            │
//!                  └──────────────┬───────────────┘
//!                                 │
//!        ┌────────────────────────┼────────────────────────┐
//!        │                        │                        │
//!        ▼                        ▼                        ▼
//!   [Transport]             [Dispatcher]             [Cleanup task]
//!   hub.open()/close()      snapshot() ──► send()    cleanup()
//! ```
//!
//! Each handle wraps an unbounded `mpsc` sender carrying `bytes::Bytes`, so a
//! broadcast payload is encoded once and shared by reference count across
//! every recipient connection.

pub mod config;
pub mod entry;
pub mod error;
pub mod handle;
pub mod hub;
pub mod store;

pub use config::RegistryConfig;
pub use entry::UserConnections;
pub use error::RegistryError;
pub use handle::{ConnectionClosed, ConnectionHandle, ConnectionId, ConnectionReceiver};
pub use hub::{ConnectionHub, OpenedConnection};
pub use store::ConnectionRegistry;
