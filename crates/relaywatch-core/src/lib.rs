//! Core state machines for relaywatch
//!
//! Sans-IO connection status tracking and notification deduplication. Nothing
//! in this crate performs I/O or reads a clock: time is an argument and side
//! effects are returned as actions, so the same code runs in production and
//! under deterministic simulation.
//!
//! # Components
//!
//! - [`StatusPresenter`]: connection indicator and transition policy
//! - [`Deduplicator`]: suppression window, trailing debounce, visible queue
//! - [`NotificationCard`]: render-ready view of a visible notification
//! - [`Transport`]: contract of the connection being watched
//! - [`Environment`]: time and randomness abstraction

#![forbid(unsafe_code)]

pub mod alerts;
pub mod dedup;
pub mod env;
pub mod error;
pub mod notification;
pub mod presenter;
pub mod status;
pub mod timer;
pub mod transport;

pub use dedup::{
    Activation, ActionIntent, DedupConfig, DedupEvent, Deduplicator, EnqueueOutcome,
};
pub use env::{Environment, Timestamp};
pub use error::{ActionError, NotifyError};
pub use notification::{
    ActionCallback, ActionHandler, DedupeKey, NotificationAction, NotificationId,
    NotificationKind, NotificationOptions, NotificationRecord, NotificationRequest,
};
pub use presenter::{CardAction, NotificationCard};
pub use status::{ConnectionSnapshot, DisplayMode, StatusAction, StatusConfig, StatusPresenter};
pub use timer::{TimerHandle, TimerId, TimerQueue};
pub use transport::{
    CloseClass, CloseCode, ConnectionEvent, ConnectionState, EventKind, Listener, ListenerId,
    ListenerRegistry, Transport, TransportStats, TransportStatus,
};
