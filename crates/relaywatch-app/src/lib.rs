//! Application layer for relaywatch
//!
//! Mounting, lifecycle and a generic runtime around the core state machines,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`StatusMonitor`]: transport subscriptions, released on drop
//! - [`NotificationCenter`]: mounted notification queue
//! - [`Notifications`]: handle for raising notifications from anywhere
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]

mod center;
mod driver;
mod monitor;
mod runtime;

pub use center::{Command, NotificationCenter, Notifications};
pub use driver::{Driver, UiEvent, View};
pub use monitor::StatusMonitor;
pub use runtime::{Runtime, RuntimeConfig, RuntimeError};
