//! Terminal front-end for relaywatch
//!
//! A thin shell over [`relaywatch_app::Driver`] that provides terminal I/O and
//! a WebSocket [`relaywatch_core::Transport`]. All orchestration lives in the
//! generic [`relaywatch_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod system_env;
pub mod terminal;
pub mod transport;
pub mod ui;

pub use config::{AppConfig, Args};
pub use relaywatch_app::{Driver, Notifications, Runtime, UiEvent};
pub use system_env::SystemEnv;
pub use terminal::{TerminalDriver, TerminalError};
pub use transport::{ReconnectConfig, TransportError, WsTransport, spawn_heartbeat};
