//! Command-line arguments and the configuration derived from them.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use relaywatch_app::RuntimeConfig;
use relaywatch_core::DisplayMode;
use serde::Serialize;

use crate::transport::ReconnectConfig;

/// Terminal connection monitor with deduplicated notifications
#[derive(Parser, Debug, Clone)]
#[command(name = "relaywatch")]
#[command(about = "Watch a WebSocket connection and surface deduplicated notifications")]
#[command(version)]
pub struct Args {
    /// WebSocket endpoint to watch (ws:// or wss://)
    ///
    /// Without it only the notification queue runs and no indicator is drawn.
    #[arg(short, long)]
    pub url: Option<String>,

    /// Start with the detailed indicator
    #[arg(long)]
    pub detailed: bool,

    /// Cooldown before an identical notification may show again
    #[arg(long, default_value_t = 5000)]
    pub suppression_ms: u64,

    /// Connection-lost notifications shown before further ones are swallowed
    #[arg(long, default_value_t = 3)]
    pub failure_ceiling: u32,

    /// Fallback status poll interval
    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_ms: u64,

    /// Failed connects before giving up (0 retries forever)
    #[arg(long, default_value_t = 10)]
    pub max_attempts: u32,

    /// Send a heartbeat frame this often while running
    #[arg(long)]
    pub heartbeat_secs: Option<u64>,

    /// Log level filter, overridden by `RUST_LOG`
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file; the terminal itself is owned by the UI
    #[arg(long, default_value = "relaywatch.log")]
    pub log_file: PathBuf,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    /// Notification and indicator behavior.
    pub runtime: RuntimeConfig,
    /// Transport retry policy.
    pub reconnect: ReconnectConfig,
    /// Heartbeat period, if enabled.
    pub heartbeat: Option<Duration>,
}

impl Args {
    /// Fold the flags over the defaults.
    pub fn config(&self) -> AppConfig {
        let mut runtime = RuntimeConfig::default();
        runtime.dedup.suppression_window = Duration::from_millis(self.suppression_ms);
        runtime.status.failure_ceiling = self.failure_ceiling;
        runtime.status.poll_interval = Duration::from_millis(self.poll_ms);
        if self.detailed {
            runtime.status.mode = DisplayMode::Detailed;
        }

        AppConfig {
            runtime,
            reconnect: ReconnectConfig { max_attempts: self.max_attempts, ..ReconnectConfig::default() },
            heartbeat: self.heartbeat_secs.filter(|&secs| secs > 0).map(Duration::from_secs),
        }
    }
}
