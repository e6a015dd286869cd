//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` uses real monotonic time, tokio sleeps and the OS RNG. Behavior
//! is non-deterministic; the simulation harness provides the deterministic
//! counterpart.

use std::time::Duration;

use relaywatch_core::Environment;

/// Production environment using system time and the OS RNG.
///
/// Notification ids only need uniqueness, not secrecy, so an RNG failure is
/// logged and the buffer is left as is instead of aborting the monitor.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        if let Err(e) = getrandom::fill(buffer) {
            tracing::error!(error = %e, "OS RNG failure, notification nonce degraded");
        }
    }
}
