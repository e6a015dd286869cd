//! Simulated environment with a virtual clock.
//!
//! Time only moves when a test advances it or when the runtime sleeps, so
//! every debounce, suppression window and auto-hide is reproducible to the
//! millisecond. Randomness comes from a seeded ChaCha RNG.

use std::{
    ops::{Add, Sub},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use relaywatch_core::Environment;
use serde::Serialize;

/// Virtual instant: time elapsed since the simulation started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Instant `ms` milliseconds after the simulation start.
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    /// Milliseconds since the simulation start.
    pub fn as_millis(self) -> u64 {
        self.0.as_millis() as u64
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

/// Deterministic [`Environment`] for simulation.
///
/// Clones share the clock and the RNG.
#[derive(Clone)]
pub struct SimEnv {
    clock: Arc<Mutex<SimInstant>>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("now", &self.now()).finish_non_exhaustive()
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl SimEnv {
    /// Environment at time zero with a seeded RNG.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            clock: Arc::new(Mutex::new(SimInstant::default())),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) -> SimInstant {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock = *clock + duration;
        *clock
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) -> SimInstant {
        self.advance(Duration::from_millis(ms))
    }

    /// Move the clock to `instant`. Never moves backwards.
    pub fn advance_to(&self, instant: SimInstant) -> SimInstant {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock = (*clock).max(instant);
        *clock
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
