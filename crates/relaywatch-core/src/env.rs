//! Environment abstraction for deterministic testing.
//!
//! Decouples the state machines from system resources (time, randomness).
//! Enables deterministic simulation with a virtual clock and seeded RNG, and
//! production use with real system resources.

use std::{
    fmt::Debug,
    ops::{Add, Sub},
    time::Duration,
};

/// Point in time as seen by the state machines.
///
/// Blanket-implemented for any type with the required arithmetic, so both
/// `std::time::Instant` and virtual simulation instants qualify.
///
/// # Invariants
///
/// - `a - b` saturates to zero when `b > a` (matches `std::time::Instant`)
pub trait Timestamp:
    Copy + Ord + Debug + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = Self> + 'static
{
}

impl<T> Timestamp for T where
    T: Copy
        + Ord
        + Debug
        + Send
        + Sync
        + Sub<Output = Duration>
        + Add<Duration, Output = Self>
        + 'static
{
}

/// Abstract environment providing time, randomness, and async primitives.
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time.
    type Instant: Timestamp;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not by the state machines).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// Given the same RNG seed, this produces the same sequence of bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u32`.
    ///
    /// Used as the nonce half of notification IDs.
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

#[cfg(test)]
pub(crate) mod test_env {
    //! Minimal virtual-clock environment for unit tests inside this crate.
    //!
    //! The full simulation environment lives in `relaywatch-harness`; that
    //! crate depends on this one, so unit tests here use this copy.

    use std::{
        ops::{Add, Sub},
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use super::Environment;

    /// Virtual instant measured in milliseconds since the start of the test.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Ms(pub u64);

    impl Sub for Ms {
        type Output = Duration;

        fn sub(self, rhs: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(rhs.0))
        }
    }

    impl Add<Duration> for Ms {
        type Output = Self;

        fn add(self, rhs: Duration) -> Self {
            Self(self.0 + rhs.as_millis() as u64)
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct TestEnv {
        now: Arc<AtomicU64>,
        counter: Arc<AtomicU64>,
    }

    impl TestEnv {
        pub fn at(&self, ms: u64) -> Ms {
            self.now.store(ms, Ordering::SeqCst);
            Ms(ms)
        }
    }

    impl Environment for TestEnv {
        type Instant = Ms;

        fn now(&self) -> Ms {
            Ms(self.now.load(Ordering::SeqCst))
        }

        async fn sleep(&self, duration: Duration) {
            self.now.fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let value = self.counter.fetch_add(1, Ordering::SeqCst);
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = (value as u8).wrapping_add(i as u8).wrapping_mul(31);
            }
        }
    }
}
