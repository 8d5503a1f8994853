//! Monotonic nanosecond timestamp source. `now_nanos()` is sampled
//! immediately after the structural change it will be reported against
//! is committed, so an event's timestamp always reflects a state the
//! book actually passed through.

use std::time::Instant;

pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> u64;
}

/// Production clock: nanoseconds elapsed since the clock was created.
/// `Instant` is already monotonic on every platform Rust supports, so
/// there's no need for the manual steady-clock-epoch dance the original
/// C++ `getCurrentTimestamp()` does.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Deterministic clock for tests: hands out a strictly increasing
/// counter instead of wall-clock time, so event orderings in assertions
/// don't depend on scheduling jitter.
#[cfg(feature = "test-util")]
pub struct FixedClock {
    counter: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "test-util")]
impl FixedClock {
    pub fn new() -> Self {
        Self {
            counter: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

#[cfg(feature = "test-util")]
impl Default for FixedClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "test-util")]
impl Clock for FixedClock {
    fn now_nanos(&self) -> u64 {
        self.counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }
}
