//! Time abstraction for testability.
//!
//! Filter validation needs the current wall-clock time and the send retry
//! loop needs to wait between attempts. Both go through [`Clock`], so tests
//! can use [`MockClock`] and never actually sleep.
//!
//! # Example
//!
//! ```
//! use mailpilot_core::time::{Clock, MockClock};
//! use std::time::Duration;
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//!
//! clock.sleep(Duration::from_secs(30));
//!
//! assert_eq!(clock.sleeps(), 1);
//! assert_eq!((clock.now() - start).num_seconds(), 30);
//! ```

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};

/// Abstraction over wall-clock time and waiting.
pub trait Clock {
    /// Returns the current local time.
    fn now(&self) -> NaiveDateTime;

    /// Blocks for the given duration.
    fn sleep(&self, duration: Duration);
}

/// System clock that uses real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        mailpilot_query::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A mock clock for testing time-dependent code.
///
/// The clock starts at a base time. Sleeping returns immediately and
/// advances the clock instead.
#[derive(Debug)]
pub struct MockClock {
    /// Base time (when the clock was created).
    base: NaiveDateTime,
    /// Offset from base in milliseconds.
    offset_millis: AtomicU64,
    /// Number of calls to `sleep`.
    sleeps: AtomicU32,
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClock {
    /// Creates a new mock clock starting at the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::at(mailpilot_query::now())
    }

    /// Creates a mock clock starting at `base`.
    #[must_use]
    pub const fn at(base: NaiveDateTime) -> Self {
        Self {
            base,
            offset_millis: AtomicU64::new(0),
            sleeps: AtomicU32::new(0),
        }
    }

    /// Advances the clock by the given duration.
    ///
    /// # Note
    /// Durations longer than ~584 million years will be truncated.
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance(&self, duration: Duration) {
        let millis = duration.as_millis() as u64;
        self.offset_millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Returns the current offset from the base time.
    #[must_use]
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
    }

    /// Returns how many times `sleep` was called.
    #[must_use]
    pub fn sleeps(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl Clock for MockClock {
    fn now(&self) -> NaiveDateTime {
        let offset = TimeDelta::from_std(self.offset()).unwrap_or(TimeDelta::MAX);
        self.base.checked_add_signed(offset).unwrap_or(NaiveDateTime::MAX)
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}
