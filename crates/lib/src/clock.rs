//! Time provider abstraction
//!
//! This module provides a [`Clock`] trait that abstracts over time sources,
//! so identifier generation and resource timestamps use real system time in
//! production while tests pin time to a chosen second.
//!
//! # Example
//!
//! ```
//! use purrcafe::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let secs = clock.now_secs();
//! assert!(secs > 0);
//! ```

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// A time provider for getting current timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;

    /// Get current time as whole seconds since Unix epoch.
    fn now_secs(&self) -> i64 {
        (self.now_millis() / 1000) as i64
    }

    /// Get current time truncated to the second, as a UTC date-time.
    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.now_secs(), 0).unwrap_or_default()
    }
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Test clock with auto-advancing time.
///
/// Each `now_millis()` call advances the clock by one millisecond, so a
/// burst of calls stays inside the same second for a while but eventually
/// crosses into the next one. Use `hold()` to pin the clock when a test
/// needs every call to land in the same second.
///
/// # Example
///
/// ```
/// use purrcafe::{Clock, FixedClock};
///
/// let clock = FixedClock::at_secs(1_700_000_000);
/// {
///     let _hold = clock.hold();
///     assert_eq!(clock.now_secs(), 1_700_000_000);
///     assert_eq!(clock.now_millis(), clock.now_millis());
/// }
/// clock.advance_secs(60);
/// assert_eq!(clock.now_secs(), 1_700_000_060);
/// ```
pub struct FixedClock {
    state: Mutex<FixedClockState>,
}

struct FixedClockState {
    millis: u64,
    held: bool,
}

/// RAII guard that freezes a [`FixedClock`] while held.
pub struct ClockHold<'a>(&'a FixedClock);

impl Drop for ClockHold<'_> {
    fn drop(&mut self) {
        self.0.lock().held = false;
    }
}

impl FixedClock {
    /// Create a clock starting at the given time in milliseconds.
    pub fn new(millis: u64) -> Self {
        Self {
            state: Mutex::new(FixedClockState {
                millis,
                held: false,
            }),
        }
    }

    /// Create a clock starting at the given second.
    pub fn at_secs(secs: u64) -> Self {
        Self::new(secs * 1000)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FixedClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Freeze the clock until the returned guard is dropped.
    pub fn hold(&self) -> ClockHold<'_> {
        self.lock().held = true;
        ClockHold(self)
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: u64) {
        self.lock().millis += ms;
    }

    /// Advance the clock by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(secs * 1000);
    }

    /// Set the clock to a specific time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.lock().millis = ms;
    }

    /// Current time without advancing (even if not held).
    pub fn get(&self) -> u64 {
        self.lock().millis
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        let mut state = self.lock();
        let t = state.millis;
        if !state.held {
            state.millis += 1;
        }
        t
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::at_secs(1_704_067_200)
    }
}

impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("FixedClock")
            .field("millis", &state.millis)
            .field("held", &state.held)
            .finish()
    }
}
