//! Time provider abstraction
//!
//! Token expiry and record timestamps all read the current time through a
//! [`Clock`], so production code uses the system time while tests can pin
//! time to an exact instant and step it across expiry boundaries.
//!
//! # Example
//!
//! ```
//! use keyward::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let now = clock.now();
//! assert!(now.timestamp() > 0);
//! ```

use std::fmt::Debug;

use chrono::{DateTime, TimeZone, Utc};

#[cfg(any(test, feature = "testing"))]
use std::sync::Mutex;

/// A time provider for getting current timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time as seconds since Unix epoch.
    fn now_secs(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Convert Unix seconds to a UTC timestamp, clamping out-of-range values to the epoch.
pub(crate) fn from_unix_secs(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Test clock frozen at a fixed instant.
///
/// Unlike [`SystemClock`] this never moves on its own; tests advance it
/// explicitly, which makes inclusive expiry boundaries checkable to the
/// second.
///
/// ```
/// use chrono::Duration;
/// use keyward::{Clock, FixedClock};
///
/// let clock = FixedClock::from_secs(1_000);
/// assert_eq!(clock.now(), clock.now());
/// clock.advance(Duration::seconds(5));
/// assert_eq!(clock.now_secs(), 1_005);
/// ```
#[cfg(any(test, feature = "testing"))]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Create a clock frozen at the given Unix timestamp in seconds.
    pub fn from_secs(secs: i64) -> Self {
        Self::new(from_unix_secs(secs))
    }

    /// Move the clock forward (or backward, for negative durations).
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::from_secs(1_704_067_200)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedClock")
            .field("now", &*self.now.lock().unwrap())
            .finish()
    }
}
