//! Process-wide time source.
//!
//! Token expiry and rate-limit windows both read "now" from a [`Clock`] so
//! the two agree, and so tests can drive virtual time.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time as an offset from the UNIX epoch.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time. Successive calls never go backwards.
    fn now(&self) -> Duration;

    /// Whole seconds since the epoch.
    fn now_secs(&self) -> u64 {
        self.now().as_secs()
    }

    /// Milliseconds since the epoch.
    fn now_millis(&self) -> u64 {
        u64::try_from(self.now().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall clock, clamped so it never reports an earlier instant than it
/// already has (NTP steps backwards are absorbed, not compensated).
#[derive(Debug, Default)]
pub struct SystemClock {
    last_nanos: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let wall_nanos = u64::try_from(wall.as_nanos()).unwrap_or(u64::MAX);
        let previous = self.last_nanos.fetch_max(wall_nanos, Ordering::AcqRel);
        Duration::from_nanos(previous.max(wall_nanos))
    }
}

/// Manually driven clock for tests and offline tooling.
#[derive(Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    /// Start at the given offset from the epoch.
    pub fn at(start: Duration) -> Self {
        Self {
            nanos: AtomicU64::new(u64::try_from(start.as_nanos()).unwrap_or(u64::MAX)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(by, Ordering::AcqRel);
    }

    /// Jump to an absolute instant. Ignored if it would move time backwards.
    pub fn set(&self, to: Duration) {
        let to = u64::try_from(to.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_max(to, Ordering::AcqRel);
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.now())
            .finish()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}
