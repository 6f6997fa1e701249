//! Time source abstraction for deterministic date filters.
//!
//! Relative date operators (`isInTheLast`, `isNotInTheLast`) are evaluated
//! against "now". The compiler never reads the wall clock directly; it asks a
//! `TimeSource`, so production uses the system clock and tests pin time.

use chrono::{DateTime, TimeDelta, Utc};

/// Abstraction over the current instant.
pub trait TimeSource: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Real time source using the system clock.
///
/// This is the default implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A time source frozen at a fixed instant.
///
/// Time only moves when a new source is derived with [`FixedTimeSource::advanced_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimeSource {
    now: DateTime<Utc>,
}

impl FixedTimeSource {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// A source frozen at `1_700_000_000` seconds (November 2023).
    #[must_use]
    pub fn default_start() -> Self {
        Self::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap_or(DateTime::<Utc>::MIN_UTC),
        )
    }

    /// A copy of this source moved forward by `delta`.
    ///
    /// Saturates at the maximum representable instant.
    #[must_use]
    pub fn advanced_by(&self, delta: TimeDelta) -> Self {
        Self::new(
            self.now
                .checked_add_signed(delta)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }
}

impl Default for FixedTimeSource {
    fn default() -> Self {
        Self::default_start()
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
