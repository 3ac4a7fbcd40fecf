use chrono::{DateTime, Duration, Utc};

/// Time source for services and tests.
///
/// Wraps either the system clock or a pinned instant, so services can be
/// driven deterministically in tests and seed runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock(Option<DateTime<Utc>>);

impl Clock {
    /// A clock that follows system time.
    #[must_use]
    pub fn system() -> Self {
        Self(None)
    }

    /// A clock pinned at the given instant.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self(Some(at))
    }

    /// The current time according to this clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.0.unwrap_or_else(Utc::now)
    }

    /// Moves a pinned clock forward. A system clock is unaffected.
    pub fn advance(&mut self, delta: Duration) {
        if let Some(t) = &mut self.0 {
            *t += delta;
        }
    }
}

/// Deterministic timestamp for tests and examples (2025-08-24T01:06:40Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_756_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` pinned at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
