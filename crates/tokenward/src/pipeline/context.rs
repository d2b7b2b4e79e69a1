//! Per-validation time snapshot.

use time::OffsetDateTime;

/// Immutable per-call snapshot of the validation instant.
///
/// Taken once at the start of a validation so every claim check within the
/// call sees the same clock, and so tests can pin time deterministically.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    now: OffsetDateTime,
}

impl ValidationContext {
    /// Snapshots the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: OffsetDateTime::now_utc(),
        }
    }

    /// Creates a context pinned to a fixed instant.
    #[must_use]
    pub fn at(now: OffsetDateTime) -> Self {
        Self { now }
    }

    /// The validation instant.
    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        self.now
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}
