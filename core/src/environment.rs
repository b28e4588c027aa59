//! Injected environment traits.

use chrono::{DateTime, Utc};

/// Abstracts wall-clock time so cache-window logic stays testable.
///
/// The controller reads the clock when comparing against the cache window
/// and when stamping `received_at` into success events; reducers never
/// read ambient time.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
