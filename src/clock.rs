//! Time source for restore point timestamps
//!
//! Chains read the current time through [`Clock`] so that age-based retention
//! can be exercised deterministically.

use chrono::{DateTime, Utc};

/// Source of the current UTC time
///
/// Chains may be moved to or shared between threads, so clocks must be too.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same instant, so a test can keep one handle and give
/// another to a chain.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    now: std::sync::Arc<std::sync::Mutex<DateTime<Utc>>>,
}

#[cfg(test)]
impl ManualClock {
    /// Create a clock frozen at `start`
    pub(crate) fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Arc::new(std::sync::Mutex::new(start)),
        }
    }

    /// Move the clock forward
    pub(crate) fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
