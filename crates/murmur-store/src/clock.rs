//! Time source for store-assigned timestamps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

/// Returns the current time. Stores call it once per created record.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Wall-clock time.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Read the clock at the precision the store persists (milliseconds), so a
/// record handed back from a write equals the same record read back later.
pub(crate) fn stamp(clock: &Clock) -> DateTime<Utc> {
    clock().trunc_subsecs(3)
}

/// A clock that only moves when told to. Handy for driving timestamps in
/// tests and fixtures.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn at_millis(millis: i64) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(millis)),
        }
    }

    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }

    /// A [`Clock`] handle sharing this clock's state.
    pub fn clock(&self) -> Clock {
        let this = self.clone();
        Arc::new(move || this.now())
    }
}
